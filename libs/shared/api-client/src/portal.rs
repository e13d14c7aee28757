use std::sync::Arc;

use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use shared_config::AppConfig;
use shared_models::auth::AuthTokens;
use shared_models::error::PortalError;
use shared_models::response::ApiEnvelope;

use crate::session::SessionContext;

/// HTTP access to the portal REST API.
///
/// Attaches the session's bearer token, and on a 401 performs at most one
/// refresh followed by one retry before giving up and clearing the session.
pub struct PortalClient {
    client: Client,
    base_url: String,
    session: Arc<SessionContext>,
}

impl PortalClient {
    pub fn new(config: &AppConfig, session: Arc<SessionContext>) -> Result<Self, PortalError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| PortalError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap, PortalError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| PortalError::Validation("Access token contains invalid characters".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    async fn send_once(
        &self,
        method: &Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
        auth_token: Option<&str>,
    ) -> Result<Response, PortalError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut req = self
            .client
            .request(method.clone(), &url)
            .headers(self.get_headers(auth_token)?);

        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body_data) = body {
            req = req.json(body_data);
        }

        req.send().await.map_err(|e| {
            error!("Request to {} failed: {}", url, e);
            PortalError::Transport(e.to_string())
        })
    }

    /// Sends a request and unwraps the `{ success, message, data }` envelope.
    /// `success: false` comes back as [`PortalError::Rejected`].
    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<Value>,
    ) -> Result<ApiEnvelope<T>, PortalError>
    where
        T: DeserializeOwned,
    {
        self.dispatch(method, path, query, body, true).await
    }

    async fn dispatch<T>(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<Value>,
        authenticated: bool,
    ) -> Result<ApiEnvelope<T>, PortalError>
    where
        T: DeserializeOwned,
    {
        let token = match authenticated {
            true => self.session.access_token().await,
            false => None,
        };
        let mut response = self
            .send_once(&method, path, query, body.as_ref(), token.as_deref())
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED && token.is_some() {
            warn!("{} {} returned 401, attempting token refresh", method, path);
            let refreshed = self.refresh_tokens().await?;
            response = self
                .send_once(&method, path, query, body.as_ref(), Some(&refreshed))
                .await?;

            if response.status() == StatusCode::UNAUTHORIZED {
                warn!("Retry after refresh still unauthorized, ending session");
                self.session.clear().await?;
                return Err(PortalError::SessionExpired);
            }
        }

        Self::decode(response).await
    }

    pub async fn get<T>(&self, path: &str, query: &[(String, String)]) -> Result<ApiEnvelope<T>, PortalError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::GET, path, query, None).await
    }

    pub async fn post<T>(&self, path: &str, body: Value) -> Result<ApiEnvelope<T>, PortalError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, &[], Some(body)).await
    }

    /// POST without the session: no bearer header, and a 401 is the server's
    /// answer rather than an expired token. Used for credential endpoints.
    pub async fn post_public<T>(&self, path: &str, body: Value) -> Result<ApiEnvelope<T>, PortalError>
    where
        T: DeserializeOwned,
    {
        self.dispatch(Method::POST, path, &[], Some(body), false).await
    }

    pub async fn put<T>(&self, path: &str, body: Value) -> Result<ApiEnvelope<T>, PortalError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::PUT, path, &[], Some(body)).await
    }

    pub async fn delete<T>(&self, path: &str) -> Result<ApiEnvelope<T>, PortalError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::DELETE, path, &[], None).await
    }

    /// Exchanges the refresh token for a new access token. Any failure ends
    /// the session.
    async fn refresh_tokens(&self) -> Result<String, PortalError> {
        let refresh_token = match self.session.refresh_token().await {
            Some(token) => token,
            None => {
                info!("No refresh token available, ending session");
                self.session.clear().await?;
                return Err(PortalError::SessionExpired);
            }
        };

        let body = json!({ "refresh_token": refresh_token });
        let outcome = match self
            .send_once(&Method::POST, "/auth/refresh", &[], Some(&body), None)
            .await
        {
            Ok(response) if response.status().is_success() => {
                Self::decode::<AuthTokens>(response).await.and_then(ApiEnvelope::require_data)
            }
            Ok(response) => Err(PortalError::Rejected(format!(
                "token refresh returned {}",
                response.status()
            ))),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(tokens) => {
                let access_token = tokens.access_token.clone();
                self.session.update_tokens(tokens).await?;
                debug!("Access token refreshed");
                Ok(access_token)
            }
            Err(e) => {
                warn!("Token refresh failed: {}", e);
                self.session.clear().await?;
                Err(PortalError::SessionExpired)
            }
        }
    }

    async fn decode<T>(response: Response) -> Result<ApiEnvelope<T>, PortalError>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PortalError::Transport(e.to_string()))?;

        if !status.is_success() {
            error!("API error ({}): {}", status, body);
            return Err(match serde_json::from_str::<ApiEnvelope<Value>>(&body) {
                Ok(envelope) => PortalError::Rejected(envelope.message.unwrap_or_default()),
                Err(_) if status == StatusCode::UNAUTHORIZED => PortalError::SessionExpired,
                Err(_) if status.is_server_error() => {
                    PortalError::Transport(format!("server returned {}", status))
                }
                Err(_) => PortalError::Rejected(String::new()),
            });
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&body)?;
        envelope.into_result()
    }
}
