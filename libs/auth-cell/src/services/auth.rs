use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use shared_api_client::PortalClient;
use shared_models::auth::{Session, User, UserRole};
use shared_models::error::PortalError;

use crate::models::{AuthPayload, LoginRequest, PatientRegistration, ProviderRegistration};

pub struct AuthService {
    client: Arc<PortalClient>,
}

impl AuthService {
    pub fn new(client: Arc<PortalClient>) -> Self {
        Self { client }
    }

    /// Logs in as `role` and stores the resulting session.
    pub async fn login(&self, role: UserRole, request: LoginRequest) -> Result<User, PortalError> {
        debug!("Logging in {} as {}", request.email, role);
        let path = format!("/auth/{}/login", role.path_segment());
        self.authenticate(&path, role, &request).await
    }

    pub async fn register_provider(&self, request: ProviderRegistration) -> Result<User, PortalError> {
        debug!("Registering provider {}", request.email);
        self.authenticate("/auth/provider/register", UserRole::Provider, &request)
            .await
    }

    pub async fn register_patient(&self, request: PatientRegistration) -> Result<User, PortalError> {
        debug!("Registering patient {}", request.email);
        self.authenticate("/auth/patient/register", UserRole::Patient, &request)
            .await
    }

    async fn authenticate<B: Serialize>(
        &self,
        path: &str,
        role: UserRole,
        body: &B,
    ) -> Result<User, PortalError> {
        let payload: AuthPayload = self
            .client
            .post_public(path, serde_json::to_value(body)?)
            .await?
            .require_data()?;

        if payload.user.role != role {
            warn!(
                "Server returned a {} account for a {} login",
                payload.user.role, role
            );
            return Err(PortalError::Forbidden(format!(
                "This account is not registered as a {}",
                role
            )));
        }

        let user = payload.user.clone();
        self.client
            .session()
            .set(Session::new(payload.user, payload.tokens))
            .await?;
        Ok(user)
    }

    /// Tells the server to revoke the session, then forgets it locally even if
    /// the server call failed.
    pub async fn logout(&self) -> Result<(), PortalError> {
        if !self.client.session().is_authenticated().await {
            return Ok(());
        }

        if let Err(e) = self
            .client
            .post::<Value>("/auth/logout", Value::Object(Default::default()))
            .await
        {
            warn!("Server logout failed, clearing local session anyway: {}", e);
        }

        self.client.session().clear().await?;
        info!("Logged out");
        Ok(())
    }

    pub async fn current_user(&self) -> Option<User> {
        self.client.session().current_user().await
    }

    /// Guard for role-specific screens.
    pub async fn require_role(&self, role: UserRole) -> Result<User, PortalError> {
        match self.current_user().await {
            Some(user) if user.role == role => Ok(user),
            Some(user) => Err(PortalError::Forbidden(format!(
                "This page is only available to {}s, you are signed in as a {}",
                role, user.role
            ))),
            None => Err(PortalError::SessionExpired),
        }
    }
}
