use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use shared_models::auth::{AuthTokens, Session, User};
use shared_models::error::PortalError;
use shared_utils::jwt::is_token_expired;

/// Where a session survives between runs.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Result<Option<Session>, PortalError>;
    async fn save(&self, session: &Session) -> Result<(), PortalError>;
    async fn clear(&self) -> Result<(), PortalError>;
}

/// Session persisted as a JSON file, readable by the owner only on unix.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn storage_error(e: std::io::Error) -> PortalError {
    PortalError::Storage(e.to_string())
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<Session>, PortalError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_error(e)),
        };

        match serde_json::from_str(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!("Ignoring unreadable session file {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    async fn save(&self, session: &Session) -> Result<(), PortalError> {
        let raw = serde_json::to_string_pretty(session)?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&self.path).await.map_err(storage_error)?;

        // `mode` only applies on creation; tighten files left by older runs.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(storage_error)?;
        }

        file.write_all(raw.as_bytes()).await.map_err(storage_error)?;
        file.flush().await.map_err(storage_error)
    }

    async fn clear(&self) -> Result<(), PortalError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error(e)),
        }
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            inner: Mutex::new(Some(session)),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<Session>>, PortalError> {
        self.inner
            .lock()
            .map_err(|_| PortalError::Storage("session store lock poisoned".to_string()))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<Session>, PortalError> {
        Ok(self.lock()?.clone())
    }

    async fn save(&self, session: &Session) -> Result<(), PortalError> {
        *self.lock()? = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), PortalError> {
        *self.lock()? = None;
        Ok(())
    }
}

/// The logged-in state handed to every data-access service.
///
/// Lifecycle: [`SessionContext::load`] on start, [`SessionContext::set`] on
/// login or registration, [`SessionContext::clear`] on logout or when the
/// server refuses a refreshed token.
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
    current: RwLock<Option<Session>>,
}

impl SessionContext {
    /// Restores whatever the store holds, dropping sessions whose access token
    /// has already expired and cannot be refreshed.
    pub async fn load(store: Arc<dyn SessionStore>) -> Result<Self, PortalError> {
        let mut restored = store.load().await?;

        if let Some(session) = &restored {
            if is_token_expired(&session.access_token, Utc::now()) && session.refresh_token.is_none() {
                info!("Stored session for {} has expired, discarding", session.user.email);
                store.clear().await?;
                restored = None;
            }
        }

        if let Some(session) = &restored {
            debug!("Restored session for {} ({})", session.user.email, session.user.role);
        }

        Ok(Self {
            store,
            current: RwLock::new(restored),
        })
    }

    /// A context with no persistence, starting logged out.
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(MemorySessionStore::new()),
            current: RwLock::new(None),
        }
    }

    pub async fn set(&self, session: Session) -> Result<(), PortalError> {
        self.store.save(&session).await?;
        info!("Session started for {} ({})", session.user.email, session.user.role);
        *self.current.write().await = Some(session);
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), PortalError> {
        let previous = self.current.write().await.take();
        if let Some(session) = previous {
            info!("Session cleared for {}", session.user.email);
        }
        self.store.clear().await
    }

    /// Swaps in refreshed tokens, keeping the old refresh token when the
    /// server does not rotate it.
    pub async fn update_tokens(&self, tokens: AuthTokens) -> Result<(), PortalError> {
        let mut guard = self.current.write().await;
        let session = guard.as_mut().ok_or(PortalError::SessionExpired)?;

        session.access_token = tokens.access_token;
        if tokens.refresh_token.is_some() {
            session.refresh_token = tokens.refresh_token;
        }
        self.store.save(session).await
    }

    pub async fn current(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    pub async fn current_user(&self) -> Option<User> {
        self.current.read().await.as_ref().map(|s| s.user.clone())
    }

    pub async fn access_token(&self) -> Option<String> {
        self.current.read().await.as_ref().map(|s| s.access_token.clone())
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.current
            .read()
            .await
            .as_ref()
            .and_then(|s| s.refresh_token.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.current.read().await.is_some()
    }
}
