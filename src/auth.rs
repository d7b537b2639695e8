use crate::error::ApiError;
use crate::gateway::HttpGateway;
use crate::models::{LoginCredentials, RegisterRequest, Session, StoredUser};
use crate::session::{Persistence, SessionError, SessionStore};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// `/auth/me` answers either `{user: {...}}` or the user itself
#[derive(Deserialize)]
#[serde(untagged)]
enum MeResponse {
    Wrapped { user: StoredUser },
    Bare(StoredUser),
}

/// Login, logout and identity refresh
pub struct AuthClient {
    gateway: Arc<HttpGateway>,
    session: Arc<SessionStore>,
}

impl AuthClient {
    pub fn new(gateway: Arc<HttpGateway>, session: Arc<SessionStore>) -> Self {
        Self { gateway, session }
    }

    /// Authenticate and store the session in the scope picked by `remember`
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<Session, AuthError> {
        let session: Session = self.gateway.post("auth/login", credentials).await?;
        let persistence = Persistence::from_remember(credentials.remember);
        self.session.save(&session, persistence)?;

        log::info!("Logged in as {} ({})", session.user.username, session.user.role);
        Ok(session)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<Value, ApiError> {
        self.gateway.post("auth/register", request).await
    }

    /// Re-read the identity from the backend and replace the stored snapshot
    pub async fn refresh_user(&self) -> Result<StoredUser, AuthError> {
        let user = match self.gateway.get::<MeResponse>("auth/me").await? {
            MeResponse::Wrapped { user } | MeResponse::Bare(user) => user,
        };
        self.session.update_user(&user)?;
        Ok(user)
    }

    pub fn logout(&self) {
        self.session.clear();
        log::info!("Logged out");
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }
}
