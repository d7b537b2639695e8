use crate::models::Role;
use crate::policy::AuthorizationPolicy;
use crate::session::SessionStore;
use std::sync::Arc;

/// Role requirement of a guarded route, evaluated at render time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteAuthorizationRequest {
    pub required_role: Option<Role>,
}

impl RouteAuthorizationRequest {
    pub fn authenticated() -> Self {
        Self { required_role: None }
    }

    pub fn role(role: Role) -> Self {
        Self {
            required_role: Some(role),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// `replace` means the guarded page is not left in history
    Redirect { to: String, replace: bool },
}

#[derive(Debug, Clone)]
pub struct RoutePaths {
    pub login: String,
    pub home: String,
}

impl Default for RoutePaths {
    fn default() -> Self {
        Self {
            login: "/login".to_string(),
            home: "/".to_string(),
        }
    }
}

/// Synchronous gate in front of protected views.
///
/// Only locally cached session data is consulted; a stale token is discovered
/// by the gateway on the first 401.
pub struct RouteGuard {
    session: Arc<SessionStore>,
    policy: Arc<AuthorizationPolicy>,
    paths: RoutePaths,
}

impl RouteGuard {
    pub fn new(
        session: Arc<SessionStore>,
        policy: Arc<AuthorizationPolicy>,
        paths: RoutePaths,
    ) -> Self {
        Self {
            session,
            policy,
            paths,
        }
    }

    fn redirect(to: &str) -> GuardDecision {
        GuardDecision::Redirect {
            to: to.to_string(),
            replace: true,
        }
    }

    pub fn check(&self, request: &RouteAuthorizationRequest) -> GuardDecision {
        if !self.session.is_authenticated() {
            return Self::redirect(&self.paths.login);
        }

        let user = match self.session.stored_user() {
            Ok(Some(user)) => user,
            Ok(None) => {
                log::warn!("Token present without a stored user, sending to login");
                return Self::redirect(&self.paths.login);
            }
            Err(e) => {
                log::warn!("Unreadable session, sending to login: {}", e);
                return Self::redirect(&self.paths.login);
            }
        };

        if self.policy.can_access(user.role, request.required_role) {
            GuardDecision::Allow
        } else {
            log::info!(
                "{} ({}) denied route requiring {:?}",
                user.username,
                user.role,
                request.required_role
            );
            Self::redirect(&self.paths.home)
        }
    }
}
