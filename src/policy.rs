//! Role rules shared by the route guard and the layout resolver

use crate::layout::Chrome;
use crate::models::{Role, StoredUser};

#[derive(Debug, Clone)]
pub struct AuthorizationPolicy {
    /// Admins pass every role-gated route. Routing only; the backend
    /// enforces its own authorization.
    pub admin_inherits_routes: bool,
}

impl Default for AuthorizationPolicy {
    fn default() -> Self {
        Self {
            admin_inherits_routes: true,
        }
    }
}

impl AuthorizationPolicy {
    /// Whether an authenticated user with `role` may open a route requiring `required`
    pub fn can_access(&self, role: Role, required: Option<Role>) -> bool {
        match required {
            None => true,
            Some(required) if required == role => true,
            Some(_) => self.admin_inherits_routes && role == Role::Admin,
        }
    }

    /// Chrome for the current identity. Strict role match: admins get admin
    /// chrome even on uploader routes.
    pub fn chrome_for(&self, user: Option<&StoredUser>) -> Chrome {
        match user.map(|u| u.role) {
            Some(Role::Admin) => Chrome::Admin,
            Some(Role::Uploader) => Chrome::Uploader,
            _ => Chrome::Reader,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLES: [Role; 3] = [Role::Reader, Role::Uploader, Role::Admin];

    fn user(role: Role) -> StoredUser {
        StoredUser {
            id: "1".to_string(),
            username: "yui".to_string(),
            email: None,
            avatar_url: None,
            role,
        }
    }

    #[test]
    fn test_mismatched_roles_only_pass_for_admin() {
        let policy = AuthorizationPolicy::default();
        for role in ROLES {
            for required in ROLES {
                let allowed = policy.can_access(role, Some(required));
                if role == required || role == Role::Admin {
                    assert!(allowed, "{} should open {} routes", role, required);
                } else {
                    assert!(!allowed, "{} should not open {} routes", role, required);
                }
            }
            assert!(policy.can_access(role, None));
        }
    }

    #[test]
    fn test_admin_inheritance_can_be_disabled() {
        let policy = AuthorizationPolicy {
            admin_inherits_routes: false,
        };
        assert!(!policy.can_access(Role::Admin, Some(Role::Uploader)));
        assert!(policy.can_access(Role::Admin, Some(Role::Admin)));
    }

    #[test]
    fn test_chrome_for_roles() {
        let policy = AuthorizationPolicy::default();
        assert_eq!(policy.chrome_for(None), Chrome::Reader);
        assert_eq!(policy.chrome_for(Some(&user(Role::Reader))), Chrome::Reader);
        assert_eq!(policy.chrome_for(Some(&user(Role::Uploader))), Chrome::Uploader);
        assert_eq!(policy.chrome_for(Some(&user(Role::Admin))), Chrome::Admin);
    }
}
