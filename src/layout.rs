//! Page chrome selection
//!
//! The resolver reads the session once per render and picks reader, uploader
//! or admin chrome. Chrome descriptors are built on first use and cached;
//! until the chosen one is ready [`LayoutResolver::state`] reports
//! [`LayoutState::Loading`].

use crate::policy::AuthorizationPolicy;
use crate::session::SessionStore;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::OnceCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Chrome {
    Reader,
    Uploader,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub label: &'static str,
    pub path: &'static str,
}

const fn nav(label: &'static str, path: &'static str) -> NavItem {
    NavItem { label, path }
}

/// Navigation and header configuration for one chrome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChromeSpec {
    pub chrome: Chrome,
    pub title: &'static str,
    pub nav: Vec<NavItem>,
    pub sidebar: bool,
    pub theme_toggle: bool,
}

impl ChromeSpec {
    fn build(chrome: Chrome) -> Self {
        match chrome {
            Chrome::Reader => Self {
                chrome,
                title: "Manga Reader",
                nav: vec![
                    nav("Home", "/"),
                    nav("Search", "/search"),
                    nav("Following", "/following"),
                    nav("History", "/history"),
                ],
                sidebar: false,
                theme_toggle: true,
            },
            Chrome::Uploader => Self {
                chrome,
                title: "Uploader Dashboard",
                nav: vec![
                    nav("My Mangas", "/uploader/mangas"),
                    nav("New Manga", "/uploader/mangas/new"),
                    nav("Translations", "/uploader/translations"),
                    nav("Back to Site", "/"),
                ],
                sidebar: true,
                theme_toggle: true,
            },
            Chrome::Admin => Self {
                chrome,
                title: "Admin Dashboard",
                nav: vec![
                    nav("Overview", "/admin/overview"),
                    nav("Mangas", "/admin/mangas"),
                    nav("Users", "/admin/users"),
                    nav("Reports", "/admin/reports"),
                    nav("Statistics", "/admin/statistics"),
                    nav("Translation Queue", "/admin/translations"),
                    nav("Back to Site", "/"),
                ],
                sidebar: true,
                theme_toggle: true,
            },
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum LayoutState<'a> {
    Loading(Chrome),
    Ready(&'a ChromeSpec),
}

pub struct LayoutResolver {
    session: Arc<SessionStore>,
    policy: Arc<AuthorizationPolicy>,
    reader: OnceCell<ChromeSpec>,
    uploader: OnceCell<ChromeSpec>,
    admin: OnceCell<ChromeSpec>,
}

impl LayoutResolver {
    pub fn new(session: Arc<SessionStore>, policy: Arc<AuthorizationPolicy>) -> Self {
        Self {
            session,
            policy,
            reader: OnceCell::new(),
            uploader: OnceCell::new(),
            admin: OnceCell::new(),
        }
    }

    fn cell(&self, chrome: Chrome) -> &OnceCell<ChromeSpec> {
        match chrome {
            Chrome::Reader => &self.reader,
            Chrome::Uploader => &self.uploader,
            Chrome::Admin => &self.admin,
        }
    }

    /// Chrome for the current session; a malformed user record falls back to guest chrome
    pub fn resolve(&self) -> Chrome {
        let user = match self.session.stored_user() {
            Ok(user) => user,
            Err(e) => {
                log::warn!("Rendering guest chrome: {}", e);
                None
            }
        };
        self.policy.chrome_for(user.as_ref())
    }

    pub fn state(&self) -> LayoutState<'_> {
        let chrome = self.resolve();
        match self.cell(chrome).get() {
            Some(spec) => LayoutState::Ready(spec),
            None => LayoutState::Loading(chrome),
        }
    }

    /// Load the chrome for the current session, building it on first use
    pub async fn load(&self) -> &ChromeSpec {
        let chrome = self.resolve();
        self.cell(chrome)
            .get_or_init(|| async move {
                log::debug!("Loading {:?} chrome", chrome);
                ChromeSpec::build(chrome)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, Session, StoredUser};
    use crate::session::Persistence;
    use crate::storage::{KeyValueStore, MemoryStore, TOKEN_KEY, USER_KEY};

    fn resolver() -> (Arc<MemoryStore>, Arc<SessionStore>, LayoutResolver) {
        let durable = Arc::new(MemoryStore::new());
        let session = Arc::new(SessionStore::new(durable.clone(), Arc::new(MemoryStore::new())));
        let resolver = LayoutResolver::new(session.clone(), Arc::new(AuthorizationPolicy::default()));
        (durable, session, resolver)
    }

    fn login(session: &SessionStore, role: Role) {
        let s = Session {
            access_token: "t".to_string(),
            user: StoredUser {
                id: "1".to_string(),
                username: "rin".to_string(),
                email: None,
                avatar_url: None,
                role,
            },
        };
        session.save(&s, Persistence::Durable).unwrap();
    }

    #[tokio::test]
    async fn test_guest_gets_reader_chrome_after_loading() {
        let (_, _, resolver) = resolver();
        assert_eq!(resolver.state(), LayoutState::Loading(Chrome::Reader));

        let spec = resolver.load().await;
        assert_eq!(spec.chrome, Chrome::Reader);
        assert!(!spec.sidebar);
        assert!(matches!(resolver.state(), LayoutState::Ready(s) if s.chrome == Chrome::Reader));
    }

    #[tokio::test]
    async fn test_chrome_follows_session_changes() {
        let (_, session, resolver) = resolver();

        login(&session, Role::Uploader);
        assert_eq!(resolver.load().await.chrome, Chrome::Uploader);

        login(&session, Role::Admin);
        assert_eq!(resolver.state(), LayoutState::Loading(Chrome::Admin));
        let spec = resolver.load().await;
        assert_eq!(spec.chrome, Chrome::Admin);
        assert!(spec.nav.iter().any(|n| n.path == "/admin/reports"));

        session.clear();
        assert_eq!(resolver.resolve(), Chrome::Reader);
    }

    #[test]
    fn test_malformed_user_falls_back_to_reader() {
        let (durable, _, resolver) = resolver();
        durable.set(TOKEN_KEY, "t").unwrap();
        durable.set(USER_KEY, "not json").unwrap();
        assert_eq!(resolver.resolve(), Chrome::Reader);
    }
}
