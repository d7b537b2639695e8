//! Application wiring
//!
//! [`Portal`] builds every component from a [`Config`] and runs the
//! navigation control flow: route lookup, guard, then layout.

use crate::api::{AdminApi, MangaApi, UploaderApi};
use crate::auth::AuthClient;
use crate::config::Config;
use crate::error::ApiError;
use crate::gateway::{HttpGateway, Navigator};
use crate::guard::{GuardDecision, RouteGuard};
use crate::layout::{Chrome, LayoutResolver};
use crate::policy::AuthorizationPolicy;
use crate::routes;
use crate::search_log::SearchClickLogger;
use crate::session::SessionStore;
use crate::storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
use crate::theme::ThemeController;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("Failed to open durable storage: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to build HTTP gateway: {0}")]
    Gateway(#[from] ApiError),
}

/// Outcome of a navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Render {
        route: &'static str,
        params: HashMap<String, String>,
        chrome: Chrome,
    },
    Redirect {
        to: String,
        replace: bool,
    },
    NotFound {
        chrome: Chrome,
    },
}

pub struct Portal {
    config: Config,
    session: Arc<SessionStore>,
    gateway: Arc<HttpGateway>,
    guard: RouteGuard,
    layout: LayoutResolver,
    auth: AuthClient,
    search_log: Arc<SearchClickLogger>,
    theme: ThemeController,
    manga: MangaApi,
    uploader: UploaderApi,
    admin: AdminApi,
}

impl Portal {
    /// Durable storage on disk under `config.storage.dir`, tab storage in memory
    pub fn new(config: Config, navigator: Arc<dyn Navigator>) -> Result<Self, PortalError> {
        let durable = Arc::new(FileStore::open(&config.storage.dir)?);
        Self::with_stores(config, durable, Arc::new(MemoryStore::new()), navigator)
    }

    pub fn with_stores(
        config: Config,
        durable: Arc<dyn KeyValueStore>,
        tab: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, PortalError> {
        let session = Arc::new(SessionStore::new(durable.clone(), tab.clone()));
        let gateway = Arc::new(HttpGateway::new(
            config.gateway_config(),
            session.clone(),
            navigator,
        )?);
        let policy = Arc::new(AuthorizationPolicy::default());

        log::info!(
            "Portal ready: api={} timeout={}s",
            config.api.base_url,
            config.api.timeout_secs
        );

        Ok(Self {
            guard: RouteGuard::new(session.clone(), policy.clone(), config.route_paths()),
            layout: LayoutResolver::new(session.clone(), policy),
            auth: AuthClient::new(gateway.clone(), session.clone()),
            search_log: Arc::new(SearchClickLogger::new(gateway.clone(), tab)),
            theme: ThemeController::new(durable),
            manga: MangaApi::new(gateway.clone()),
            uploader: UploaderApi::new(gateway.clone()),
            admin: AdminApi::new(gateway.clone()),
            config,
            session,
            gateway,
        })
    }

    /// Resolve what to show for `path`
    pub fn navigate(&self, path: &str) -> Navigation {
        let Some(matched) = routes::lookup(path) else {
            log::debug!("No route for {}", path);
            return Navigation::NotFound {
                chrome: self.layout.resolve(),
            };
        };

        if let Some(request) = matched.entry.access.authorization_request() {
            if let GuardDecision::Redirect { to, replace } = self.guard.check(&request) {
                log::debug!("{} redirected to {}", path, to);
                return Navigation::Redirect { to, replace };
            }
        }

        Navigation::Render {
            route: matched.entry.name,
            params: matched.params,
            chrome: self.layout.resolve(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn gateway(&self) -> &Arc<HttpGateway> {
        &self.gateway
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    pub fn layout(&self) -> &LayoutResolver {
        &self.layout
    }

    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    pub fn search_log(&self) -> &Arc<SearchClickLogger> {
        &self.search_log
    }

    pub fn theme(&self) -> &ThemeController {
        &self.theme
    }

    pub fn manga(&self) -> &MangaApi {
        &self.manga
    }

    pub fn uploader(&self) -> &UploaderApi {
        &self.uploader
    }

    pub fn admin(&self) -> &AdminApi {
        &self.admin
    }
}
