//! Best-effort search click telemetry
//!
//! Clicks on search results are posted together with a rotating search
//! session id so the backend can attribute them to the query that produced
//! them. Failures are logged and swallowed.

use crate::gateway::HttpGateway;
use crate::models::SearchClickEvent;
use crate::storage::{KeyValueStore, SEARCH_SESSION_KEY};
use chrono::Utc;
use rand::Rng;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;

const SESSION_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn generate_session_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SESSION_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}-{}", Utc::now().timestamp_millis(), suffix)
}

pub struct SearchClickLogger {
    gateway: Arc<HttpGateway>,
    tab: Arc<dyn KeyValueStore>,
}

impl SearchClickLogger {
    pub fn new(gateway: Arc<HttpGateway>, tab: Arc<dyn KeyValueStore>) -> Self {
        Self { gateway, tab }
    }

    /// Current search session id, created on first use
    pub fn session_id(&self) -> String {
        match self.tab.get(SEARCH_SESSION_KEY) {
            Some(id) => id,
            None => self.rotate(),
        }
    }

    /// Start a fresh correlation window
    pub fn rotate(&self) -> String {
        let id = generate_session_id();
        if let Err(e) = self.tab.set(SEARCH_SESSION_KEY, &id) {
            log::warn!("Could not persist search session id: {}", e);
        }
        id
    }

    /// Record a click on the result at `position`. Never fails.
    pub async fn log_click(&self, query: &str, manga_id: &str, position: usize) {
        let event = SearchClickEvent {
            query: query.to_string(),
            manga_id: manga_id.to_string(),
            position,
            session_id: self.session_id(),
        };

        match self
            .gateway
            .post::<Value, _>("search/log-click", &event)
            .await
        {
            Ok(_) => {
                let next = self.rotate();
                log::debug!(
                    "Logged search click {} -> {} at {}, next session {}",
                    event.query,
                    event.manga_id,
                    event.position,
                    next
                );
            }
            Err(e) => log::warn!("Search click logging failed: {}", e),
        }
    }

    /// Fire-and-forget variant; the caller does not wait for the backend
    pub fn spawn_log_click(
        self: &Arc<Self>,
        query: String,
        manga_id: String,
        position: usize,
    ) -> JoinHandle<()> {
        let logger = Arc::clone(self);
        tokio::spawn(async move { logger.log_click(&query, &manga_id, position).await })
    }
}
