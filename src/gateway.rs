//! Single HTTP client for every backend call
//!
//! The gateway attaches the bearer token, unwraps the `{status, data}`
//! envelope on success and normalises failures into [`ApiError`]. A 401 from
//! any endpoint clears the session and forces a hard redirect to the login
//! page through the [`Navigator`] hook.

use crate::error::ApiError;
use crate::metrics::MetricsTracker;
use crate::session::SessionStore;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// How many `{status, data}` layers are peeled off a success payload
const MAX_ENVELOPE_DEPTH: usize = 2;

/// Hook for full-page navigation that resets all in-memory state
pub trait Navigator: Send + Sync {
    fn hard_redirect(&self, path: &str);
}

/// Navigator for hosts without a page to reload; only logs
#[derive(Debug, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn hard_redirect(&self, path: &str) {
        log::info!("Hard redirect to {}", path);
    }
}

/// Navigator that remembers every redirect it was asked to perform
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn hard_redirect(&self, path: &str) {
        self.visits
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(path.to_string());
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub login_path: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            timeout: Duration::from_secs(10),
            login_path: "/login".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Fixed(&'static str),
    Id(String),
}

/// Backend path relative to the API base
///
/// Fixed parts are written verbatim; ids are percent-encoded as a single
/// segment and show up as `:id` in [`Endpoint::template`].
///
/// ```
/// use rust_manga_reader::gateway::Endpoint;
///
/// let path = Endpoint::new("mangas").id("12").then("chapters");
/// assert_eq!(path.template(), "mangas/:id/chapters");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    segments: Vec<Segment>,
}

impl Endpoint {
    pub fn new(fixed: &'static str) -> Self {
        Self {
            segments: vec![Segment::Fixed(fixed)],
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.segments.push(Segment::Id(id.into()));
        self
    }

    pub fn then(mut self, fixed: &'static str) -> Self {
        self.segments.push(Segment::Fixed(fixed));
        self
    }

    pub fn template(&self) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Fixed(fixed) => fixed.trim_matches('/'),
                Segment::Id(_) => ":id",
            })
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Full request URL under `base`
    pub fn resolve(&self, base: &Url) -> Result<Url, ApiError> {
        let mut url = base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ApiError::request_invalid(format!("API base URL {} cannot hold a path", base))
            })?;
            path.pop_if_empty();
            for segment in &self.segments {
                match segment {
                    Segment::Fixed(fixed) => {
                        path.extend(fixed.split('/').filter(|part| !part.is_empty()));
                    }
                    Segment::Id(id) => {
                        // url drops "." and ".." segments instead of encoding them
                        if id.is_empty() || id == "." || id == ".." {
                            return Err(ApiError::request_invalid(format!(
                                "Invalid id {:?} for {}",
                                id,
                                self.template()
                            )));
                        }
                        path.push(id);
                    }
                }
            }
        }
        Ok(url)
    }
}

impl From<&'static str> for Endpoint {
    fn from(fixed: &'static str) -> Self {
        Self::new(fixed)
    }
}

pub struct HttpGateway {
    client: Client,
    base_url: Url,
    config: GatewayConfig,
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    metrics: MetricsTracker,
}

impl HttpGateway {
    pub fn new(
        config: GatewayConfig,
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        // trailing slash keeps relative joins (image URLs) under the API path
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| ApiError::request_invalid(format!("Invalid API base URL {}: {}", base, e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .gzip(true)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::request_invalid(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            config,
            session,
            navigator,
            metrics: MetricsTracker::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn metrics(&self) -> &MetricsTracker {
        &self.metrics
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Dispatch a request and return the unwrapped JSON payload
    ///
    /// Metrics are keyed by the endpoint template, so ids never widen the key set.
    pub async fn send<Q, B>(
        &self,
        method: Method,
        path: Endpoint,
        query: Option<&Q>,
        body: Option<&B>,
    ) -> Result<Value, ApiError>
    where
        Q: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        let metrics_key = format!("{} {}", method, path.template());
        let start = Instant::now();

        let result = match path.resolve(&self.base_url) {
            Ok(url) => {
                let mut request = self.client.request(method, url);
                if let Some(query) = query {
                    request = request.query(query);
                }
                if let Some(body) = body {
                    request = request.json(body);
                }
                if let Some(token) = self.session.access_token() {
                    request = request.bearer_auth(token);
                }
                self.dispatch(request).await
            }
            Err(e) => Err(e),
        };

        match &result {
            Ok(_) => self.metrics.record_success(&metrics_key, start.elapsed()),
            Err(e) => self.metrics.record_failure(&metrics_key, e),
        }
        result
    }

    async fn dispatch(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        let request = request
            .build()
            .map_err(|e| ApiError::request_invalid(e.to_string()))?;
        log::debug!("{} {}", request.method(), request.url());

        let response = self.client.execute(request).await.map_err(from_transport)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(from_transport)?;
        let body = parse_body(&bytes);

        if status.is_success() {
            return Ok(unwrap_envelope(body));
        }

        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized();
            return Err(ApiError::authentication_expired(body));
        }

        Err(ApiError::server_rejected(status.as_u16(), body))
    }

    fn handle_unauthorized(&self) {
        log::warn!(
            "Backend rejected credentials, clearing session and redirecting to {}",
            self.config.login_path
        );
        self.session.clear();
        self.navigator.hard_redirect(&self.config.login_path);
    }

    pub async fn get_value(&self, path: impl Into<Endpoint>) -> Result<Value, ApiError> {
        self.send::<(), ()>(Method::GET, path.into(), None, None).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: impl Into<Endpoint>) -> Result<T, ApiError> {
        decode(self.get_value(path).await?)
    }

    pub async fn get_with_query<T, Q>(
        &self,
        path: impl Into<Endpoint>,
        query: &Q,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        decode(self.send::<Q, ()>(Method::GET, path.into(), Some(query), None).await?)
    }

    pub async fn post<T, B>(&self, path: impl Into<Endpoint>, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        decode(self.send::<(), B>(Method::POST, path.into(), None, Some(body)).await?)
    }

    pub async fn put<T, B>(&self, path: impl Into<Endpoint>, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        decode(self.send::<(), B>(Method::PUT, path.into(), None, Some(body)).await?)
    }

    pub async fn patch<T, B>(&self, path: impl Into<Endpoint>, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        decode(self.send::<(), B>(Method::PATCH, path.into(), None, Some(body)).await?)
    }

    pub async fn delete(&self, path: impl Into<Endpoint>) -> Result<Value, ApiError> {
        self.send::<(), ()>(Method::DELETE, path.into(), None, None).await
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(ApiError::unexpected_payload)
}

fn parse_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

fn from_transport(err: reqwest::Error) -> ApiError {
    if err.is_builder() {
        ApiError::request_invalid(err.to_string())
    } else if err.is_timeout() {
        log::warn!("Request timed out: {}", err);
        ApiError::timed_out()
    } else {
        log::warn!("Request failed without a response: {}", err);
        ApiError::network_unreachable()
    }
}

fn is_envelope(map: &Map<String, Value>) -> bool {
    map.contains_key("status") && matches!(map.get("data"), Some(Value::Object(_)))
}

/// Strip the backend's `{status, data: {...}}` wrapper
///
/// Flat payloads are returned unchanged; a wrapped payload whose inner object
/// is itself an envelope is unwrapped once more.
pub fn unwrap_envelope(value: Value) -> Value {
    let mut current = value;
    for _ in 0..MAX_ENVELOPE_DEPTH {
        current = match current {
            Value::Object(mut map) if is_envelope(&map) => map.remove("data").unwrap_or_default(),
            other => return other,
        };
    }
    current
}
