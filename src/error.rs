//! Error types surfaced to UI code
//!
//! Every failed gateway call yields an [`ApiError`] carrying a stable
//! [`ErrorKind`]. Pages switch on the kind (and HTTP status where relevant)
//! through [`describe`] instead of searching the human message.

use serde::Serialize;
use serde_json::{Map, Value};

/// Stable machine-readable failure category set by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// HTTP 401; the session has already been cleared
    AuthenticationExpired,
    /// Any other HTTP error status, or a payload the client could not decode
    ServerRejected,
    /// The request was sent but no response came back
    NetworkUnreachable,
    /// The request could not be constructed or sent
    RequestInvalid,
}

pub const CANNOT_CONNECT_MESSAGE: &str =
    "Cannot connect to server. Please check your network connection.";

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    /// HTTP status when the server answered
    pub status: Option<u16>,
    /// Set when a `NetworkUnreachable` failure was caused by the request timeout
    pub timed_out: bool,
    /// Server error payload, passed through verbatim
    pub fields: Map<String, Value>,
}

impl ApiError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            timed_out: false,
            fields: Map::new(),
        }
    }

    pub fn request_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestInvalid, message)
    }

    pub fn network_unreachable() -> Self {
        Self::new(ErrorKind::NetworkUnreachable, CANNOT_CONNECT_MESSAGE)
    }

    pub fn timed_out() -> Self {
        Self {
            timed_out: true,
            ..Self::network_unreachable()
        }
    }

    pub fn authentication_expired(body: Value) -> Self {
        Self::from_response(ErrorKind::AuthenticationExpired, 401, body)
    }

    pub fn server_rejected(status: u16, body: Value) -> Self {
        Self::from_response(ErrorKind::ServerRejected, status, body)
    }

    /// Success status but the payload did not match the expected shape
    pub fn unexpected_payload(err: serde_json::Error) -> Self {
        Self::new(
            ErrorKind::ServerRejected,
            format!("Unexpected response payload: {}", err),
        )
    }

    fn from_response(kind: ErrorKind, status: u16, body: Value) -> Self {
        let message = server_message(&body)
            .unwrap_or_else(|| format!("Request failed with status code {}", status));
        let fields = match body {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("body".to_string(), other);
                map
            }
        };

        Self {
            kind,
            message,
            status: Some(status),
            timed_out: false,
            fields,
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        self.kind == ErrorKind::AuthenticationExpired
    }
}

/// Pull a human message out of a wrapped or unwrapped error body
fn server_message(body: &Value) -> Option<String> {
    let candidates = [
        body.get("message"),
        body.get("error"),
        body.get("data").and_then(|d| d.get("message")),
        body.get("error").and_then(|e| e.get("message")),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str().map(str::to_string))
        .or_else(|| body.as_str().filter(|s| !s.trim().is_empty()).map(str::to_string))
}

/// Toast-ready text for a failed call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserMessage {
    pub message: String,
    pub suggestion: String,
}

impl UserMessage {
    fn new(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }
}

/// Map an error to the message and suggestion shown to the user
pub fn describe(err: &ApiError) -> UserMessage {
    match err.kind {
        ErrorKind::AuthenticationExpired => {
            UserMessage::new("Your session has expired.", "Please sign in again.")
        }
        ErrorKind::NetworkUnreachable if err.timed_out => UserMessage::new(
            "The server took too long to respond.",
            "Check your connection and try again in a moment.",
        ),
        ErrorKind::NetworkUnreachable => UserMessage::new(
            "Cannot connect to the server.",
            "Check your internet connection and try again.",
        ),
        ErrorKind::RequestInvalid => UserMessage::new(
            "The request could not be sent.",
            "Reload the page and try again.",
        ),
        ErrorKind::ServerRejected => match err.status {
            Some(429) => UserMessage::new(
                "Too many requests.",
                "Please wait a moment before trying again.",
            ),
            Some(403) => UserMessage::new(
                "You do not have permission to do that.",
                "Contact an administrator if you need access.",
            ),
            Some(404) => UserMessage::new(
                "The requested content was not found.",
                "It may have been moved or removed.",
            ),
            Some(400) | Some(422) => {
                UserMessage::new(err.message.clone(), "Check your input and try again.")
            }
            Some(s) if s >= 500 => UserMessage::new(
                "The server encountered an error.",
                "Please try again later.",
            ),
            _ => UserMessage::new(err.message.clone(), "Please try again."),
        },
    }
}
