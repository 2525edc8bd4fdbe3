use std::{borrow::Cow, time::Duration};

use bytes::Bytes;

/// Errors returned by every call that goes through the modem.
///
/// Callers handle two rejection paths. A call that never produced a well-formed
/// response fails with [`Error::Transport`] or [`Error::Protocol`]. A response whose
/// status code is not declared a success for the endpoint fails with [`Error::Domain`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl Error {
    /// Returns the HTTP status code when the daemon answered with a failure status.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Domain(e) => Some(e.status),
            _ => None,
        }
    }

    /// Returns true when the daemon answered 404 for the requested resource.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// The connection could not be established or broke before a response arrived.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: std::io::Error,
    },
    #[error("TLS handshake with {target} failed: {source}")]
    Tls {
        target: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid TLS credentials: {0}")]
    Credentials(String),
    #[error("HTTP handshake failed: {0}")]
    Handshake(#[source] hyper::Error),
    #[error("Failed to send request: {0}")]
    Send(#[source] hyper::Error),
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
    #[error("Stream failed: {0}")]
    Stream(#[source] std::io::Error),
}

/// The exchange happened but its bytes could not be interpreted.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Failed to build request: {0}")]
    Request(#[from] http::Error),
    #[error("Failed to serialize request body: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("Failed to read response body: {0}")]
    Body(#[source] hyper::Error),
    #[error("Failed to parse JSON response: {source}")]
    Json {
        #[source]
        source: serde_json::Error,
        body: Bytes,
    },
    #[error("Response body is not valid UTF-8")]
    Utf8 { body: Bytes },
    #[error("Connection upgrade failed: {0}")]
    Upgrade(#[source] hyper::Error),
    #[error("Invalid header {name}: {reason}")]
    Header { name: String, reason: String },
    #[error("Invalid docker host '{0}'")]
    InvalidHost(String),
    #[error("Response has no '{field}' field")]
    MissingField {
        field: &'static str,
        body: serde_json::Value,
    },
}

/// A well-formed response whose status the endpoint's status table does not accept.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{tag} (HTTP {status}){}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct DomainError {
    /// The HTTP status code returned by the daemon.
    pub status: u16,
    /// The categorical label from the status table, e.g. `"no such container"`.
    pub tag: Cow<'static, str>,
    /// The `message` field of the daemon's JSON error body, when there is one.
    pub message: Option<String>,
    /// The raw response body.
    pub body: Bytes,
}

impl DomainError {
    pub(crate) fn new(tag: impl Into<Cow<'static, str>>, status: u16, body: Bytes) -> Self {
        let message = serde_json::from_slice::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .or_else(|| {
                let text = String::from_utf8_lossy(&body).trim().to_string();
                (!text.is_empty()).then_some(text)
            });

        DomainError {
            status,
            tag: tag.into(),
            message,
            body,
        }
    }
}
