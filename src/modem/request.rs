use std::{fmt, pin::Pin};

use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};
use http::{HeaderName, HeaderValue, Method, Request, header};
use http_body_util::{BodyExt, Empty, Full, StreamBody, combinators::UnsyncBoxBody};
use hyper::body::Frame;
use serde::Serialize;
use serde_json::Value;

use super::{status::StatusTable, transport::ConnectionConfig};
use crate::{error::ProtocolError, models::QueryOptions};

/// Body type written on the wire.
pub type RequestBody = UnsyncBoxBody<Bytes, std::io::Error>;

/// A stream of chunks for an upload body.
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// How the response to a call is handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Buffer the body and parse it as JSON. An empty body is `null`.
    Json,
    /// Buffer the body as bytes.
    Raw,
    /// Buffer the body as UTF-8 text.
    Text,
    /// Keep only the response headers.
    Headers,
    /// Return a read-only stream as soon as the headers arrive.
    Stream,
    /// Buffer the body and return it as an in-memory stream that keeps its framing.
    Buffered,
    /// Ask the daemon to hijack the connection and return a duplex stream.
    Hijack,
}

/// Request body of a call.
pub enum Body {
    Empty,
    /// Sent as `application/json`.
    Json(Value),
    /// Passed through unchanged, e.g. a tar archive.
    Raw {
        bytes: Bytes,
        content_type: &'static str,
    },
    /// Passed through unchanged as it is produced.
    Stream {
        stream: ByteStream,
        content_type: &'static str,
    },
}

impl Body {
    /// Serializes a value into a JSON body.
    pub fn json<T: Serialize>(value: &T) -> Result<Body, ProtocolError> {
        serde_json::to_value(value)
            .map(Body::Json)
            .map_err(ProtocolError::Serialize)
    }

    /// A raw tar archive.
    pub fn tar(bytes: impl Into<Bytes>) -> Body {
        Body::Raw {
            bytes: bytes.into(),
            content_type: "application/x-tar",
        }
    }

    /// A tar archive produced incrementally.
    pub fn tar_stream(stream: impl Stream<Item = std::io::Result<Bytes>> + Send + 'static) -> Body {
        Body::Stream {
            stream: Box::pin(stream),
            content_type: "application/x-tar",
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => write!(f, "Empty"),
            Body::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Body::Raw {
                bytes,
                content_type,
            } => f
                .debug_struct("Raw")
                .field("len", &bytes.len())
                .field("content_type", content_type)
                .finish(),
            Body::Stream { content_type, .. } => f
                .debug_struct("Stream")
                .field("content_type", content_type)
                .finish_non_exhaustive(),
        }
    }
}

/// Everything needed to perform one call against the daemon.
#[derive(Debug)]
pub struct Call {
    pub method: Method,
    /// Path without the API version prefix, e.g. `/containers/abc/start`.
    pub path: String,
    pub options: QueryOptions,
    pub body: Body,
    pub headers: Vec<(HeaderName, String)>,
    pub statuses: StatusTable,
    pub mode: ResponseMode,
}

impl Call {
    pub fn new(method: Method, path: impl Into<String>, statuses: StatusTable) -> Self {
        Call {
            method,
            path: path.into(),
            options: QueryOptions::default(),
            body: Body::Empty,
            headers: Vec::new(),
            statuses,
            mode: ResponseMode::Json,
        }
    }

    pub fn options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn header(mut self, name: HeaderName, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn mode(mut self, mode: ResponseMode) -> Self {
        self.mode = mode;
        self
    }

    /// Path and query string as written on the request line.
    pub fn uri(&self, config: &ConnectionConfig) -> String {
        let mut uri = format!("{}{}", config.path_prefix(), self.path);
        if let Some(query) = self.options.to_query_string() {
            uri.push('?');
            uri.push_str(&query);
        }
        uri
    }
}

/// Turns a call into an HTTP request.
pub fn build(call: Call, config: &ConnectionConfig) -> Result<Request<RequestBody>, ProtocolError> {
    let mut builder = Request::builder()
        .method(call.method.clone())
        .uri(call.uri(config))
        .header(header::HOST, config.host.authority());

    if call.mode == ResponseMode::Hijack {
        builder = builder
            .header(header::CONNECTION, "Upgrade")
            .header(header::UPGRADE, "tcp");
    }

    for (name, value) in &call.headers {
        let value = HeaderValue::from_str(value).map_err(|e| ProtocolError::Header {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        builder = builder.header(name, value);
    }

    let body = match call.body {
        Body::Empty => Empty::<Bytes>::new()
            .map_err(|never| match never {})
            .boxed_unsync(),
        Body::Json(value) => {
            let bytes = serde_json::to_vec(&value).map_err(ProtocolError::Serialize)?;
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            full(bytes)
        }
        Body::Raw {
            bytes,
            content_type,
        } => {
            builder = builder.header(header::CONTENT_TYPE, content_type);
            full(bytes)
        }
        Body::Stream {
            stream,
            content_type,
        } => {
            builder = builder.header(header::CONTENT_TYPE, content_type);
            StreamBody::new(stream.map_ok(Frame::data)).boxed_unsync()
        }
    };

    Ok(builder.body(body)?)
}

fn full(bytes: impl Into<Bytes>) -> RequestBody {
    Full::new(bytes.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}
