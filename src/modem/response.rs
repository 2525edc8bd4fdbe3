use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{framing::Framing, request::ResponseMode, stream::Stream};
use crate::error::{Error, ProtocolError, TransportError};

/// The adapted result of a successful call.
#[derive(Debug)]
pub enum Response {
    /// Body read in full and parsed as JSON. Empty bodies are `null`.
    Json(Value),
    /// Body read in full.
    Bytes(Bytes),
    /// Body read in full and decoded as UTF-8.
    Text(String),
    /// Response headers of a body-less call such as `HEAD`.
    Headers(HeaderMap),
    /// Body left unread, or a hijacked connection.
    Stream(Stream),
}

impl Response {
    pub fn is_stream(&self) -> bool {
        matches!(self, Response::Stream(_))
    }

    /// Returns the body as JSON, reading a stream to its end if needed.
    pub async fn into_value(self) -> Result<Value, Error> {
        match self {
            Response::Json(value) => Ok(value),
            Response::Headers(_) => Ok(Value::Null),
            other => parse_json(other.bytes().await?),
        }
    }

    /// Deserializes the body into `T`.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, Error> {
        let value = self.into_value().await?;
        serde_json::from_value(value.clone()).map_err(|source| {
            ProtocolError::Json {
                source,
                body: Bytes::from(value.to_string()),
            }
            .into()
        })
    }

    /// Returns the raw body, reading a stream to its end if needed.
    pub async fn bytes(self) -> Result<Bytes, Error> {
        match self {
            Response::Json(Value::Null) | Response::Headers(_) => Ok(Bytes::new()),
            Response::Json(value) => Ok(Bytes::from(value.to_string())),
            Response::Bytes(bytes) => Ok(bytes),
            Response::Text(text) => Ok(Bytes::from(text)),
            Response::Stream(stream) => stream
                .bytes()
                .await
                .map_err(|e| TransportError::Stream(e).into()),
        }
    }

    /// Returns the body as UTF-8 text.
    pub async fn text(self) -> Result<String, Error> {
        match self {
            Response::Text(text) => Ok(text),
            other => Ok(utf8(other.bytes().await?)?),
        }
    }

    /// Returns the body as a stream. Buffered bodies become in-memory streams.
    pub fn into_stream(self) -> Stream {
        match self {
            Response::Stream(stream) => stream,
            Response::Json(Value::Null) | Response::Headers(_) => {
                Stream::from_bytes(Bytes::new(), Framing::Raw)
            }
            Response::Json(value) => Stream::from_bytes(value.to_string(), Framing::Raw),
            Response::Bytes(bytes) => Stream::from_bytes(bytes, Framing::Raw),
            Response::Text(text) => Stream::from_bytes(text, Framing::Raw),
        }
    }
}

/// Shapes a response whose status was accepted by the endpoint.
pub(crate) async fn adapt(
    mode: ResponseMode,
    response: http::Response<Incoming>,
) -> Result<Response, Error> {
    let framing = Framing::from_headers(response.headers());

    match mode {
        ResponseMode::Json => Ok(Response::Json(parse_json(collect(response.into_body()).await?)?)),
        ResponseMode::Raw => Ok(Response::Bytes(collect(response.into_body()).await?)),
        ResponseMode::Text => Ok(Response::Text(utf8(collect(response.into_body()).await?)?)),
        ResponseMode::Headers => Ok(Response::Headers(response.into_parts().0.headers)),
        ResponseMode::Stream => Ok(Response::Stream(Stream::from_body(
            response.into_body(),
            framing,
        ))),
        ResponseMode::Buffered => Ok(Response::Stream(Stream::from_bytes(
            collect(response.into_body()).await?,
            framing,
        ))),
        ResponseMode::Hijack if response.status() == StatusCode::SWITCHING_PROTOCOLS => {
            let upgraded = hyper::upgrade::on(response)
                .await
                .map_err(ProtocolError::Upgrade)?;
            tracing::trace!(?framing, "connection hijacked");
            Ok(Response::Stream(Stream::from_upgraded(upgraded, framing)))
        }
        // The daemon may answer without upgrading; the body then carries the output.
        ResponseMode::Hijack => Ok(Response::Stream(Stream::from_body(
            response.into_body(),
            framing,
        ))),
    }
}

/// Reads a body to its end.
pub(crate) async fn collect(body: Incoming) -> Result<Bytes, ProtocolError> {
    Ok(body.collect().await.map_err(ProtocolError::Body)?.to_bytes())
}

fn parse_json(body: Bytes) -> Result<Value, Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&body).map_err(|source| ProtocolError::Json { source, body }.into())
}

fn utf8(body: Bytes) -> Result<String, ProtocolError> {
    String::from_utf8(body.to_vec()).map_err(|_| ProtocolError::Utf8 { body })
}
