//! Transport and dispatch core.
//!
//! A [`Call`] describes one request: method, path, options, body, the endpoint's
//! [`StatusTable`] and the [`ResponseMode`] to adapt the answer into. [`Modem::dial`]
//! connects, writes the request, classifies the response status and adapts the body.

use std::{future::Future, sync::Arc};

use tokio::time;

mod framing;
mod request;
mod response;
mod status;
mod stream;
mod tls;
mod transport;

pub use framing::{Framing, LogOutputDecoder, MAX_FRAME_LEN};
pub use request::{Body, ByteStream, Call, RequestBody, ResponseMode, build};
pub use response::Response;
pub use status::{Expect, Outcome, StatusTable, UNEXPECTED_STATUS, classify};
pub use stream::Stream;
pub use transport::{
    Connection, ConnectionConfig, DEFAULT_SOCKET_PATH, DEFAULT_TIMEOUT, Host, Io, TlsCredentials,
    connect,
};

use crate::error::{DomainError, Error, TransportError};

/// Performs one complete request/response exchange.
///
/// Resource handles only talk to the daemon through this trait.
pub trait Dial {
    fn dial(&self, call: Call) -> impl Future<Output = Result<Response, Error>>;
}

/// The default [`Dial`] implementation, talking HTTP/1.1 to a daemon.
///
/// Every call opens its own connection, so two requests never share a socket.
#[derive(Debug, Clone)]
pub struct Modem {
    config: Arc<ConnectionConfig>,
}

impl Modem {
    pub fn new(config: ConnectionConfig) -> Modem {
        Modem {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    #[tracing::instrument(level = "debug", skip_all, fields(method = %call.method, path = %call.path))]
    async fn exchange(&self, call: Call) -> Result<Response, Error> {
        let statuses = call.statuses;
        let mode = call.mode;
        let request = build(call, &self.config)?;

        let connection = connect(&self.config).await?;

        tracing::debug!(uri = %request.uri(), "sending request");
        let response = connection.send(request).await?;

        let status = response.status().as_u16();
        tracing::debug!(status, "received response");

        match classify(&statuses, status, response) {
            Outcome::Success(response) => response::adapt(mode, response).await,
            Outcome::Failure {
                tag,
                status,
                body: response,
            } => {
                let body = response::collect(response.into_body()).await?;
                Err(DomainError::new(tag, status, body).into())
            }
        }
    }
}

impl Default for Modem {
    fn default() -> Self {
        Modem::new(ConnectionConfig::default())
    }
}

impl Dial for Modem {
    async fn dial(&self, call: Call) -> Result<Response, Error> {
        let timeout = self.config.timeout;
        time::timeout(timeout, self.exchange(call))
            .await
            .map_err(|_| TransportError::Timeout(timeout))?
    }
}
