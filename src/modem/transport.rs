use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

use bytes::Bytes;
use http::Request;
use hyper::{body::Incoming, client::conn::http1};
use hyper_util::rt::TokioIo;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{TcpStream, UnixStream},
};
use url::Url;

use super::{request::RequestBody, tls};
use crate::error::{ProtocolError, TransportError};

/// Default location of the local daemon socket.
pub const DEFAULT_SOCKET_PATH: &str = "/var/run/docker.sock";

/// Default bound on connect, send, response headers and buffered bodies.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Byte stream the HTTP connection runs over.
pub trait Io: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send + 'static> Io for T {}

/// PEM-encoded material for a mutually authenticated TLS connection.
#[derive(Clone, PartialEq, Eq)]
pub struct TlsCredentials {
    /// Certificate authority used to verify the daemon.
    pub ca: Bytes,
    /// Client certificate chain.
    pub cert: Bytes,
    /// Client private key.
    pub key: Bytes,
}

impl fmt::Debug for TlsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsCredentials")
            .field("ca", &format_args!("<{} bytes>", self.ca.len()))
            .field("cert", &format_args!("<{} bytes>", self.cert.len()))
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Where the daemon listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Host {
    /// A Unix domain socket.
    Unix(PathBuf),
    /// Plain TCP.
    Tcp { host: String, port: u16 },
    /// TCP wrapped in TLS.
    Tls {
        host: String,
        port: u16,
        credentials: TlsCredentials,
    },
}

impl Host {
    /// Value for the `Host` request header.
    pub(crate) fn authority(&self) -> String {
        match self {
            Host::Unix(_) => "localhost".to_string(),
            Host::Tcp { host, port } | Host::Tls { host, port, .. } => format!("{host}:{port}"),
        }
    }
}

impl Default for Host {
    fn default() -> Self {
        Host::Unix(PathBuf::from(DEFAULT_SOCKET_PATH))
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Host::Unix(path) => write!(f, "unix://{}", path.display()),
            Host::Tcp { host, port } => write!(f, "tcp://{host}:{port}"),
            Host::Tls { host, port, .. } => write!(f, "tls://{host}:{port}"),
        }
    }
}

/// Parses `DOCKER_HOST`-style addresses: `unix:///path`, `tcp://host:port`,
/// `http://host:port`. TLS hosts need credentials and cannot be parsed.
impl FromStr for Host {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ProtocolError::InvalidHost(s.to_string());

        if s.starts_with('/') {
            return Ok(Host::Unix(PathBuf::from(s)));
        }

        let url = Url::parse(s).map_err(|_| invalid())?;
        match url.scheme() {
            "unix" => {
                if url.path().is_empty() {
                    return Err(invalid());
                }
                Ok(Host::Unix(PathBuf::from(url.path())))
            }
            "tcp" | "http" => Ok(Host::Tcp {
                host: url.host_str().ok_or_else(invalid)?.to_string(),
                port: url.port().unwrap_or(2375),
            }),
            _ => Err(invalid()),
        }
    }
}

/// Immutable configuration of a client's connection to the daemon.
///
/// # Examples
///
/// ```
/// use docker_modem::{ConnectionConfig, Host};
/// use std::time::Duration;
///
/// let config = ConnectionConfig::builder()
///     .host("tcp://127.0.0.1:2375".parse::<Host>().unwrap())
///     .api_version("1.43")
///     .timeout(Duration::from_secs(30))
///     .build();
///
/// assert_eq!(config.path_prefix(), "/v1.43");
/// ```
#[derive(Debug, Clone, PartialEq, typed_builder::TypedBuilder)]
#[builder(doc)]
pub struct ConnectionConfig {
    /// Daemon address
    #[builder(default)]
    pub host: Host,
    /// API version prefixed to every path, e.g. `1.43`
    #[builder(default, setter(strip_option, into))]
    pub api_version: Option<String>,
    /// Bound on everything up to and including a buffered body
    #[builder(default = DEFAULT_TIMEOUT)]
    pub timeout: Duration,
}

impl ConnectionConfig {
    /// Returns a configuration for the given host with default settings.
    pub fn new(host: Host) -> Self {
        ConnectionConfig::builder().host(host).build()
    }

    /// Path prefix for the configured API version, or an empty string.
    pub fn path_prefix(&self) -> String {
        match self.api_version.as_deref().map(|v| v.trim_start_matches('v')) {
            Some(version) if !version.is_empty() => format!("/v{version}"),
            _ => String::new(),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig::builder().build()
    }
}

/// One HTTP/1.1 connection, good for exactly one exchange.
pub struct Connection {
    sender: http1::SendRequest<RequestBody>,
}

impl Connection {
    /// Writes the request and waits for the response headers.
    pub async fn send(
        mut self,
        request: Request<RequestBody>,
    ) -> Result<http::Response<Incoming>, TransportError> {
        self.sender
            .send_request(request)
            .await
            .map_err(TransportError::Send)
    }
}

/// Opens a connection to the configured host and runs the HTTP handshake on it.
///
/// The connection task is spawned onto the current runtime and kept alive with upgrade
/// support, so a hijacked response can take over the socket.
pub async fn connect(config: &ConnectionConfig) -> Result<Connection, TransportError> {
    let io = open(&config.host).await?;

    let (sender, conn) = http1::Builder::new()
        .handshake::<_, RequestBody>(TokioIo::new(io))
        .await
        .map_err(TransportError::Handshake)?;

    let target = config.host.to_string();
    tokio::spawn(async move {
        if let Err(e) = conn.with_upgrades().await {
            tracing::debug!(%target, "docker connection ended: {}", e);
        }
    });

    Ok(Connection { sender })
}

async fn open(host: &Host) -> Result<Box<dyn Io>, TransportError> {
    tracing::debug!(%host, "connecting");

    match host {
        Host::Unix(path) => {
            let stream = UnixStream::connect(path)
                .await
                .map_err(|source| TransportError::Connect {
                    target: host.to_string(),
                    source,
                })?;
            Ok(Box::new(stream))
        }
        Host::Tcp { host: name, port } => {
            let stream = tcp(host, name, *port).await?;
            Ok(Box::new(stream))
        }
        Host::Tls {
            host: name,
            port,
            credentials,
        } => {
            let connector = tls::connector(credentials)?;
            let stream = tcp(host, name, *port).await?;
            let stream = tls::handshake(&connector, name, stream).await?;
            Ok(Box::new(stream))
        }
    }
}

async fn tcp(host: &Host, name: &str, port: u16) -> Result<TcpStream, TransportError> {
    let stream = TcpStream::connect((name, port))
        .await
        .map_err(|source| TransportError::Connect {
            target: host.to_string(),
            source,
        })?;
    // Interactive exec/attach traffic is small writes.
    let _ = stream.set_nodelay(true);
    Ok(stream)
}
