//! A scripted stand-in for the Docker daemon.
//!
//! Each accepted connection reads one request and hands it to a handler, which writes
//! whatever raw HTTP it wants back onto the socket.

use std::{future::Future, sync::Arc};

use bytes::Bytes;
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa,
    KeyPair, KeyUsagePurpose,
};
use tempfile::TempDir;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::{TcpListener, TcpStream, UnixListener},
};
use tokio_rustls::{
    TlsAcceptor,
    rustls::{
        RootCertStore, ServerConfig,
        crypto::ring,
        pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer},
        server::WebPkiClientVerifier,
    },
    server::TlsStream,
};

use crate::modem::{ConnectionConfig, Host, TlsCredentials};

/// A request as received by the fake daemon.
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    /// Request line, e.g. `GET /containers/json HTTP/1.1`.
    pub line: String,
    /// Header lines with lowercased names.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ReceivedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

pub struct FakeDaemon {
    pub config: ConnectionConfig,
    _dir: Option<TempDir>,
}

/// Serves every connection on a unix socket in a temporary directory.
pub async fn unix_daemon<F, Fut>(handler: F) -> FakeDaemon
where
    F: Fn(ReceivedRequest, tokio::net::UnixStream) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("docker.sock");
    let listener = UnixListener::bind(&path).unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                if let Some(request) = read_request(&mut stream).await {
                    handler(request, stream).await;
                }
            });
        }
    });

    FakeDaemon {
        config: ConnectionConfig::new(Host::Unix(path)),
        _dir: Some(dir),
    }
}

/// Serves every connection on a loopback TCP port.
pub async fn tcp_daemon<F, Fut>(handler: F) -> FakeDaemon
where
    F: Fn(ReceivedRequest, tokio::net::TcpStream) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                if let Some(request) = read_request(&mut stream).await {
                    handler(request, stream).await;
                }
            });
        }
    });

    FakeDaemon {
        config: ConnectionConfig::new(Host::Tcp {
            host: "127.0.0.1".to_string(),
            port,
        }),
        _dir: None,
    }
}

/// A throwaway CA with a `localhost` server certificate and a client certificate.
pub struct TestPki {
    /// The CA plus the client's certificate and key.
    pub credentials: TlsCredentials,
    /// Serves the server certificate and requires a client certificate from the CA.
    pub acceptor: TlsAcceptor,
}

impl TestPki {
    pub fn generate() -> TestPki {
        let ca_key = KeyPair::generate().unwrap();
        let mut ca_params = CertificateParams::new(Vec::<String>::new()).unwrap();
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        ca_params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        ca_params
            .distinguished_name
            .push(DnType::CommonName, "docker-modem test CA");
        let ca = ca_params.self_signed(&ca_key).unwrap();

        let (server, server_key) = leaf(
            &ca,
            &ca_key,
            vec!["localhost".to_string()],
            ExtendedKeyUsagePurpose::ServerAuth,
        );
        let (client, client_key) =
            leaf(&ca, &ca_key, Vec::new(), ExtendedKeyUsagePurpose::ClientAuth);

        let provider = Arc::new(ring::default_provider());
        let mut roots = RootCertStore::empty();
        roots.add(ca.der().clone()).unwrap();
        let verifier =
            WebPkiClientVerifier::builder_with_provider(Arc::new(roots), Arc::clone(&provider))
                .build()
                .unwrap();
        let config = ServerConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .unwrap()
            .with_client_cert_verifier(verifier)
            .with_single_cert(
                vec![server.der().clone()],
                PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(server_key.serialize_der())),
            )
            .unwrap();

        TestPki {
            credentials: TlsCredentials {
                ca: Bytes::from(ca.pem()),
                cert: Bytes::from(client.pem()),
                key: Bytes::from(client_key.serialize_pem()),
            },
            acceptor: TlsAcceptor::from(Arc::new(config)),
        }
    }
}

fn leaf(
    ca: &Certificate,
    ca_key: &KeyPair,
    names: Vec<String>,
    usage: ExtendedKeyUsagePurpose,
) -> (Certificate, KeyPair) {
    let key = KeyPair::generate().unwrap();
    let mut params = CertificateParams::new(names).unwrap();
    params.extended_key_usages = vec![usage];
    let cert = params.signed_by(&key, ca, ca_key).unwrap();
    (cert, key)
}

/// Serves every connection over TLS on a loopback port. The returned config dials
/// `localhost` with `credentials`.
pub async fn tls_daemon<F, Fut>(
    acceptor: TlsAcceptor,
    credentials: TlsCredentials,
    handler: F,
) -> FakeDaemon
where
    F: Fn(ReceivedRequest, TlsStream<TcpStream>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let handler = Arc::clone(&handler);
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                let Ok(mut stream) = acceptor.accept(stream).await else {
                    return;
                };
                if let Some(request) = read_request(&mut stream).await {
                    handler(request, stream).await;
                }
            });
        }
    });

    FakeDaemon {
        config: ConnectionConfig::new(Host::Tls {
            host: "localhost".to_string(),
            port,
            credentials,
        }),
        _dir: None,
    }
}

/// Reads a request head and its `Content-Length` body.
async fn read_request(stream: &mut (impl AsyncRead + Unpin)) -> Option<ReceivedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let head_end = loop {
        if let Some(i) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break i;
        }
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.split("\r\n");
    let line = lines.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(n, v)| (n.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let length = headers
        .iter()
        .find(|(n, _)| n == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[head_end + 4..].to_vec();
    while body.len() < length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(ReceivedRequest {
        line,
        headers,
        body,
    })
}

/// Writes a complete response with a `Content-Length` body and waits for the client to
/// hang up.
pub async fn respond(
    stream: &mut (impl AsyncRead + AsyncWrite + Unpin),
    status: &str,
    content_type: &str,
    body: &[u8],
) {
    let head = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\n\r\n",
        body.len()
    );
    stream.write_all(head.as_bytes()).await.unwrap();
    stream.write_all(body).await.unwrap();
    stream.flush().await.unwrap();

    let mut sink = Vec::new();
    let _ = stream.read_to_end(&mut sink).await;
}

/// A multiplexed stream frame.
pub fn frame(kind: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![kind, 0, 0, 0];
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    out
}
