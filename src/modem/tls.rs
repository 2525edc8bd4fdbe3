use std::sync::Arc;

use tokio::net::TcpStream;
use tokio_rustls::{
    TlsConnector,
    client::TlsStream,
    rustls::{
        ClientConfig, RootCertStore,
        crypto::ring,
        pki_types::{CertificateDer, PrivateKeyDer, ServerName},
    },
};

use super::transport::TlsCredentials;
use crate::error::TransportError;

/// Builds a connector that verifies the daemon against `credentials.ca` and presents the
/// client certificate.
pub(crate) fn connector(credentials: &TlsCredentials) -> Result<TlsConnector, TransportError> {
    let mut roots = RootCertStore::empty();
    for cert in certs(&credentials.ca, "CA")? {
        roots
            .add(cert)
            .map_err(|e| TransportError::Credentials(format!("invalid CA certificate: {e}")))?;
    }

    let chain = certs(&credentials.cert, "client certificate")?;
    let key = key(&credentials.key)?;

    let config = ClientConfig::builder_with_provider(Arc::new(ring::default_provider()))
        .with_safe_default_protocol_versions()
        .map_err(|e| TransportError::Credentials(e.to_string()))?
        .with_root_certificates(roots)
        .with_client_auth_cert(chain, key)
        .map_err(|e| TransportError::Credentials(format!("invalid client certificate: {e}")))?;

    Ok(TlsConnector::from(Arc::new(config)))
}

pub(crate) async fn handshake(
    connector: &TlsConnector,
    host: &str,
    stream: TcpStream,
) -> Result<TlsStream<TcpStream>, TransportError> {
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| TransportError::Credentials(format!("invalid server name {host}: {e}")))?;

    connector
        .connect(server_name, stream)
        .await
        .map_err(|source| TransportError::Tls {
            target: host.to_string(),
            source,
        })
}

fn certs(pem: &[u8], what: &str) -> Result<Vec<CertificateDer<'static>>, TransportError> {
    let certs = rustls_pemfile::certs(&mut &pem[..])
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TransportError::Credentials(format!("unreadable {what}: {e}")))?;

    if certs.is_empty() {
        return Err(TransportError::Credentials(format!(
            "no certificate found in {what}"
        )));
    }

    Ok(certs)
}

fn key(pem: &[u8]) -> Result<PrivateKeyDer<'static>, TransportError> {
    rustls_pemfile::private_key(&mut &pem[..])
        .map_err(|e| TransportError::Credentials(format!("unreadable private key: {e}")))?
        .ok_or_else(|| TransportError::Credentials("no private key found".to_string()))
}
