// src/core/scanner/ssl_scanner.rs

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, error, info};

use crate::core::error::AnalysisError;

static CRYPTO_PROVIDER: Lazy<Arc<CryptoProvider>> =
    Lazy::new(|| Arc::new(rustls::crypto::ring::default_provider()));

/// Certificates exactly as the server presented them, DER encoded.
#[derive(Debug, Clone)]
pub struct PresentedCertificates {
    pub leaf: Vec<u8>,
    /// Everything after the leaf, starting with the leaf's issuer.
    pub chain: Vec<Vec<u8>>,
}

/// Accepts every certificate and handshake signature.
///
/// The scanner has to report on expired, self-signed and mismatched certificates,
/// so nothing presented by the server is allowed to abort the handshake.
#[derive(Debug)]
struct InspectOnlyVerifier;

impl ServerCertVerifier for InspectOnlyVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA1,
            SignatureScheme::ECDSA_SHA1_Legacy,
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP521_SHA512,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ED25519,
            SignatureScheme::ED448,
        ]
    }
}

fn inspection_config() -> Result<ClientConfig, rustls::Error> {
    Ok(ClientConfig::builder_with_provider(CRYPTO_PROVIDER.clone())
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(InspectOnlyVerifier))
        .with_no_client_auth())
}

/// Opens one TLS connection to `host:port` and captures the presented certificates.
///
/// Trust and hostname are deliberately not verified. Connect and handshake share a
/// single `timeout`; there is no retry.
pub async fn retrieve_certificates(
    host: &str,
    port: u16,
    timeout: Duration,
) -> Result<PresentedCertificates, AnalysisError> {
    info!(host, port, "Starting certificate retrieval.");
    let endpoint = format!("{}:{}", host, port);
    let connection_error = |reason: String| AnalysisError::Connection {
        target: endpoint.clone(),
        reason,
    };

    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| AnalysisError::InvalidTarget(format!("{}: {}", host, e)))?;

    let config = inspection_config().map_err(|e| {
        error!(error = %e, "Failed to build TLS client configuration");
        connection_error(format!("TLS configuration error: {}", e))
    })?;
    let connector = TlsConnector::from(Arc::new(config));

    let handshake = async {
        debug!(host, port, "Connecting TCP stream.");
        let stream = TcpStream::connect((host, port)).await.map_err(|e| {
            error!(error = %e, "TCP connection failed");
            connection_error(format!("TCP Connection Error: {}", e))
        })?;

        debug!(host, "Performing TLS handshake.");
        connector.connect(server_name, stream).await.map_err(|e| {
            error!(error = %e, "TLS handshake failed");
            connection_error(format!("TLS Handshake Error: {}", e))
        })
    };

    let tls_stream = tokio::time::timeout(timeout, handshake).await.map_err(|_| {
        error!(host, port, timeout_secs = timeout.as_secs(), "TLS connection timed out");
        connection_error(format!("Connection timed out after {}s", timeout.as_secs()))
    })??;

    let (_, session) = tls_stream.get_ref();
    let presented = match session.peer_certificates() {
        Some(certs) if !certs.is_empty() => certs,
        _ => {
            debug!("TLS connection successful, but no peer certificate provided.");
            return Err(AnalysisError::CertificateUnavailable(endpoint));
        }
    };

    let leaf = presented[0].as_ref().to_vec();
    let chain: Vec<Vec<u8>> = presented[1..].iter().map(|c| c.as_ref().to_vec()).collect();
    info!(chain_len = chain.len(), "Captured peer certificates.");

    Ok(PresentedCertificates { leaf, chain })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refused_connection_is_a_connection_error() {
        let err = retrieve_certificates("127.0.0.1", 1, Duration::from_secs(3))
            .await
            .unwrap_err();
        match err {
            AnalysisError::Connection { target, reason } => {
                assert_eq!(target, "127.0.0.1:1");
                assert!(reason.contains("TCP Connection Error"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_server_name_is_rejected() {
        let err = retrieve_certificates("bad host name", 443, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidTarget(_)));
    }
}
