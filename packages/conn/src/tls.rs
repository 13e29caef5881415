//! TLS configuration for quinn
//!
//! Builds rustls client and server configurations on the ring provider,
//! restricted to TLS 1.3 as QUIC requires, and wraps them for quinn.

use std::sync::Arc;

use quinn::crypto::rustls::{QuicClientConfig, QuicServerConfig};
use rcgen::{CertificateParams, KeyPair};
use rustls::RootCertStore;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};

use crate::config::Config;
use crate::error::Result;

/// Self-signed certificate and its private key
#[derive(Debug)]
pub struct SelfSigned {
    pub cert: CertificateDer<'static>,
    pub key: PrivatePkcs8KeyDer<'static>,
}

impl SelfSigned {
    /// Generate a certificate valid for `names`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Certificate`] if key or certificate generation fails.
    pub fn generate(names: impl Into<Vec<String>>) -> Result<Self> {
        let params = CertificateParams::new(names)?;
        let key_pair = KeyPair::generate()?;
        let cert = params.self_signed(&key_pair)?;

        tracing::debug!(target: "quick::tls", "Generated self-signed certificate");

        Ok(Self {
            cert: CertificateDer::from(cert.der().to_vec()),
            key: PrivatePkcs8KeyDer::from(key_pair.serialize_der()),
        })
    }

    /// Root store trusting only this certificate
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Tls`] if the certificate is rejected.
    pub fn roots(&self) -> Result<RootCertStore> {
        let mut roots = RootCertStore::empty();
        roots.add(self.cert.clone())?;
        Ok(roots)
    }
}

/// Root store with the bundled web PKI roots
pub fn webpki_roots() -> RootCertStore {
    RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned())
}

fn provider() -> Arc<rustls::crypto::CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

/// quinn client configuration trusting `roots`
///
/// # Errors
///
/// Returns an error if the TLS or transport settings are invalid.
pub fn client_config(config: &Config, roots: RootCertStore) -> Result<quinn::ClientConfig> {
    let mut crypto = rustls::ClientConfig::builder_with_provider(provider())
        .with_protocol_versions(&[&rustls::version::TLS13])?
        .with_root_certificates(roots)
        .with_no_client_auth();
    crypto.alpn_protocols.clone_from(&config.alpn_protocols);

    let mut client = quinn::ClientConfig::new(Arc::new(QuicClientConfig::try_from(crypto)?));
    client.transport_config(config.transport()?);
    Ok(client)
}

/// quinn server configuration presenting `certs`
///
/// # Errors
///
/// Returns an error if the certificate, key, TLS or transport settings are invalid.
pub fn server_config(
    config: &Config,
    certs: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
) -> Result<quinn::ServerConfig> {
    let mut crypto = rustls::ServerConfig::builder_with_provider(provider())
        .with_protocol_versions(&[&rustls::version::TLS13])?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    crypto.alpn_protocols.clone_from(&config.alpn_protocols);

    let mut server = quinn::ServerConfig::with_crypto(Arc::new(QuicServerConfig::try_from(crypto)?));
    server.transport_config(config.transport()?);
    Ok(server)
}
