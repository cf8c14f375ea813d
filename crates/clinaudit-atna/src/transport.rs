//! Mutual-TLS delivery of audit messages to an ATNA collector.
//!
//! `AtnaTransmitter` implements `AuditTransport`.  For every persisted event
//! it renders an RFC 3881 message and hands it to a `Dialer`, which opens a
//! connection, writes the message, and closes.  Nothing is retried or
//! queued, and no failure leaves `send`.
//!
//! TLS material comes from `AtnaSettings`:
//!
//! - `atna_audit_cacert`: when set, the collector's certificate is verified
//!   against this CA.  When empty, the collector is NOT verified.
//! - `atna_audit_localcert`: when set, one PEM file holding the client
//!   certificate chain and its private key, presented to the collector.

use std::{
    fs::File,
    io::{BufReader, Write},
    net::{TcpStream, ToSocketAddrs},
    path::Path,
    sync::Arc,
    time::Duration,
};

use chrono::Utc;
use rustls::{
    pki_types::{CertificateDer, PrivateKeyDer, ServerName},
    ClientConfig, ClientConnection, RootCertStore, StreamOwned,
};
use tracing::{debug, warn};

use clinaudit_contracts::{
    event::AuditEvent,
    settings::{AtnaSettings, AuditSettings, SourceIdentity},
};
use clinaudit_core::traits::AuditTransport;

use crate::{error::AtnaError, message::Rfc3881Message};

/// Connect timeout for the collector; also bounds each read and write.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

/// Opens a connection to the collector and writes one message.
pub trait Dialer: Send + Sync {
    /// Connect to the collector in `settings`, write `message` in full,
    /// and close the connection.
    fn deliver(&self, settings: &AtnaSettings, message: &[u8]) -> Result<(), AtnaError>;
}

/// Delivers over TLS on a blocking TCP socket.
#[derive(Debug, Default, Clone, Copy)]
pub struct TlsDialer;

impl TlsDialer {
    /// Build the client configuration for `settings`.
    ///
    /// Certificate files are read on every call, so rotated material is
    /// picked up without a restart.
    pub fn client_config(settings: &AtnaSettings) -> Result<ClientConfig, AtnaError> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());

        let builder = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| AtnaError::config(format!("failed to set protocol versions: {}", e)))?;

        let builder = if settings.atna_audit_cacert.is_empty() {
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(NoCertificateVerification))
        } else {
            builder.with_root_certificates(load_roots(Path::new(&settings.atna_audit_cacert))?)
        };

        if settings.atna_audit_localcert.is_empty() {
            return Ok(builder.with_no_client_auth());
        }

        let path = Path::new(&settings.atna_audit_localcert);
        let certs = load_certificates(path)?;
        if certs.is_empty() {
            return Err(AtnaError::cert_load(path, "no certificates found in file"));
        }
        let key = load_private_key(path)?;

        builder
            .with_client_auth_cert(certs, key)
            .map_err(|e| AtnaError::config(format!("failed to build client TLS config: {}", e)))
    }

    fn connect(settings: &AtnaSettings) -> Result<TcpStream, AtnaError> {
        let host = settings.atna_audit_host.trim();
        let port = settings.atna_audit_port;
        let unreachable = |reason: String| AtnaError::Connect {
            host: host.to_string(),
            port,
            reason,
        };

        let addrs = (host, port)
            .to_socket_addrs()
            .map_err(|e| unreachable(e.to_string()))?;

        let mut last_error = String::from("no addresses resolved");
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(CONNECT_TIMEOUT))?;
                    stream.set_write_timeout(Some(CONNECT_TIMEOUT))?;
                    return Ok(stream);
                }
                Err(e) => last_error = format!("{}: {}", addr, e),
            }
        }
        Err(unreachable(last_error))
    }
}

impl Dialer for TlsDialer {
    fn deliver(&self, settings: &AtnaSettings, message: &[u8]) -> Result<(), AtnaError> {
        let config = Self::client_config(settings)?;
        let host = settings.atna_audit_host.trim();
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| AtnaError::config(format!("invalid server name: {}", host)))?;
        let connection = ClientConnection::new(Arc::new(config), server_name)
            .map_err(|e| AtnaError::config(e.to_string()))?;

        let socket = Self::connect(settings)?;
        let mut stream = StreamOwned::new(connection, socket);

        stream.write_all(message)?;
        stream.conn.send_close_notify();
        stream.flush()?;
        Ok(())
    }
}

/// Best-effort `AuditTransport` towards the configured ATNA collector.
pub struct AtnaTransmitter {
    settings: AtnaSettings,
    source: SourceIdentity,
    dialer: Box<dyn Dialer>,
}

impl AtnaTransmitter {
    /// A transmitter that delivers over TLS.
    pub fn new(settings: &AuditSettings) -> Self {
        Self::with_dialer(settings, Box::new(TlsDialer))
    }

    pub fn with_dialer(settings: &AuditSettings, dialer: Box<dyn Dialer>) -> Self {
        Self {
            settings: settings.atna.clone(),
            source: settings.source.clone(),
            dialer,
        }
    }

    /// The message `send` would deliver for `event`, stamped now.
    pub fn preview(&self, event: &AuditEvent) -> String {
        Rfc3881Message::new(event, &self.source, self.settings.atna_audit_host.trim())
            .render(Utc::now())
    }
}

impl AuditTransport for AtnaTransmitter {
    fn send(&self, event: &AuditEvent) {
        if !self.settings.is_active() {
            return;
        }

        let message = self.preview(event);
        match self.dialer.deliver(&self.settings, message.as_bytes()) {
            Ok(()) => debug!(
                log_id = event.id,
                collector = %self.settings.atna_audit_host,
                "audit message delivered"
            ),
            Err(e) => warn!(
                log_id = event.id,
                collector = %self.settings.atna_audit_host,
                error = %e,
                "audit message not delivered"
            ),
        }
    }
}

// ── PEM loading ───────────────────────────────────────────────────────────────

fn load_certificates(path: &Path) -> Result<Vec<CertificateDer<'static>>, AtnaError> {
    let file = File::open(path).map_err(|e| AtnaError::cert_load(path, e.to_string()))?;
    let mut reader = BufReader::new(file);

    rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AtnaError::cert_load(path, e.to_string()))
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, AtnaError> {
    let file = File::open(path).map_err(|e| AtnaError::key_load(path, e.to_string()))?;
    let mut reader = BufReader::new(file);

    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| AtnaError::key_load(path, e.to_string()))?
        .ok_or_else(|| AtnaError::key_load(path, "no private key found in file"))
}

fn load_roots(path: &Path) -> Result<RootCertStore, AtnaError> {
    let mut roots = RootCertStore::empty();
    for cert in load_certificates(path)? {
        roots
            .add(cert)
            .map_err(|e| AtnaError::cert_load(path, e.to_string()))?;
    }
    if roots.is_empty() {
        return Err(AtnaError::cert_load(path, "no CA certificates found in file"));
    }
    Ok(roots)
}

/// Accepts any collector certificate.  Used only when no CA is configured.
#[derive(Debug)]
struct NoCertificateVerification;

impl rustls::client::danger::ServerCertVerifier for NoCertificateVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        vec![
            rustls::SignatureScheme::RSA_PKCS1_SHA256,
            rustls::SignatureScheme::RSA_PKCS1_SHA384,
            rustls::SignatureScheme::RSA_PKCS1_SHA512,
            rustls::SignatureScheme::ECDSA_NISTP256_SHA256,
            rustls::SignatureScheme::ECDSA_NISTP384_SHA384,
            rustls::SignatureScheme::ECDSA_NISTP521_SHA512,
            rustls::SignatureScheme::RSA_PSS_SHA256,
            rustls::SignatureScheme::RSA_PSS_SHA384,
            rustls::SignatureScheme::RSA_PSS_SHA512,
            rustls::SignatureScheme::ED25519,
        ]
    }
}
