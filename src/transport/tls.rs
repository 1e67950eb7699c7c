//! TLS session layered over the transport's non-blocking socket.
//!
//! Records only move while the transport is pumped: [`TlsSession::flush`]
//! writes whatever rustls has queued and [`TlsSession::read`] feeds received
//! records in, handing the decrypted bytes straight to the event sink.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;

use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use rustls::{ClientConfig, ClientConnection, RootCertStore};
use tracing::trace;

use super::{TransportError, TransportEvents};
use crate::client::options::OptionName;

const PLAINTEXT_CHUNK: usize = 4096;

/// Credentials handed to the transport as PEM, kept parsed until the next
/// open builds a client configuration from them.
#[derive(Default)]
pub struct TlsSettings {
    trusted: Vec<CertificateDer<'static>>,
    client_chain: Vec<CertificateDer<'static>>,
    client_key: Option<PrivateKeyDer<'static>>,
}

impl TlsSettings {
    /// Parses `value` as PEM and replaces the stored credential.
    pub fn set(&mut self, name: OptionName, value: &[u8]) -> Result<(), TransportError> {
        match name {
            OptionName::TrustedCertificate => self.trusted = parse_certificates(name, value)?,
            OptionName::ClientCertificate => self.client_chain = parse_certificates(name, value)?,
            OptionName::ClientPrivateKey => {
                let key = PrivateKeyDer::from_pem_slice(value)
                    .map_err(|e| TransportError::Rejected(format!("{name}: {e:?}")))?;
                self.client_key = Some(key);
            }
        }
        Ok(())
    }

    pub fn has_client_auth(&self) -> bool {
        !self.client_chain.is_empty() && self.client_key.is_some()
    }

    /// Trusts the stored bundle, or the web PKI roots when none was set.
    /// Presents the client certificate only when both halves are present.
    pub fn client_config(&self) -> Result<Arc<ClientConfig>, TransportError> {
        let mut roots = RootCertStore::empty();
        if self.trusted.is_empty() {
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        } else {
            for cert in &self.trusted {
                roots.add(cert.clone())?;
            }
        }

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let builder = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()?
            .with_root_certificates(roots);

        let config = match &self.client_key {
            Some(key) if !self.client_chain.is_empty() => {
                builder.with_client_auth_cert(self.client_chain.clone(), key.clone_key())?
            }
            _ => builder.with_no_client_auth(),
        };
        Ok(Arc::new(config))
    }
}

fn parse_certificates(
    name: OptionName,
    pem: &[u8],
) -> Result<Vec<CertificateDer<'static>>, TransportError> {
    let certs = CertificateDer::pem_slice_iter(pem)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TransportError::Rejected(format!("{name}: {e:?}")))?;
    if certs.is_empty() {
        return Err(TransportError::Rejected(format!("{name}: no certificate found")));
    }
    Ok(certs)
}

pub struct TlsSession {
    conn: ClientConnection,
}

impl TlsSession {
    /// Starts a client handshake for `host`; the hello goes out on the first
    /// flush.
    pub fn new(config: Arc<ClientConfig>, host: &str) -> Result<Self, TransportError> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| TransportError::InvalidEndpoint(format!("{host}: {e}")))?;
        let conn = ClientConnection::new(config, server_name)?;
        Ok(Self { conn })
    }

    pub fn is_handshaking(&self) -> bool {
        self.conn.is_handshaking()
    }

    /// Hands plaintext to rustls for encryption. Returns how much was taken;
    /// zero means its buffer is full until the next flush.
    pub fn write_plaintext(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.conn.writer().write(bytes)
    }

    /// Writes queued records. `Ok(true)` once nothing is left queued.
    pub fn flush(&mut self, socket: &mut TcpStream) -> io::Result<bool> {
        while self.conn.wants_write() {
            match self.conn.write_tls(socket) {
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }

    /// Reads every available record and delivers the plaintext. Returns
    /// `Ok(false)` once the peer has closed.
    pub fn read(
        &mut self,
        socket: &mut TcpStream,
        events: &mut dyn TransportEvents,
    ) -> io::Result<bool> {
        loop {
            match self.conn.read_tls(socket) {
                Ok(0) => return Ok(false),
                Ok(n) => {
                    trace!(bytes = n, "Received TLS records");
                    let state = self.conn.process_new_packets().map_err(io::Error::other)?;
                    if state.plaintext_bytes_to_read() > 0 {
                        self.deliver(events)?;
                    }
                    if state.peer_has_closed() {
                        return Ok(false);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(true),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn deliver(&mut self, events: &mut dyn TransportEvents) -> io::Result<()> {
        let mut chunk = [0u8; PLAINTEXT_CHUNK];
        loop {
            match self.conn.reader().read(&mut chunk) {
                Ok(0) => return Ok(()),
                Ok(n) => events.on_bytes_received(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }

    /// Queues a close_notify alert and makes one attempt to send it.
    pub fn close(&mut self, socket: &mut TcpStream) -> io::Result<()> {
        self.conn.send_close_notify();
        self.flush(socket).map(|_| ())
    }
}
