//! Default transport: a non-blocking TCP socket with a TLS session on top,
//! unless the endpoint is plain `http`.
//!
//! The connect, name resolution included, is a future on a current-thread
//! tokio runtime owned by the transport; each pump lets it run for one short
//! slice. Once connected the socket is taken back from tokio and driven with
//! non-blocking reads and writes. Sends are queued and written as the socket
//! accepts them and every pump drains whatever the peer has sent. On a secure
//! endpoint the open completes when the TLS handshake does.

use std::collections::VecDeque;
use std::future::Future;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::pin::Pin;
use std::time::Duration;

use tokio::runtime::Runtime;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use super::tls::{TlsSession, TlsSettings};
use super::{Completion, Endpoint, Transport, TransportError, TransportEvents, TransportFactory};
use crate::client::options::OptionName;

const READ_CHUNK: usize = 4096;
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Longest one pump waits on a connect in progress.
const DIAL_SLICE: Duration = Duration::from_millis(1);

type Dial = Pin<Box<dyn Future<Output = io::Result<tokio::net::TcpStream>> + Send>>;

enum Layer {
    Plain,
    Tls(Box<TlsSession>),
}

struct Stream {
    socket: TcpStream,
    layer: Layer,
}

enum State {
    Idle,
    Dialing(Dial, Layer),
    Handshaking(Stream),
    Open(Stream),
    Closed,
}

struct PendingSend {
    bytes: Vec<u8>,
    written: usize,
}

impl Stream {
    /// Pushes queued sends through the layer, completing each one whose bytes
    /// all reached the socket.
    fn flush(
        &mut self,
        outbound: &mut VecDeque<PendingSend>,
        events: &mut dyn TransportEvents,
    ) -> io::Result<()> {
        match &mut self.layer {
            Layer::Plain => {
                while let Some(pending) = outbound.front_mut() {
                    match self.socket.write(&pending.bytes[pending.written..]) {
                        Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                        Ok(n) => pending.written += n,
                        Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        Err(e) => return Err(e),
                    }
                    if pending.written == pending.bytes.len() {
                        outbound.pop_front();
                        events.on_send_complete(Completion::Ok);
                    }
                }
                Ok(())
            }
            Layer::Tls(session) => {
                while let Some(pending) = outbound.front_mut() {
                    if pending.written < pending.bytes.len() {
                        pending.written +=
                            session.write_plaintext(&pending.bytes[pending.written..])?;
                    }
                    if !session.flush(&mut self.socket)? {
                        return Ok(());
                    }
                    if pending.written == pending.bytes.len() {
                        outbound.pop_front();
                        events.on_send_complete(Completion::Ok);
                    }
                }
                session.flush(&mut self.socket).map(|_| ())
            }
        }
    }

    /// Delivers everything the peer has sent. `Ok(false)` once the peer has
    /// closed its side.
    fn drain(&mut self, events: &mut dyn TransportEvents) -> io::Result<bool> {
        match &mut self.layer {
            Layer::Plain => {
                let mut chunk = [0u8; READ_CHUNK];
                loop {
                    match self.socket.read(&mut chunk) {
                        Ok(0) => return Ok(false),
                        Ok(n) => {
                            trace!(bytes = n, "Received data");
                            events.on_bytes_received(&chunk[..n]);
                        }
                        Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(true),
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        Err(e) => return Err(e),
                    }
                }
            }
            Layer::Tls(session) => session.read(&mut self.socket, events),
        }
    }

    /// Moves handshake records both ways. `Ok(true)` once the handshake is
    /// over.
    fn handshake(&mut self, events: &mut dyn TransportEvents) -> io::Result<bool> {
        let Layer::Tls(session) = &mut self.layer else {
            return Ok(true);
        };
        session.flush(&mut self.socket)?;
        if !session.read(&mut self.socket, events)? {
            return Err(io::ErrorKind::ConnectionAborted.into());
        }
        session.flush(&mut self.socket)?;
        Ok(!session.is_handshaking())
    }

    fn shutdown(mut self) -> io::Result<()> {
        if let Layer::Tls(session) = &mut self.layer {
            if let Err(e) = session.close(&mut self.socket) {
                debug!(error = %e, "Unable to send close_notify");
            }
        }
        match self.socket.shutdown(Shutdown::Both) {
            Err(e) if e.kind() != io::ErrorKind::NotConnected => Err(e),
            _ => Ok(()),
        }
    }
}

pub struct TcpTransport {
    endpoint: Endpoint,
    connect_timeout: Duration,
    runtime: Option<Runtime>,
    tls: TlsSettings,
    state: State,
    outbound: VecDeque<PendingSend>,
}

impl TcpTransport {
    pub fn new(endpoint: Endpoint, connect_timeout: Duration) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            endpoint,
            connect_timeout,
            runtime: Some(runtime),
            tls: TlsSettings::default(),
            state: State::Idle,
            outbound: VecDeque::new(),
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn is_secure(&self) -> bool {
        self.endpoint.secure
    }

    fn dial(&self) -> Dial {
        let addr = self.endpoint.socket_addr();
        let limit = self.connect_timeout;
        Box::pin(async move {
            match timeout(limit, tokio::net::TcpStream::connect(&addr)).await {
                Ok(connected) => connected,
                Err(_) => Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connect to {addr} timed out"),
                )),
            }
        })
    }

    fn pump_dial(&mut self, events: &mut dyn TransportEvents) {
        let (State::Dialing(dial, _), Some(runtime)) = (&mut self.state, self.runtime.as_ref())
        else {
            return;
        };
        let Ok(connected) = runtime.block_on(async { timeout(DIAL_SLICE, dial).await }) else {
            return;
        };
        let State::Dialing(_, layer) = std::mem::replace(&mut self.state, State::Closed) else {
            return;
        };

        let socket = connected.and_then(|stream| {
            let socket = stream.into_std()?;
            socket.set_nodelay(true)?;
            Ok(socket)
        });
        match socket {
            Ok(socket) => {
                debug!(
                    endpoint = %self.endpoint.socket_addr(),
                    secure = self.endpoint.secure,
                    "TCP connection established"
                );
                let stream = Stream { socket, layer };
                if matches!(stream.layer, Layer::Plain) {
                    self.state = State::Open(stream);
                    events.on_open_complete(Completion::Ok);
                } else {
                    self.state = State::Handshaking(stream);
                    self.pump_handshake(events);
                }
            }
            Err(e) => {
                warn!(endpoint = %self.endpoint.socket_addr(), error = %e, "TCP connect failed");
                events.on_open_complete(Completion::Error);
            }
        }
    }

    fn pump_handshake(&mut self, events: &mut dyn TransportEvents) {
        let State::Handshaking(stream) = &mut self.state else {
            return;
        };
        match stream.handshake(events) {
            Ok(false) => {}
            Ok(true) => {
                debug!(endpoint = %self.endpoint.socket_addr(), "TLS handshake complete");
                if let State::Handshaking(stream) =
                    std::mem::replace(&mut self.state, State::Closed)
                {
                    self.state = State::Open(stream);
                }
                events.on_open_complete(Completion::Ok);
            }
            Err(e) => {
                warn!(endpoint = %self.endpoint.socket_addr(), error = %e, "TLS handshake failed");
                self.state = State::Closed;
                events.on_open_complete(Completion::Error);
            }
        }
    }

    fn pump_open(&mut self, events: &mut dyn TransportEvents) {
        let State::Open(stream) = &mut self.state else {
            return;
        };

        if let Err(e) = stream.flush(&mut self.outbound, events) {
            warn!(error = %e, "Write failed");
            self.outbound.clear();
            self.state = State::Closed;
            events.on_send_complete(Completion::Error);
            events.on_error();
            return;
        }

        match stream.drain(events) {
            Ok(true) => {}
            Ok(false) => {
                debug!(endpoint = %self.endpoint.socket_addr(), "Peer closed the connection");
                self.state = State::Closed;
                events.on_error();
            }
            Err(e) => {
                warn!(error = %e, "Read failed");
                self.state = State::Closed;
                events.on_error();
            }
        }
    }
}

impl Transport for TcpTransport {
    fn open(&mut self, _events: &mut dyn TransportEvents) -> Result<(), TransportError> {
        let layer = if self.endpoint.secure {
            let config = self.tls.client_config()?;
            trace!(client_auth = self.tls.has_client_auth(), "Starting TLS session");
            Layer::Tls(Box::new(TlsSession::new(config, &self.endpoint.host)?))
        } else {
            Layer::Plain
        };
        // Reopening drops any stream left over from a peer that hung up.
        self.outbound.clear();
        self.state = State::Dialing(self.dial(), layer);
        Ok(())
    }

    fn send(
        &mut self,
        bytes: &[u8],
        _events: &mut dyn TransportEvents,
    ) -> Result<(), TransportError> {
        if !matches!(self.state, State::Open(_)) {
            return Err(TransportError::NotOpen);
        }
        if bytes.is_empty() {
            return Err(TransportError::Rejected("empty send".to_string()));
        }
        self.outbound.push_back(PendingSend {
            bytes: bytes.to_vec(),
            written: 0,
        });
        Ok(())
    }

    fn close(&mut self, events: &mut dyn TransportEvents) -> Result<(), TransportError> {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Open(stream) | State::Handshaking(stream) => {
                self.outbound.clear();
                stream.shutdown()?;
                events.on_close_complete();
                Ok(())
            }
            _ => Err(TransportError::NotOpen),
        }
    }

    fn pump_once(&mut self, events: &mut dyn TransportEvents) {
        match self.state {
            State::Dialing(..) => self.pump_dial(events),
            State::Handshaking(_) => self.pump_handshake(events),
            State::Open(_) => self.pump_open(events),
            State::Idle | State::Closed => {}
        }
    }

    fn set_option(&mut self, name: OptionName, value: &[u8]) -> Result<(), TransportError> {
        if !self.endpoint.secure {
            return Err(TransportError::UnsupportedOption(name));
        }
        self.tls.set(name, value)
    }

    fn is_open(&self) -> bool {
        match &self.state {
            // A peer that already hung up reads as end-of-stream.
            State::Open(stream) => match stream.socket.peek(&mut [0u8; 1]) {
                Ok(0) => false,
                Ok(_) => true,
                Err(e) => e.kind() == io::ErrorKind::WouldBlock,
            },
            _ => false,
        }
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        // Does not wait on a name lookup still running on the blocking pool.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Default factory used by [`crate::client::Connection::create`].
#[derive(Debug, Clone)]
pub struct TcpTransportFactory {
    pub connect_timeout: Duration,
}

impl Default for TcpTransportFactory {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl TransportFactory for TcpTransportFactory {
    type Transport = TcpTransport;

    fn create(&self, host: &str) -> Result<TcpTransport, TransportError> {
        let endpoint = Endpoint::parse(host)
            .ok_or_else(|| TransportError::InvalidEndpoint(host.to_string()))?;
        Ok(TcpTransport::new(endpoint, self.connect_timeout)?)
    }
}
