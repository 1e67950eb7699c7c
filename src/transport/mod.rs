//! Transport abstraction the request engine runs on.
//!
//! A transport is an asynchronous byte stream that never blocks: `open`,
//! `send` and `close` only start an operation, and the outcome is reported
//! later through a [`TransportEvents`] sink. Progress happens only inside
//! [`Transport::pump_once`], which the engine calls in a loop. A transport is
//! free to report a completion inline, from within `open`/`send`/`close`.
//!
//! [`tcp::TcpTransport`] is the default implementation, with [`tls`] layered
//! on top for secure endpoints. Test doubles and other stacks are plugged in
//! through [`TransportFactory`].

pub mod endpoint;
pub mod tcp;
pub mod tls;

use std::io;

use crate::client::options::OptionName;

pub use endpoint::Endpoint;
pub use tcp::{TcpTransport, TcpTransportFactory};

/// Outcome reported for an open or send operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Ok,
    Error,
}

/// Callback sink handed to every transport call.
pub trait TransportEvents {
    fn on_open_complete(&mut self, result: Completion);
    fn on_send_complete(&mut self, result: Completion);
    fn on_bytes_received(&mut self, bytes: &[u8]);
    fn on_close_complete(&mut self);
    /// The stream failed outside of any specific operation.
    fn on_error(&mut self);
}

/// Abstract asynchronous byte stream.
pub trait Transport {
    fn open(&mut self, events: &mut dyn TransportEvents) -> Result<(), TransportError>;

    fn send(&mut self, bytes: &[u8], events: &mut dyn TransportEvents)
    -> Result<(), TransportError>;

    fn close(&mut self, events: &mut dyn TransportEvents) -> Result<(), TransportError>;

    /// Let the transport make progress, firing any due callbacks.
    fn pump_once(&mut self, events: &mut dyn TransportEvents);

    fn set_option(&mut self, name: OptionName, value: &[u8]) -> Result<(), TransportError>;

    /// Whether the stream is open (open completed, close not yet completed).
    fn is_open(&self) -> bool;
}

/// Builds the transport a connection talks through.
pub trait TransportFactory {
    type Transport: Transport;

    fn create(&self, host: &str) -> Result<Self::Transport, TransportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("transport is not open")]
    NotOpen,

    #[error("option {0} is not supported by this transport")]
    UnsupportedOption(OptionName),

    #[error("tls error: {0}")]
    Tls(#[from] rustls::Error),

    #[error("transport rejected the request: {0}")]
    Rejected(String),
}
