//! Error types returned by the request engine.
//!
//! Every phase of a request fails with its own variant so callers can tell an
//! unreachable host (`OpenRequestFailed`) from a peer that answered garbage
//! (`ReceiveResponseFailed`) or stopped answering (`ReadDataFailed`).

use crate::client::options::OptionName;

/// Errors produced by connection management and request execution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HttpApiError {
    /// `create_connection` was given no host or an empty one.
    #[error("host name is null or empty")]
    NullOrEmptyHost,

    /// The transport factory could not build a transport for the host.
    #[error("unable to create transport: {0}")]
    TransportCreateFailed(String),

    /// Caller input was rejected before any I/O took place.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A buffer could not be allocated.
    #[error("allocation failed")]
    AllocationFailed,

    /// The transport refused a stored credential.
    #[error("transport rejected option {0}")]
    SetOptionFailed(OptionName),

    /// The transport did not open within its budget.
    #[error("open request failed")]
    OpenRequestFailed,

    /// The request line could not be serialized.
    #[error("string processing error")]
    StringProcessingError,

    /// A send failed or did not complete within its budget.
    #[error("send request failed")]
    SendRequestFailed,

    /// The response was truncated, too large, or did not arrive in time.
    #[error("read data failed")]
    ReadDataFailed,

    /// The response status line or header block is malformed.
    #[error("receive response failed")]
    ReceiveResponseFailed,
}

pub type Result<T> = std::result::Result<T, HttpApiError>;
