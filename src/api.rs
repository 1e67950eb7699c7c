//! Handle-style entry points.
//!
//! Thin wrappers over [`Connection`] that accept optional arguments and map
//! anything missing or malformed to [`HttpApiError::InvalidArgument`] before
//! any I/O takes place.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::client::options::{self, OptionName};
use crate::client::{Connection, ResponseSink};
use crate::error::{HttpApiError, Result};
use crate::http::headers::HeaderCollection;
use crate::http::request::{Method, RequestParts};
use crate::transport::Transport;

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Global setup. Nothing is required before creating connections; the flag
/// only records that the caller went through the lifecycle.
pub fn init() -> Result<()> {
    INITIALIZED.store(true, Ordering::SeqCst);
    debug!("HTTP API initialized");
    Ok(())
}

pub fn deinit() {
    if INITIALIZED.swap(false, Ordering::SeqCst) {
        debug!("HTTP API deinitialized");
    }
}

pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::SeqCst)
}

pub fn create_connection(host: Option<&str>) -> Result<Connection> {
    let host = host.ok_or(HttpApiError::NullOrEmptyHost)?;
    Connection::create(host)
}

/// Closes and drops the connection. `None` is ignored.
pub fn close_connection<T: Transport>(handle: Option<Connection<T>>) {
    if let Some(conn) = handle {
        conn.close();
    }
}

pub fn set_option<T: Transport>(
    handle: Option<&mut Connection<T>>,
    name: Option<&str>,
    value: Option<&[u8]>,
) -> Result<()> {
    let conn = handle.ok_or(HttpApiError::InvalidArgument("handle"))?;
    let name = name
        .and_then(OptionName::from_name)
        .ok_or(HttpApiError::InvalidArgument("option name"))?;
    let value = value.ok_or(HttpApiError::InvalidArgument("option value"))?;
    conn.set_option(name, value)
}

/// Independent copy of an option value.
pub fn clone_option(name: Option<&str>, value: Option<&[u8]>) -> Result<Vec<u8>> {
    let name = name.ok_or(HttpApiError::InvalidArgument("option name"))?;
    let value = value.ok_or(HttpApiError::InvalidArgument("option value"))?;
    options::clone_option(name, value)
}

/// Executes one request on `handle`.
///
/// `content_length` bytes of `content` are sent as the body; a length of zero
/// sends no body. Outputs that are `None` are not written.
#[allow(clippy::too_many_arguments)]
pub fn execute_request<'a, T: Transport>(
    handle: Option<&mut Connection<T>>,
    method: &str,
    path: Option<&str>,
    headers: Option<&dyn HeaderCollection>,
    content: Option<&[u8]>,
    content_length: usize,
    status: Option<&'a mut u16>,
    response_headers: Option<&'a mut dyn HeaderCollection>,
    response_body: Option<&'a mut Vec<u8>>,
) -> Result<()> {
    let conn = handle.ok_or(HttpApiError::InvalidArgument("handle"))?;
    let method = Method::from_str(method).ok_or(HttpApiError::InvalidArgument("method"))?;
    let path = path.ok_or(HttpApiError::InvalidArgument("path"))?;
    let headers = headers.ok_or(HttpApiError::InvalidArgument("headers"))?;

    let body = match content {
        Some(bytes) => Some(
            bytes
                .get(..content_length)
                .ok_or(HttpApiError::InvalidArgument("content length"))?,
        ),
        None if content_length > 0 => {
            return Err(HttpApiError::InvalidArgument("content length"));
        }
        None => None,
    };

    let request = RequestParts {
        method,
        path,
        headers,
        body,
    };
    let sink = ResponseSink {
        status,
        headers: response_headers,
        body: response_body,
    };
    conn.execute(request, sink)
}
