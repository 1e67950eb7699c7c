use bytes::Bytes;

use crate::http::headers::{HeaderCollection, HeaderError, validate_name, validate_value};
use crate::http::request::Method;

const HTTP_VERSION: &str = "HTTP/1.1";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WriteError {
    #[error("request line exceeds {0} bytes")]
    LineTooLong(usize),

    #[error("unable to read request header: {0}")]
    Header(#[from] HeaderError),
}

/// Builds the request head, one CRLF-terminated line per entry:
/// request line, `Host`, caller headers in collection order, an optional
/// `Content-Length` and the closing blank line.
pub fn serialize_request_head(
    method: Method,
    path: &str,
    host: &str,
    headers: &dyn HeaderCollection,
    content_length: Option<usize>,
    max_line_length: usize,
) -> Result<Vec<Bytes>, WriteError> {
    let request_line = format!("{} {} {}", method, path, HTTP_VERSION);
    if request_line.len() > max_line_length {
        return Err(WriteError::LineTooLong(max_line_length));
    }

    let count = headers.count()?;
    let mut lines = Vec::with_capacity(count + 4);
    lines.push(Bytes::from(format!("{request_line}\r\n")));
    lines.push(Bytes::from(format!("Host: {host}\r\n")));

    for index in 0..count {
        let (name, value) = headers.get(index)?;
        validate_name(name)?;
        validate_value(name, value)?;
        lines.push(Bytes::from(format!("{name}: {value}\r\n")));
    }

    if let Some(len) = content_length {
        lines.push(Bytes::from(format!("Content-Length: {len}\r\n")));
    }

    lines.push(Bytes::from_static(b"\r\n"));
    Ok(lines)
}

/// Hands out request head lines one send at a time.
pub struct RequestWriter {
    lines: Vec<Bytes>,
    written: usize,
}

impl RequestWriter {
    pub fn new(lines: Vec<Bytes>) -> Self {
        Self { lines, written: 0 }
    }

    /// Next line awaiting transmission.
    pub fn pending(&self) -> Option<&Bytes> {
        self.lines.get(self.written)
    }

    /// Marks the pending line as sent.
    pub fn advance(&mut self) {
        if self.written < self.lines.len() {
            self.written += 1;
        }
    }

    /// The whole head as one buffer.
    pub fn serialize(&self) -> Vec<u8> {
        self.lines.iter().flat_map(|l| l.iter().copied()).collect()
    }
}
