//! Line-level parsing of HTTP/1.1 response heads.
//!
//! Every function works on an immutable byte window and never allocates for
//! incomplete input; callers consume what was parsed from their own buffer.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No complete line yet.
    Incomplete,
    /// A line exceeded the configured maximum.
    LineTooLong,
    InvalidStatusLine,
    InvalidStatusCode,
    InvalidHeader,
    InvalidContentLength,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub version: String,
    pub code: u16,
    pub reason: String,
}

/// Finds the first CRLF-terminated line in `buf`.
///
/// Returns the line without its terminator and the number of bytes to consume.
pub fn next_line(buf: &[u8], max_len: usize) -> Result<(&[u8], usize), ParseError> {
    match buf.windows(2).position(|w| w == b"\r\n") {
        Some(end) if end > max_len => Err(ParseError::LineTooLong),
        Some(end) => Ok((&buf[..end], end + 2)),
        // max_len bytes plus a lone '\r' can still turn into a legal line
        None if buf.len() > max_len + 1 => Err(ParseError::LineTooLong),
        None => Err(ParseError::Incomplete),
    }
}

/// Parses `HTTP/<major>.<minor> <code> <reason>`.
pub fn parse_status_line(line: &[u8]) -> Result<StatusLine, ParseError> {
    let line = std::str::from_utf8(line).map_err(|_| ParseError::InvalidStatusLine)?;

    let (version, rest) = line.split_once(' ').ok_or(ParseError::InvalidStatusLine)?;
    let (code, reason) = rest.split_once(' ').ok_or(ParseError::InvalidStatusLine)?;

    let numbers = version
        .strip_prefix("HTTP/")
        .ok_or(ParseError::InvalidStatusLine)?;
    let (major, minor) = numbers.split_once('.').ok_or(ParseError::InvalidStatusLine)?;
    if !is_digits(major) || !is_digits(minor) {
        return Err(ParseError::InvalidStatusLine);
    }

    if !is_digits(code) {
        return Err(ParseError::InvalidStatusCode);
    }
    let code = code.parse::<u16>().map_err(|_| ParseError::InvalidStatusCode)?;

    Ok(StatusLine {
        version: version.to_string(),
        code,
        reason: reason.to_string(),
    })
}

/// Parses `name: value`, trimming whitespace around both.
pub fn parse_header_line(line: &[u8]) -> Result<(&str, &str), ParseError> {
    let line = std::str::from_utf8(line).map_err(|_| ParseError::InvalidHeader)?;
    let (name, value) = line.split_once(':').ok_or(ParseError::InvalidHeader)?;

    let name = name.trim();
    if name.is_empty() {
        return Err(ParseError::InvalidHeader);
    }
    Ok((name, value.trim()))
}

pub fn parse_content_length(value: &str) -> Result<usize, ParseError> {
    if !is_digits(value) {
        return Err(ParseError::InvalidContentLength);
    }
    value.parse().map_err(|_| ParseError::InvalidContentLength)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
