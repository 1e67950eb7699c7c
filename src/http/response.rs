use crate::http::headers::HeaderList;
use crate::http::parser::{
    ParseError, next_line, parse_content_length, parse_header_line, parse_status_line,
};

/// A complete response as returned by [`crate::client::Connection::fetch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: HeaderList,
    pub body: Vec<u8>,
}

impl Response {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.value(name)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One step of progress through a response head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadEvent {
    Status(u16),
    Header(String, String),
    /// The blank line closing the header block was consumed.
    End,
    NeedMore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeadState {
    StatusLine,
    Headers,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentLength {
    Absent,
    Valid(usize),
    Invalid,
}

/// Incremental parser for a status line followed by a header block.
///
/// Each call to [`HeadParser::advance`] looks at the unparsed bytes, reports
/// at most one event and the number of bytes it consumed.
#[derive(Debug)]
pub struct HeadParser {
    state: HeadState,
    max_line_length: usize,
    content_length: ContentLength,
}

impl HeadParser {
    pub fn new(max_line_length: usize) -> Self {
        Self {
            state: HeadState::StatusLine,
            max_line_length,
            content_length: ContentLength::Absent,
        }
    }

    pub fn advance(&mut self, buf: &[u8]) -> Result<(HeadEvent, usize), ParseError> {
        if self.state == HeadState::Done {
            return Ok((HeadEvent::End, 0));
        }

        let (line, consumed) = match next_line(buf, self.max_line_length) {
            Ok(found) => found,
            Err(ParseError::Incomplete) => return Ok((HeadEvent::NeedMore, 0)),
            Err(e) => return Err(e),
        };

        match self.state {
            HeadState::StatusLine => {
                let status = parse_status_line(line)?;
                self.state = HeadState::Headers;
                Ok((HeadEvent::Status(status.code), consumed))
            }
            HeadState::Headers if line.is_empty() => {
                self.state = HeadState::Done;
                Ok((HeadEvent::End, consumed))
            }
            HeadState::Headers => {
                let (name, value) = parse_header_line(line)?;
                if name.eq_ignore_ascii_case("content-length") {
                    self.content_length = match parse_content_length(value) {
                        Ok(n) => ContentLength::Valid(n),
                        Err(_) => ContentLength::Invalid,
                    };
                }
                Ok((HeadEvent::Header(name.to_string(), value.to_string()), consumed))
            }
            HeadState::Done => Ok((HeadEvent::End, 0)),
        }
    }

    /// Body length announced by the head; zero when no `Content-Length` was
    /// seen.
    pub fn content_length(&self) -> Result<usize, ParseError> {
        match self.content_length {
            ContentLength::Absent => Ok(0),
            ContentLength::Valid(n) => Ok(n),
            ContentLength::Invalid => Err(ParseError::InvalidContentLength),
        }
    }
}
