//! HTTP/1.1 wire format for the client side.
//!
//! # Architecture
//!
//! - **`headers`**: The header collection capability and its `HeaderList` implementation
//! - **`request`**: Methods, owned requests and the borrowed view the engine executes
//! - **`writer`**: Serializes a request head into one buffer per line
//! - **`parser`**: Line-level parsing of status lines and header lines
//! - **`response`**: Incremental response-head parser and the owned `Response`
//!
//! # Response Head
//!
//! The head parser consumes one line per step:
//!
//! ```text
//!        ┌─────────────┐
//!        │ StatusLine  │ ← "HTTP/1.1 200 OK"
//!        └──────┬──────┘
//!               │ status code reported
//!               ▼
//!        ┌──────────────────┐
//!        │     Headers      │ ← "name: value", reported in wire order
//!        └──────┬───────────┘
//!               │ blank line
//!               ▼
//!        ┌──────────────────┐
//!        │       Done       │ ← Content-Length decides the body size
//!        └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use compact_http::http::response::{HeadEvent, HeadParser};
//!
//! let mut parser = HeadParser::new(1024);
//! let buf = b"HTTP/1.1 204 No Content\r\n\r\n";
//! let (event, used) = parser.advance(buf).unwrap();
//! assert_eq!(event, HeadEvent::Status(204));
//! let (event, _) = parser.advance(&buf[used..]).unwrap();
//! assert_eq!(event, HeadEvent::End);
//! ```

pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
