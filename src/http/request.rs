use std::fmt;

use crate::http::headers::{HeaderCollection, HeaderList};

/// Request methods the engine can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// PATCH - Partial modification of a resource
    PATCH,
    /// HEAD - Like GET but the response carries no body
    HEAD,
}

impl Method {
    /// Parses a method token.
    ///
    /// # Example
    ///
    /// ```
    /// # use compact_http::http::request::Method;
    /// assert_eq!(Method::from_str("PATCH"), Some(Method::PATCH));
    /// assert_eq!(Method::from_str("get"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "PATCH" => Some(Method::PATCH),
            "HEAD" => Some(Method::HEAD),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::PATCH => "PATCH",
            Method::HEAD => "HEAD",
        }
    }

    /// Whether a response to this method is followed by a body.
    pub fn expects_response_body(&self) -> bool {
        !matches!(self, Method::HEAD)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Borrowed view of one request, as handed to the executor.
#[derive(Clone, Copy)]
pub struct RequestParts<'a> {
    pub method: Method,
    pub path: &'a str,
    pub headers: &'a dyn HeaderCollection,
    pub body: Option<&'a [u8]>,
}

impl<'a> RequestParts<'a> {
    /// Body bytes to transmit; an empty body counts as none.
    pub fn body(&self) -> Option<&'a [u8]> {
        self.body.filter(|b| !b.is_empty())
    }
}

/// An owned request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Path relative to the connection's host, e.g. "/devices?api-version=1"
    pub path: String,
    pub headers: HeaderList,
    pub body: Vec<u8>,
}

impl Request {
    pub fn parts(&self) -> RequestParts<'_> {
        RequestParts {
            method: self.method,
            path: &self.path,
            headers: &self.headers,
            body: Some(&self.body),
        }
    }
}

/// Builder for constructing Request objects.
#[derive(Default)]
pub struct RequestBuilder {
    method: Option<Method>,
    path: Option<String>,
    headers: HeaderList,
    body: Vec<u8>,
    invalid_header: bool,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        if self.headers.add(key, value).is_err() {
            self.invalid_header = true;
        }
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        if self.invalid_header {
            return Err("invalid header");
        }
        Ok(Request {
            method: self.method.ok_or("method missing")?,
            path: self.path.ok_or("path missing")?,
            headers: self.headers,
            body: self.body,
        })
    }
}

/// Checks a request path: non-empty, no whitespace or control bytes.
pub fn is_valid_path(path: &str) -> bool {
    !path.is_empty() && !path.bytes().any(|b| b <= b' ' || b == 0x7f)
}
