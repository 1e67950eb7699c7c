use compact_http::http::headers::{HeaderCollection, HeaderList};
use compact_http::http::request::{Method, RequestBuilder, is_valid_path};
use compact_http::http::writer::{RequestWriter, WriteError, serialize_request_head};

#[test]
fn test_method_from_str() {
    assert_eq!(Method::from_str("GET"), Some(Method::GET));
    assert_eq!(Method::from_str("POST"), Some(Method::POST));
    assert_eq!(Method::from_str("PUT"), Some(Method::PUT));
    assert_eq!(Method::from_str("DELETE"), Some(Method::DELETE));
    assert_eq!(Method::from_str("PATCH"), Some(Method::PATCH));
    assert_eq!(Method::from_str("HEAD"), Some(Method::HEAD));
}

#[test]
fn test_method_from_str_rejects_others() {
    assert_eq!(Method::from_str("OPTIONS"), None);
    assert_eq!(Method::from_str("get"), None);
    assert_eq!(Method::from_str(""), None);
}

#[test]
fn test_method_display_round_trips() {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::PATCH,
        Method::HEAD,
    ];
    for method in methods {
        assert_eq!(Method::from_str(&method.to_string()), Some(method));
    }
}

#[test]
fn test_only_head_skips_response_body() {
    assert!(!Method::HEAD.expects_response_body());
    assert!(Method::GET.expects_response_body());
    assert!(Method::DELETE.expects_response_body());
}

#[test]
fn test_request_builder() {
    let request = RequestBuilder::new()
        .method(Method::POST)
        .path("/devices/d1/messages/events")
        .header("Content-Type", "application/json")
        .body(b"{}".to_vec())
        .build()
        .unwrap();

    assert_eq!(request.method, Method::POST);
    assert_eq!(request.path, "/devices/d1/messages/events");
    assert_eq!(request.headers.value("content-type"), Some("application/json"));
    assert_eq!(request.body, b"{}");

    let parts = request.parts();
    assert_eq!(parts.body(), Some(&b"{}"[..]));
    assert_eq!(parts.headers.count(), Ok(1));
}

#[test]
fn test_request_builder_missing_fields() {
    assert!(RequestBuilder::new().path("/").build().is_err());
    assert!(RequestBuilder::new().method(Method::GET).build().is_err());
}

#[test]
fn test_request_builder_invalid_header() {
    let result = RequestBuilder::new()
        .method(Method::GET)
        .path("/")
        .header("Bad Name", "v")
        .build();
    assert!(result.is_err());
}

#[test]
fn test_request_builder_rejects_header_injection() {
    let result = RequestBuilder::new()
        .method(Method::GET)
        .path("/")
        .header("X-Device", "d1\r\nAuthorization: forged")
        .build();
    assert!(matches!(result, Err("invalid header")));
}

#[test]
fn test_empty_body_is_no_body() {
    let request = RequestBuilder::new().method(Method::GET).path("/").build().unwrap();
    assert_eq!(request.parts().body(), None);
}

#[test]
fn test_path_validation() {
    assert!(is_valid_path("/"));
    assert!(is_valid_path("/search?q=rust&api-version=2020-09-30"));
    assert!(!is_valid_path(""));
    assert!(!is_valid_path("/a b"));
    assert!(!is_valid_path("/a\tb"));
    assert!(!is_valid_path("/a\r\n"));
}

#[test]
fn test_serialize_get_head() {
    let headers = HeaderList::new();
    let lines =
        serialize_request_head(Method::GET, "/", "example.test", &headers, None, 1024).unwrap();
    let writer = RequestWriter::new(lines);

    assert_eq!(writer.serialize(), b"GET / HTTP/1.1\r\nHost: example.test\r\n\r\n");
}

#[test]
fn test_serialize_one_line_per_header() {
    let mut headers = HeaderList::new();
    headers.add("Accept", "*/*").unwrap();
    headers.add("User-Agent", "compact-http").unwrap();

    let lines =
        serialize_request_head(Method::DELETE, "/x", "h:81", &headers, Some(0), 1024).unwrap();

    assert_eq!(lines.len(), 6);
    assert_eq!(&lines[2][..], b"Accept: */*\r\n");
    assert_eq!(&lines[3][..], b"User-Agent: compact-http\r\n");
    assert_eq!(&lines[4][..], b"Content-Length: 0\r\n");
}

#[test]
fn test_serialize_request_line_limit() {
    let headers = HeaderList::new();
    // "GET " + path + " HTTP/1.1" is exactly the limit
    let path = format!("/{}", "a".repeat(1024 - 14));
    assert!(serialize_request_head(Method::GET, &path, "h", &headers, None, 1024).is_ok());

    let path = format!("{path}a");
    assert!(matches!(
        serialize_request_head(Method::GET, &path, "h", &headers, None, 1024),
        Err(WriteError::LineTooLong(1024))
    ));
}
