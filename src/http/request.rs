use crate::http::headers::HeaderMap;

/// First line of an HTTP request. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    /// Uppercase ASCII token, e.g. `GET`. Kept as a string because the wire
    /// contract constrains the characters, not the set of methods.
    pub method: String,
    /// Opaque path, query included.
    pub target: String,
    /// Always `"1.1"`; anything else is rejected by the parser.
    pub version: String,
}

/// One fully parsed request. Owned by a single connection task for the
/// lifetime of one request/response exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub request_line: RequestLine,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}
