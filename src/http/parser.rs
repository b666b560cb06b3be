//! Incremental HTTP/1.1 request parser.
//!
//! TCP delivers bytes with no message boundaries: a single read may contain
//! less than one line, several lines, or a fragment that stops in the middle
//! of a CRLF. [`RequestParser`] therefore accumulates unconsumed bytes in one
//! growable buffer and advances a RequestLine → Headers → Body → Done state
//! machine as far as the buffered bytes allow. Each state drains exactly the
//! bytes belonging to its element, leaving any remainder for the next state,
//! so nothing is ever re-scanned and reads that straddle delimiters are fine.
//!
//! Parse errors are permanent: a parser that returned an error must be
//! discarded along with its connection.

use crate::http::headers::HeaderMap;
use crate::http::request::{Request, RequestLine};
use crate::http::status::StatusCode;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed request line: {0}")]
    InvalidRequestLine(String),

    #[error("unsupported http version: {0}")]
    UnsupportedVersion(String),

    #[error("malformed header line: {0}")]
    InvalidHeader(String),

    #[error("invalid content-length: {0}")]
    InvalidContentLength(String),

    #[error("connection closed before the request was complete")]
    UnexpectedEof,
}

impl ParseError {
    /// Status-code hint for the error reply. Every parse failure is the
    /// client's fault, so they all land in the 400 class.
    pub fn status(&self) -> StatusCode {
        StatusCode::BadRequest
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    RequestLine,
    Headers,
    Body,
    Done,
}

pub struct RequestParser {
    buf: Vec<u8>,
    state: ParserState,
    request_line: Option<RequestLine>,
    headers: HeaderMap,
    body: Vec<u8>,
    content_length: usize,
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestParser {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            state: ParserState::RequestLine,
            request_line: None,
            headers: HeaderMap::new(),
            body: Vec::new(),
            content_length: 0,
        }
    }

    /// Appends one read's worth of bytes and advances as far as possible.
    ///
    /// Returns `Ok(Some(request))` once the request is complete, `Ok(None)`
    /// while more input is needed. A finished parser ignores further input;
    /// bytes past the end of the request (a pipelined follow-up) stay
    /// unconsumed.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Option<Request>, ParseError> {
        self.buf.extend_from_slice(chunk);
        loop {
            let progressed = match self.state {
                ParserState::RequestLine => self.parse_request_line()?,
                ParserState::Headers => self.parse_header_line()?,
                ParserState::Body => self.consume_body(),
                ParserState::Done => return Ok(self.take_request()),
            };
            if !progressed {
                return Ok(None);
            }
        }
    }

    /// Classifies end-of-stream. Clean only when the request already
    /// completed; anywhere else the peer cut the request short.
    pub fn eof(&self) -> Result<(), ParseError> {
        match self.state {
            ParserState::Done => Ok(()),
            _ => Err(ParseError::UnexpectedEof),
        }
    }

    fn take_request(&mut self) -> Option<Request> {
        let request_line = self.request_line.take()?;
        Some(Request {
            request_line,
            headers: std::mem::take(&mut self.headers),
            body: std::mem::take(&mut self.body),
        })
    }

    fn parse_request_line(&mut self) -> Result<bool, ParseError> {
        let Some(end) = find_crlf(&self.buf) else {
            return Ok(false);
        };
        let line = std::str::from_utf8(&self.buf[..end])
            .map_err(|_| ParseError::InvalidRequestLine("not valid utf-8".into()))?;

        let parts: Vec<&str> = line.split(' ').collect();
        let &[method, target, version] = parts.as_slice() else {
            return Err(ParseError::InvalidRequestLine(line.to_string()));
        };

        if method.is_empty() || !method.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(ParseError::InvalidRequestLine(format!(
                "bad method {method:?}"
            )));
        }
        if target.is_empty() {
            return Err(ParseError::InvalidRequestLine(line.to_string()));
        }
        let Some(version) = version.strip_prefix("HTTP/") else {
            return Err(ParseError::InvalidRequestLine(line.to_string()));
        };
        if version != "1.1" {
            return Err(ParseError::UnsupportedVersion(version.to_string()));
        }

        self.request_line = Some(RequestLine {
            method: method.to_string(),
            target: target.to_string(),
            version: version.to_string(),
        });
        self.buf.drain(..end + 2);
        self.state = ParserState::Headers;
        Ok(true)
    }

    fn parse_header_line(&mut self) -> Result<bool, ParseError> {
        let Some(end) = find_crlf(&self.buf) else {
            return Ok(false);
        };
        if end == 0 {
            // Bare CRLF: the header block is over.
            self.buf.drain(..2);
            self.begin_body()?;
            return Ok(true);
        }

        let line = std::str::from_utf8(&self.buf[..end])
            .map_err(|_| ParseError::InvalidHeader("not valid utf-8".into()))?;
        let Some((raw_name, raw_value)) = line.split_once(':') else {
            return Err(ParseError::InvalidHeader(line.to_string()));
        };
        if raw_name.ends_with([' ', '\t']) {
            // Whitespace between the field name and the colon is a request
            // smuggling vector; reject rather than trim.
            return Err(ParseError::InvalidHeader(line.to_string()));
        }
        let name = raw_name.trim();
        if name.is_empty() {
            return Err(ParseError::InvalidHeader(line.to_string()));
        }
        // Repeated fields concatenate into one comma-separated value.
        self.headers.append(name, raw_value.trim());

        self.buf.drain(..end + 2);
        Ok(true)
    }

    fn begin_body(&mut self) -> Result<(), ParseError> {
        match self.headers.get("content-length") {
            Some(raw) => {
                // usize rejects a sign, so negative lengths fail here too.
                let length = raw
                    .parse::<usize>()
                    .map_err(|_| ParseError::InvalidContentLength(raw.to_string()))?;
                self.content_length = length;
                self.state = if length == 0 {
                    ParserState::Done
                } else {
                    ParserState::Body
                };
            }
            None => self.state = ParserState::Done,
        }
        Ok(())
    }

    fn consume_body(&mut self) -> bool {
        let missing = self.content_length - self.body.len();
        let take = missing.min(self.buf.len());
        self.body.extend_from_slice(&self.buf[..take]);
        self.buf.drain(..take);

        if self.body.len() == self.content_length {
            self.state = ParserState::Done;
            true
        } else {
            false
        }
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(input: &[u8]) -> Result<Option<Request>, ParseError> {
        RequestParser::new().feed(input)
    }

    #[test]
    fn parses_request_without_body() {
        let req = parse_all(b"GET /foo HTTP/1.1\r\nHost: x\r\n\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(req.request_line.method, "GET");
        assert_eq!(req.request_line.target, "/foo");
        assert_eq!(req.request_line.version, "1.1");
        assert_eq!(req.headers.get("host"), Some("x"));
        assert!(req.body.is_empty());
    }

    #[test]
    fn request_line_split_across_reads_matches_single_read() {
        let mut parser = RequestParser::new();
        assert_eq!(parser.feed(b"GET /f").unwrap(), None);
        let split = parser
            .feed(b"oo HTTP/1.1\r\nHost: x\r\n\r\n")
            .unwrap()
            .unwrap();
        let whole = parse_all(b"GET /foo HTTP/1.1\r\nHost: x\r\n\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(split, whole);
    }

    #[test]
    fn parsing_is_read_granularity_invariant() {
        let input: &[u8] =
            b"POST /submit?q=1 HTTP/1.1\r\nHost: a.example\r\nContent-Length: 11\r\n\r\nhello world";
        let whole = parse_all(input).unwrap().unwrap();

        for chunk_size in [1, 2, 3, 5, 7, input.len()] {
            let mut parser = RequestParser::new();
            let mut result = None;
            for chunk in input.chunks(chunk_size) {
                if let Some(req) = parser.feed(chunk).unwrap() {
                    result = Some(req);
                }
            }
            assert_eq!(result.as_ref(), Some(&whole), "chunk size {chunk_size}");
        }
    }

    #[test]
    fn body_read_stops_at_content_length() {
        let mut parser = RequestParser::new();
        let req = parser
            .feed(b"POST /a HTTP/1.1\r\nContent-Length: 5\r\n\r\nhelloEXTRA")
            .unwrap()
            .unwrap();
        assert_eq!(req.body, b"hello");
        // Pipelined leftovers are ignored, not folded into the request.
        assert_eq!(parser.feed(b"more").unwrap(), None);
    }

    #[test]
    fn body_arrives_across_several_reads() {
        let mut parser = RequestParser::new();
        assert_eq!(
            parser
                .feed(b"POST /a HTTP/1.1\r\nContent-Length: 6\r\n\r\nab")
                .unwrap(),
            None
        );
        assert_eq!(parser.feed(b"cd").unwrap(), None);
        let req = parser.feed(b"ef").unwrap().unwrap();
        assert_eq!(req.body, b"abcdef");
    }

    #[test]
    fn content_length_zero_completes_at_headers_end() {
        let req = parse_all(b"POST /a HTTP/1.1\r\nContent-Length: 0\r\n\r\n")
            .unwrap()
            .unwrap();
        assert!(req.body.is_empty());
    }

    #[test]
    fn repeated_headers_concatenate() {
        let req = parse_all(b"GET / HTTP/1.1\r\nAccept: a\r\nAccept: b\r\n\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(req.headers.get("accept"), Some("a, b"));
    }

    #[test]
    fn header_names_and_values_are_trimmed() {
        let req = parse_all(b"GET / HTTP/1.1\r\nHost:   spaced.example  \r\n\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(req.headers.get("host"), Some("spaced.example"));
    }

    #[test]
    fn rejects_lowercase_method() {
        assert!(matches!(
            parse_all(b"get / HTTP/1.1\r\n\r\n"),
            Err(ParseError::InvalidRequestLine(_))
        ));
    }

    #[test]
    fn rejects_wrong_token_count() {
        assert!(parse_all(b"GET /\r\n\r\n").is_err());
        assert!(parse_all(b"GET  / HTTP/1.1\r\n\r\n").is_err());
        assert!(parse_all(b"GET / HTTP/1.1 extra\r\n\r\n").is_err());
    }

    #[test]
    fn rejects_unsupported_version() {
        assert!(matches!(
            parse_all(b"GET / HTTP/1.0\r\n\r\n"),
            Err(ParseError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            parse_all(b"GET / SPDY/1.1\r\n\r\n"),
            Err(ParseError::InvalidRequestLine(_))
        ));
    }

    #[test]
    fn rejects_header_without_colon() {
        assert!(matches!(
            parse_all(b"GET / HTTP/1.1\r\nno-colon-here\r\n\r\n"),
            Err(ParseError::InvalidHeader(_))
        ));
    }

    #[test]
    fn rejects_whitespace_before_colon() {
        assert!(matches!(
            parse_all(b"GET / HTTP/1.1\r\nHost : x\r\n\r\n"),
            Err(ParseError::InvalidHeader(_))
        ));
    }

    #[test]
    fn rejects_empty_header_name() {
        assert!(matches!(
            parse_all(b"GET / HTTP/1.1\r\n: value\r\n\r\n"),
            Err(ParseError::InvalidHeader(_))
        ));
    }

    #[test]
    fn rejects_bad_content_length() {
        assert!(matches!(
            parse_all(b"POST / HTTP/1.1\r\nContent-Length: -5\r\n\r\n"),
            Err(ParseError::InvalidContentLength(_))
        ));
        assert!(matches!(
            parse_all(b"POST / HTTP/1.1\r\nContent-Length: five\r\n\r\n"),
            Err(ParseError::InvalidContentLength(_))
        ));
    }

    #[test]
    fn eof_mid_request_line_is_permanent_failure() {
        let mut parser = RequestParser::new();
        assert_eq!(parser.feed(b"GET /x HTTP/1").unwrap(), None);
        assert_eq!(parser.eof(), Err(ParseError::UnexpectedEof));
    }

    #[test]
    fn eof_mid_headers_is_permanent_failure() {
        let mut parser = RequestParser::new();
        assert_eq!(parser.feed(b"GET /x HTTP/1.1\r\nHost: x\r\n").unwrap(), None);
        assert_eq!(parser.eof(), Err(ParseError::UnexpectedEof));
    }

    #[test]
    fn eof_mid_body_is_permanent_failure() {
        let mut parser = RequestParser::new();
        parser
            .feed(b"POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc")
            .unwrap();
        assert_eq!(parser.eof(), Err(ParseError::UnexpectedEof));
    }

    #[test]
    fn eof_at_natural_completion_is_clean() {
        let mut parser = RequestParser::new();
        let req = parser.feed(b"GET / HTTP/1.1\r\n\r\n").unwrap();
        assert!(req.is_some());
        assert_eq!(parser.eof(), Ok(()));
    }

    #[test]
    fn parse_errors_hint_the_400_class() {
        let err = parse_all(b"broken\r\n\r\n").unwrap_err();
        assert_eq!(err.status(), StatusCode::BadRequest);
    }
}
