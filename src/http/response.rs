//! Response serialization with enforced wire order.
//!
//! [`ResponseWriter`] wraps a byte sink and only permits the protocol-legal
//! next operation: status line, then headers, then a body (fixed-length or
//! chunked), then, only after a chunked body has been terminated, at most
//! one set of trailers. Calling an operation out of order fails with
//! [`WriteError::OutOfOrder`] before a single byte reaches the sink; that is
//! a caller bug, not an I/O condition.
//!
//! The writer is owned by the single task handling one connection, so no
//! synchronization is involved: ownership is the lock.

use crate::http::headers::HeaderMap;
use crate::http::status::StatusCode;
use async_std::io::Write;
use async_std::prelude::*;
use std::time::SystemTime;
use thiserror::Error;

/// The operation the writer will accept next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    StatusLine,
    Headers,
    Body,
    /// A chunked body was terminated; one trailer block may follow.
    Trailers,
    Done,
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("{op} is not legal while the writer expects {state:?}")]
    OutOfOrder {
        op: &'static str,
        state: WriterState,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub struct ResponseWriter<W> {
    sink: W,
    state: WriterState,
}

impl<W: Write + Unpin> ResponseWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            state: WriterState::StatusLine,
        }
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    fn expect(&self, wanted: WriterState, op: &'static str) -> Result<(), WriteError> {
        if self.state == wanted {
            Ok(())
        } else {
            Err(WriteError::OutOfOrder {
                op,
                state: self.state,
            })
        }
    }

    /// Emits `HTTP/1.1 <code> <reason>\r\n`.
    ///
    /// Codes without a canonical reason phrase degrade to an empty status
    /// line (nothing is written) and the exchange carries on with headers.
    pub async fn write_status_line(&mut self, status: StatusCode) -> Result<(), WriteError> {
        self.expect(WriterState::StatusLine, "write_status_line")?;
        if let Some(reason) = status.reason() {
            let line = format!("HTTP/1.1 {} {}\r\n", status.code(), reason);
            self.sink.write_all(line.as_bytes()).await?;
        }
        self.state = WriterState::Headers;
        Ok(())
    }

    /// Serializes every field in iteration order, then the blank line that
    /// ends the header block.
    pub async fn write_headers(&mut self, headers: &HeaderMap) -> Result<(), WriteError> {
        self.expect(WriterState::Headers, "write_headers")?;
        self.sink
            .write_all(serialize_fields(headers).as_bytes())
            .await?;
        self.state = WriterState::Body;
        Ok(())
    }

    /// Writes a fixed-length body in one call. The caller is responsible for
    /// having set a matching `content-length` header; no consistency check
    /// is made here.
    pub async fn write_body(&mut self, body: &[u8]) -> Result<(), WriteError> {
        self.expect(WriterState::Body, "write_body")?;
        self.sink.write_all(body).await?;
        self.state = WriterState::Done;
        Ok(())
    }

    /// Emits one chunk: the payload length in hex, CRLF, the payload, CRLF.
    /// May be called repeatedly; the body stays open until
    /// [`write_chunked_body_done`](Self::write_chunked_body_done).
    ///
    /// An empty slice is a no-op: a zero-length chunk would read as the
    /// body terminator.
    pub async fn write_chunked_body(&mut self, chunk: &[u8]) -> Result<(), WriteError> {
        self.expect(WriterState::Body, "write_chunked_body")?;
        if chunk.is_empty() {
            return Ok(());
        }
        let size_line = format!("{:x}\r\n", chunk.len());
        self.sink.write_all(size_line.as_bytes()).await?;
        self.sink.write_all(chunk).await?;
        self.sink.write_all(b"\r\n").await?;
        Ok(())
    }

    /// Terminates a chunked body with the literal `0\r\n` marker. After this
    /// the only legal operation is a single trailer block.
    pub async fn write_chunked_body_done(&mut self) -> Result<(), WriteError> {
        self.expect(WriterState::Body, "write_chunked_body_done")?;
        self.sink.write_all(b"0\r\n").await?;
        self.state = WriterState::Trailers;
        Ok(())
    }

    /// Serializes trailer fields exactly like headers, ending with a blank
    /// line. Legal exactly once, and only after a chunked body has been
    /// terminated; the writer is final afterwards.
    pub async fn write_trailers(&mut self, trailers: &HeaderMap) -> Result<(), WriteError> {
        self.expect(WriterState::Trailers, "write_trailers")?;
        self.sink
            .write_all(serialize_fields(trailers).as_bytes())
            .await?;
        self.state = WriterState::Done;
        Ok(())
    }
}

fn serialize_fields(map: &HeaderMap) -> String {
    let mut out = String::new();
    for (name, value) in map.iter() {
        out.push_str(name);
        out.push_str(": ");
        out.push_str(value);
        out.push_str("\r\n");
    }
    out.push_str("\r\n");
    out
}

/// Stock header set for plain responses and error replies, mirroring what a
/// minimal handler wants: a length, an explicit close, plain text, a date.
pub fn default_headers(content_len: usize) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.set("content-length", &content_len.to_string());
    headers.set("connection", "close");
    headers.set("content-type", "text/plain");
    headers.set("date", &httpdate::fmt_http_date(SystemTime::now()));
    headers
}
