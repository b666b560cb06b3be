//! HTTP/1.1 served directly on top of TCP sockets.
//!
//! No pre-built HTTP stack: [`http::parser`] reconstructs requests from an
//! arbitrarily fragmented byte stream, [`http::response`] enforces the wire
//! order of status line, headers, body and trailers, and [`net::server`]
//! accepts connections and dispatches each to a [`net::server::Handler`] on
//! its own task. One connection, one exchange, then close.

pub mod config;
pub mod handler;
pub mod http;
pub mod net;
