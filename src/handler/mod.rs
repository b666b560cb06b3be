//! Demo application handler.
//!
//! Routes a handful of targets to exercise every response path: canned HTML
//! pages, fixed-length file responses, and chunked file streaming with
//! trailers. Anything the server itself needs lives in [`net`](crate::net)
//! and [`http`](crate::http); this module is replaceable glue.

mod responses;
mod router;
mod static_files;
mod stream;

use crate::config::ServerConfig;
use crate::http::request::Request;
use crate::http::response::ResponseWriter;
use crate::net::server::Handler;
use async_std::io::Write;
use log::error;

pub struct AppHandler {
    server_name: String,
    static_root: String,
}

impl AppHandler {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            server_name: config.server_name.clone(),
            static_root: config.static_root.clone(),
        }
    }
}

impl<W: Write + Unpin + Send> Handler<W> for AppHandler {
    async fn handle(&self, writer: &mut ResponseWriter<W>, request: Request) {
        if let Err(err) = router::route(self, writer, &request).await {
            error!(
                "handler failed for {}: {err}",
                request.request_line.target
            );
        }
    }
}
