//! TCP listener and per-connection dispatch.
//!
//! This module owns the networking half of the server:
//! - accepting TCP connections,
//! - feeding raw reads into the request parser,
//! - handing the parsed request and a stream-bound [`ResponseWriter`] to the
//!   application [`Handler`].
//!
//! HTTP semantics live in [`http`](crate::http); nothing here inspects what
//! the handler writes beyond surfacing I/O errors.
//!
//! The accept loop runs on its own task and never blocks on request
//! processing; every accepted connection is parsed and handled on a task of
//! its own, and one connection's failure never reaches another. Connections
//! share nothing mutable. The only cross-task state is the shutdown channel
//! created in [`serve`], which lets a deliberate [`ServerHandle::close`] be
//! told apart from an accept failure.
//!
//! One connection carries exactly one exchange: request in, response out,
//! close. Keep-alive is out of scope.

use crate::config::ServerConfig;
use crate::http::parser::{ParseError, RequestParser};
use crate::http::request::Request;
use crate::http::response::{ResponseWriter, WriteError, default_headers};
use async_std::channel::{self, Receiver, Sender};
use async_std::io::Write;
use async_std::net::{TcpListener, TcpStream};
use async_std::prelude::*;
use async_std::task::{self, JoinHandle};
use futures_util::future::{self, Either};
use futures_util::pin_mut;
use log::{debug, error, info, warn};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;

/// Application side of a connection. The handler receives the parsed request
/// and a writer bound to the connection, and is solely responsible for
/// driving the writer through a legal state sequence.
///
/// The sink parameter exists so handler logic can be exercised against an
/// in-memory sink; the server always instantiates it with [`TcpStream`].
pub trait Handler<W: Write + Unpin + Send = TcpStream>: Send + Sync + 'static {
    fn handle(
        &self,
        writer: &mut ResponseWriter<W>,
        request: Request,
    ) -> impl Future<Output = ()> + Send;
}

/// Errors that interrupt reading one request off a connection.
#[derive(Debug, Error)]
enum ReadError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The peer closed after a completed exchange was already delivered.
    #[error("connection closed")]
    Closed,
}

/// Binds the configured address and starts the accept loop on its own task.
///
/// The returned handle is the only way to reach the running server: it
/// exposes the bound address and carries the shutdown signal.
pub async fn serve<H: Handler>(config: &ServerConfig, handler: H) -> io::Result<ServerHandle> {
    let listener = TcpListener::bind((config.address, config.port)).await?;
    let addr = listener.local_addr()?;
    let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(1);
    let buffer_size = config.buffer_size;

    let task = task::spawn(accept_loop(
        listener,
        Arc::new(handler),
        shutdown_rx,
        buffer_size,
    ));
    info!("listening on {addr}");

    Ok(ServerHandle {
        addr,
        shutdown: shutdown_tx,
        task,
    })
}

pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Sender<()>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// The address the listener is bound to. Useful with port 0.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Delivers the shutdown signal and waits for the accept loop to exit.
    /// Connections already being handled run to completion on their own
    /// tasks.
    pub async fn close(self) {
        let _ = self.shutdown.send(()).await;
        self.task.await;
    }

    /// Parks the caller until the accept loop exits.
    pub async fn wait(self) {
        self.task.await;
    }
}

async fn accept_loop<H: Handler>(
    listener: TcpListener,
    handler: Arc<H>,
    shutdown: Receiver<()>,
    buffer_size: usize,
) {
    loop {
        let accept = listener.accept();
        let stop = shutdown.recv();
        pin_mut!(accept, stop);

        match future::select(accept, stop).await {
            Either::Left((Ok((stream, _peer)), _)) => {
                let handler = Arc::clone(&handler);
                task::spawn(handle_connection(stream, handler, buffer_size));
            }
            Either::Left((Err(err), _)) => {
                error!("accept failed: {err}");
                break;
            }
            Either::Right(_) => {
                info!("listener shutting down");
                break;
            }
        }
    }
    // Dropping the listener closes the socket.
}

async fn handle_connection<H: Handler>(mut stream: TcpStream, handler: Arc<H>, buffer_size: usize) {
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "<unknown>".to_string());

    match read_request(&mut stream, buffer_size).await {
        Ok(request) => {
            debug!(
                "{peer}: {} {}",
                request.request_line.method, request.request_line.target
            );
            let mut writer = ResponseWriter::new(stream);
            handler.handle(&mut writer, request).await;
        }
        Err(ReadError::Parse(err)) => {
            warn!("{peer}: bad request: {err}");
            let mut writer = ResponseWriter::new(stream);
            if let Err(write_err) = reject(&mut writer, &err).await {
                debug!("{peer}: error reply not delivered: {write_err}");
            }
        }
        Err(ReadError::Closed) => debug!("{peer}: connection closed"),
        Err(ReadError::Io(err)) => warn!("{peer}: i/o error while reading request: {err}"),
    }
    // The stream drops here, which closes the connection.
}

/// Reads and incrementally parses one request. Each socket read is fed to
/// the parser as-is; the parser tolerates any fragmentation.
async fn read_request(stream: &mut TcpStream, buffer_size: usize) -> Result<Request, ReadError> {
    let mut parser = RequestParser::new();
    let mut buf = vec![0u8; buffer_size];

    loop {
        let n = match stream.read(&mut buf).await {
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(ReadError::Io(err)),
        };
        if n == 0 {
            // A request completing exactly at EOF has already been returned,
            // so a clean EOF here means the peer sent nothing further.
            return match parser.eof() {
                Ok(()) => Err(ReadError::Closed),
                Err(err) => Err(ReadError::Parse(err)),
            };
        }
        if let Some(request) = parser.feed(&buf[..n])? {
            return Ok(request);
        }
    }
}

/// 400-class reply for a request that failed to parse. The connection is
/// closed afterwards; the parser never resynchronizes mid-stream.
async fn reject(writer: &mut ResponseWriter<TcpStream>, err: &ParseError) -> Result<(), WriteError> {
    let body = err.to_string().into_bytes();
    writer.write_status_line(err.status()).await?;
    writer.write_headers(&default_headers(body.len())).await?;
    writer.write_body(&body).await?;
    Ok(())
}
