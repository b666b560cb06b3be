//! Chunked file streaming with trailers.
//!
//! `/stream/<rel>` transfers a file without declaring its length up front:
//! the body goes out as chunks read-by-read, and once the terminal chunk is
//! written the trailers carry a SHA-256 of everything streamed plus the
//! total byte count, values only known after the body is done.

use super::{AppHandler, responses, static_files};
use crate::http::headers::HeaderMap;
use crate::http::response::{ResponseWriter, WriteError, default_headers};
use crate::http::status::StatusCode;
use async_std::fs::File;
use async_std::io::Write;
use async_std::prelude::*;
use log::warn;
use sha2::{Digest, Sha256};

const CHUNK_SIZE: usize = 1024;

pub async fn serve<W: Write + Unpin + Send>(
    app: &AppHandler,
    writer: &mut ResponseWriter<W>,
    rel: &str,
) -> Result<(), WriteError> {
    let Some(path) = static_files::resolve(&app.static_root, rel) else {
        return responses::page(
            writer,
            &app.server_name,
            StatusCode::BadRequest,
            responses::BAD_REQUEST_PAGE,
        )
        .await;
    };

    let mut file = match File::open(&path).await {
        Ok(file) => file,
        Err(err) => {
            warn!("failed to open {path}: {err}");
            return responses::page(
                writer,
                &app.server_name,
                StatusCode::InternalServerError,
                responses::SERVER_ERROR_PAGE,
            )
            .await;
        }
    };

    let mut headers = default_headers(0);
    headers.remove("content-length");
    headers.set("transfer-encoding", "chunked");
    headers.set("trailer", "x-content-sha256, x-content-length");
    headers.set("content-type", static_files::guess_mime(&path));
    headers.set("server", &app.server_name);

    writer.write_status_line(StatusCode::Ok).await?;
    writer.write_headers(&headers).await?;

    let mut hasher = Sha256::new();
    let mut total = 0usize;
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = match file.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) => {
                // The status line is long gone; all we can do is cut the
                // chunked stream short so the client sees the truncation.
                warn!("read failed mid-stream for {path}: {err}");
                return Err(WriteError::Io(err));
            }
        };
        hasher.update(&buf[..n]);
        total += n;
        writer.write_chunked_body(&buf[..n]).await?;
    }
    writer.write_chunked_body_done().await?;

    let mut trailers = HeaderMap::new();
    trailers.set("x-content-sha256", &hex_digest(hasher.finalize().as_slice()));
    trailers.set("x-content-length", &total.to_string());
    writer.write_trailers(&trailers).await
}

fn hex_digest(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_digest_is_lowercase_and_padded() {
        assert_eq!(hex_digest(&[0x00, 0x0f, 0xab]), "000fab");
    }
}
