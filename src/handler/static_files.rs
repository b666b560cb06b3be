use super::{AppHandler, responses};
use crate::http::response::{ResponseWriter, WriteError, default_headers};
use crate::http::status::StatusCode;
use async_std::io::Write;
use log::warn;

/// Fixed-length file response for `/files/<rel>`.
pub async fn serve<W: Write + Unpin + Send>(
    app: &AppHandler,
    writer: &mut ResponseWriter<W>,
    rel: &str,
) -> Result<(), WriteError> {
    let Some(path) = resolve(&app.static_root, rel) else {
        return responses::page(
            writer,
            &app.server_name,
            StatusCode::BadRequest,
            responses::BAD_REQUEST_PAGE,
        )
        .await;
    };

    let body = match async_std::fs::read(&path).await {
        Ok(body) => body,
        Err(err) => {
            warn!("failed to read {path}: {err}");
            return responses::page(
                writer,
                &app.server_name,
                StatusCode::InternalServerError,
                responses::SERVER_ERROR_PAGE,
            )
            .await;
        }
    };

    let mut headers = default_headers(body.len());
    headers.set("content-type", guess_mime(&path));
    headers.set("server", &app.server_name);

    writer.write_status_line(StatusCode::Ok).await?;
    writer.write_headers(&headers).await?;
    writer.write_body(&body).await
}

/// Joins `rel` onto the static root, refusing parent-directory escapes.
pub(super) fn resolve(root: &str, rel: &str) -> Option<String> {
    if rel.is_empty() || rel.split('/').any(|part| part == "..") {
        return None;
    }
    Some(format!("{root}/{rel}"))
}

pub(super) fn guess_mime(path: &str) -> &'static str {
    match path.rsplit('.').next() {
        Some("htm") | Some("html") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("txt") => "text/plain",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_refuses_traversal() {
        assert_eq!(resolve("/srv", "a/b.txt"), Some("/srv/a/b.txt".to_string()));
        assert_eq!(resolve("/srv", "../etc/passwd"), None);
        assert_eq!(resolve("/srv", "a/../../etc"), None);
        assert_eq!(resolve("/srv", ""), None);
    }

    #[test]
    fn mime_guessing_falls_back_to_octet_stream() {
        assert_eq!(guess_mime("/srv/index.html"), "text/html");
        assert_eq!(guess_mime("/srv/clip.mp4"), "video/mp4");
        assert_eq!(guess_mime("/srv/blob"), "application/octet-stream");
    }
}
