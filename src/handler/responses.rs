use crate::http::response::{ResponseWriter, WriteError, default_headers};
use crate::http::status::StatusCode;
use async_std::io::Write;

pub const OK_PAGE: &str = "<html><head><title>200 OK</title></head>\
     <body><h1>Success!</h1><p>Your request made it through.</p></body></html>";

pub const BAD_REQUEST_PAGE: &str = "<html><head><title>400 Bad Request</title></head>\
     <body><h1>Bad Request</h1><p>That request did not parse.</p></body></html>";

pub const SERVER_ERROR_PAGE: &str = "<html><head><title>500 Internal Server Error</title></head>\
     <body><h1>Internal Server Error</h1><p>This one is on us.</p></body></html>";

/// Canned HTML page with the stock headers.
pub async fn page<W: Write + Unpin + Send>(
    writer: &mut ResponseWriter<W>,
    server_name: &str,
    status: StatusCode,
    html: &str,
) -> Result<(), WriteError> {
    let body = html.as_bytes();
    let mut headers = default_headers(body.len());
    headers.set("content-type", "text/html");
    headers.set("server", server_name);

    writer.write_status_line(status).await?;
    writer.write_headers(&headers).await?;
    writer.write_body(body).await
}
