use super::{AppHandler, responses, static_files, stream};
use crate::http::request::Request;
use crate::http::response::{ResponseWriter, WriteError};
use crate::http::status::StatusCode;
use async_std::io::Write;

pub async fn route<W: Write + Unpin + Send>(
    app: &AppHandler,
    writer: &mut ResponseWriter<W>,
    request: &Request,
) -> Result<(), WriteError> {
    let target = request.request_line.target.as_str();

    if let Some(rel) = target.strip_prefix("/files/") {
        return static_files::serve(app, writer, rel).await;
    }
    if let Some(rel) = target.strip_prefix("/stream/") {
        return stream::serve(app, writer, rel).await;
    }

    match target {
        "/yourproblem" => {
            responses::page(
                writer,
                &app.server_name,
                StatusCode::BadRequest,
                responses::BAD_REQUEST_PAGE,
            )
            .await
        }
        "/myproblem" => {
            responses::page(
                writer,
                &app.server_name,
                StatusCode::InternalServerError,
                responses::SERVER_ERROR_PAGE,
            )
            .await
        }
        // Every other target answers 200.
        _ => responses::page(writer, &app.server_name, StatusCode::Ok, responses::OK_PAGE).await,
    }
}
