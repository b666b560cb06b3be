#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok,
    BadRequest,
    InternalServerError,

    /// Any code without a canonical reason phrase here. The response writer
    /// degrades these to an empty status line instead of failing.
    Other(u16),
}

impl StatusCode {
    pub fn from_u16(code: u16) -> Self {
        match code {
            200 => StatusCode::Ok,
            400 => StatusCode::BadRequest,
            500 => StatusCode::InternalServerError,
            other => StatusCode::Other(other),
        }
    }

    pub fn code(self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::InternalServerError => 500,
            StatusCode::Other(code) => code,
        }
    }

    pub fn reason(self) -> Option<&'static str> {
        match self {
            StatusCode::Ok => Some("OK"),
            StatusCode::BadRequest => Some("Bad Request"),
            StatusCode::InternalServerError => Some("Internal Server Error"),
            StatusCode::Other(_) => None,
        }
    }
}
