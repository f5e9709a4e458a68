//! Domain errors rendered as JSON HTTP responses.
//!
//! The body is the serialised [`Error`]; the status comes from its code.
//! Internal failures reach the client as a generic message with the trace id
//! kept, and the original text goes to the log instead.

use actix_web::http::{StatusCode, header};
use actix_web::{HttpResponse, ResponseError};
use tracing::{error, warn};

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Result alias returned by every handler.
pub type ApiResult<T> = Result<T, Error>;

const REDACTED_MESSAGE: &str = "Internal server error";
/// Seconds a client should wait before retrying a `503`.
const RETRY_AFTER_SECS: u32 = 5;

const fn http_status(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest | ErrorCode::InsufficientFunds => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// The error as the client sees it.
fn client_view(err: &Error) -> Error {
    if err.code() != ErrorCode::InternalError {
        return err.clone();
    }
    error!(
        trace_id = err.trace_id().unwrap_or_default(),
        message = err.message(),
        "internal error hidden from client"
    );
    let redacted = Error::internal(REDACTED_MESSAGE);
    match err.trace_id() {
        Some(id) => redacted.with_trace_id(id),
        None => redacted,
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        http_status(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            response.insert_header((TRACE_ID_HEADER, id));
        }
        if self.code() == ErrorCode::ServiceUnavailable {
            response.insert_header((header::RETRY_AFTER, RETRY_AFTER_SECS.to_string()));
        }
        response.json(client_view(self))
    }
}

/// Framework rejections keep their client-error meaning; anything else is
/// treated as internal.
impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        let status = err.as_response_error().status_code();
        if status.is_client_error() {
            warn!(error = %err, %status, "request rejected by actix");
            Error::invalid_request(err.to_string())
        } else {
            error!(error = %err, %status, "actix error promoted to domain error");
            Error::internal(REDACTED_MESSAGE)
        }
    }
}

#[cfg(test)]
mod tests;
