use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::error::Error;

#[derive(Debug)]
pub struct AppError(pub Error);

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(Error::invalid_request(msg))
    }

    fn status(&self) -> StatusCode {
        match self.0 {
            Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::TransportUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::MalformedPayload(_) | Error::StoreUnavailable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

/// Any unreadable command body is the caller's fault, whatever axum's
/// rejection says (415, 422 and friends all become 400).
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    }
}
