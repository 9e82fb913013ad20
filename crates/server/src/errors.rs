use std::fmt::Display;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use goodday_core::errors::ApplicationError;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    correlation_id: String,
}

pub(crate) fn persistence(error: impl Display) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}

pub(crate) fn integration(error: impl Display) -> ApplicationError {
    ApplicationError::Integration(error.to_string())
}

/// JSON error response carrying only the user-facing message and the correlation id.
pub(crate) fn error_response(failure: ApplicationError, correlation_id: String) -> Response {
    let interface = failure.into_interface(correlation_id.clone());
    let status =
        StatusCode::from_u16(interface.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorBody { error: interface.user_message(), correlation_id })).into_response()
}
