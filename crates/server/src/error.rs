use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::fmt;
use waypoints_common::WaypointError;

use crate::types::ErrorResponse;

/// HTTP wrapper around `WaypointError`
///
/// Renders `{"error": "<public message>"}` with the mapped status.
#[derive(Debug)]
pub struct ApiError(pub WaypointError);

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<WaypointError> for ApiError {
    fn from(err: WaypointError) -> Self {
        Self(err)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.0.public_message(),
        })
    }
}
