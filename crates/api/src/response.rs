//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Standard API response wrapper: `{ "data": ... }`.
///
/// Errors never pass through here; they are rendered by
/// [`matrix_common::AppError`] as `{ "error": ... }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 with `data`.
    pub const fn ok(data: T) -> Self {
        Self {
            data,
            status: StatusCode::OK,
        }
    }

    /// 201 with `data`.
    pub const fn created(data: T) -> Self {
        Self {
            data,
            status: StatusCode::CREATED,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Count of rows a bulk action touched.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Affected {
    pub affected: u64,
}

impl From<u64> for Affected {
    fn from(affected: u64) -> Self {
        Self { affected }
    }
}

/// Empty success response.
#[must_use]
pub const fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}
