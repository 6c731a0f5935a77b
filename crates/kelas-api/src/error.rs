//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] kelas_core::Error),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),
}

impl ApiError {
  fn status(&self) -> StatusCode {
    use kelas_core::Error as E;
    match self {
      Self::Core(E::Unauthorized) => StatusCode::UNAUTHORIZED,
      Self::Core(E::Forbidden { .. } | E::ProtectedGrant) => {
        StatusCode::FORBIDDEN
      }
      Self::Core(E::DuplicateGrant { .. }) => StatusCode::CONFLICT,
      Self::Core(E::NotEnrolled { .. } | E::MissingScope(_)) => {
        StatusCode::UNPROCESSABLE_ENTITY
      }
      Self::Core(E::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
      Self::Forbidden(_) => StatusCode::FORBIDDEN,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status == StatusCode::INTERNAL_SERVER_ERROR {
      tracing::error!(error = %self, "request failed");
    }
    let mut response =
      (status, Json(json!({ "error": self.to_string() }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      response.headers_mut().insert(
        axum::http::header::WWW_AUTHENTICATE,
        axum::http::HeaderValue::from_static("Basic realm=\"kelas\""),
      );
    }
    response
  }
}
