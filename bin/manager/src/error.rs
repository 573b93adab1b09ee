use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use navigator_client::entities::{ApiErrorBody, ErrorCode};

/// The error taxonomy every public API call resolves to.
/// Each variant maps to one [ErrorCode] and HTTP status.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
  #[error("{0}")]
  NotFound(String),
  #[error("{0}")]
  Unavailable(String),
  #[error("{0}")]
  DeadlineExceeded(String),
  #[error("{0}")]
  AlreadyExists(String),
  #[error("{0}")]
  InvalidArgument(String),
  #[error("{0}")]
  Internal(String),
}

impl ApiError {
  pub fn code(&self) -> ErrorCode {
    match self {
      ApiError::NotFound(_) => ErrorCode::NotFound,
      ApiError::Unavailable(_) => ErrorCode::Unavailable,
      ApiError::DeadlineExceeded(_) => {
        ErrorCode::DeadlineExceeded
      }
      ApiError::AlreadyExists(_) => ErrorCode::AlreadyExists,
      ApiError::InvalidArgument(_) => ErrorCode::InvalidArgument,
      ApiError::Internal(_) => ErrorCode::Internal,
    }
  }

  fn status(&self) -> StatusCode {
    match self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      ApiError::DeadlineExceeded(_) => {
        StatusCode::GATEWAY_TIMEOUT
      }
      ApiError::AlreadyExists(_) => StatusCode::CONFLICT,
      ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
      ApiError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let body = ApiErrorBody {
      code: self.code(),
      message: self.to_string(),
    };
    (self.status(), Json(body)).into_response()
  }
}
