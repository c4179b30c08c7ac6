use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error(transparent)]
  Db(#[from] sea_orm::DbErr),
  #[error("invalid request: {0}")]
  InvalidArgs(String),
  #[error("email or MT5 rebate account already registered")]
  DuplicateAffiliate,
  #[error("email already registered as downline")]
  DuplicateDownline,
  #[error("invalid affiliate code or affiliate not approved")]
  InvalidReferrer,
  #[error("affiliate not found")]
  AffiliateNotFound,
  #[error("access denied")]
  Unauthorized,
}

impl Error {
  fn status(&self) -> StatusCode {
    match self {
      Error::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
      Error::InvalidArgs(_) | Error::InvalidReferrer => StatusCode::BAD_REQUEST,
      Error::DuplicateAffiliate | Error::DuplicateDownline => {
        StatusCode::CONFLICT
      }
      Error::AffiliateNotFound => StatusCode::NOT_FOUND,
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!("request failed: {self}");
      // Storage details stay out of responses.
      (status, Json(json::json!({ "message": "internal error" })))
        .into_response()
    } else {
      (status, Json(json::json!({ "message": self.to_string() })))
        .into_response()
    }
  }
}
