//! Error types and axum `IntoResponse` implementation.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::views;

#[derive(Debug, Error)]
pub enum Error {
  #[error("not signed in")]
  Unauthenticated,
  #[error("forbidden")]
  Forbidden,
  #[error("not found")]
  NotFound,
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("session error: {0}")]
  Session(#[from] tower_sessions::session::Error),
  #[error("export error: {0}")]
  Export(#[from] congvan_xlsx::Error),
  #[error("password hash error: {0}")]
  Hash(String),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("{0}")]
  Internal(&'static str),
}

impl Error {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Error::Store(Box::new(e))
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthenticated => Redirect::to("/login").into_response(),
      Error::Forbidden => views::error_page(
        StatusCode::FORBIDDEN,
        "Bạn không có quyền thực hiện thao tác này.",
      ),
      Error::NotFound => {
        views::error_page(StatusCode::NOT_FOUND, "Không tìm thấy dữ liệu.")
      }
      Error::BadRequest(msg) => views::error_page(StatusCode::BAD_REQUEST, &msg),
      e @ (Error::Session(_)
      | Error::Export(_)
      | Error::Hash(_)
      | Error::Store(_)
      | Error::Internal(_)) => {
        tracing::error!(error = %e, "request failed");
        views::error_page(
          StatusCode::INTERNAL_SERVER_ERROR,
          "Đã xảy ra lỗi, vui lòng thử lại.",
        )
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use axum::http::header;

  use super::*;

  #[test]
  fn unauthenticated_redirects_to_login() {
    let res = Error::Unauthenticated.into_response();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers()[header::LOCATION], "/login");
  }

  #[test]
  fn internal_errors_hide_detail() {
    let res = Error::Hash("salt too short".into()).into_response();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[test]
  fn forbidden_is_client_error() {
    assert_eq!(Error::Forbidden.into_response().status(), StatusCode::FORBIDDEN);
  }
}
