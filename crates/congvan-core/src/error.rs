//! Error types for `congvan-core`.

use thiserror::Error;

/// A rejected form submission. The message is shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("Tình trạng không hợp lệ: {0:?}")]
  UnknownStatus(String),

  #[error("Vai trò không hợp lệ: {0:?}")]
  UnknownRole(String),

  #[error("Tháng không hợp lệ: {0}")]
  InvalidMonth(String),

  #[error("Năm không hợp lệ: {0}")]
  InvalidYear(String),

  #[error("Ngày nhận không hợp lệ: {0}")]
  InvalidDate(String),

  #[error("Thiếu trường bắt buộc: {0}")]
  MissingField(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
