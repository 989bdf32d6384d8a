//! Error type for `congvan-store-sqlite`.

use congvan_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A UNIQUE constraint refused the write.
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("invalid stored value: {0}")]
  Decode(String),
}

impl Error {
  /// Split UNIQUE-constraint failures out of generic database errors.
  pub(crate) fn from_write(e: tokio_rusqlite::Error) -> Self {
    if let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(f, msg)) = &e
      && f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    {
      return Error::Conflict(msg.clone().unwrap_or_else(|| f.to_string()));
    }
    Error::Database(e)
  }
}

impl StoreError for Error {
  fn is_conflict(&self) -> bool { matches!(self, Error::Conflict(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
