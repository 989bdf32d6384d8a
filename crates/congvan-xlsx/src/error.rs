//! Error type for `congvan-xlsx`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("zip error: {0}")]
  Zip(#[from] zip::result::ZipError),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("xml error: {0}")]
  Xml(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
