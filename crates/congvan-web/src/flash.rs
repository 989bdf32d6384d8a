//! One-shot messages carried across a redirect in the session.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::Error;

const FLASH_KEY: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
  Success,
  Error,
}

impl Level {
  pub fn as_str(self) -> &'static str {
    match self {
      Level::Success => "success",
      Level::Error => "error",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
  pub level:   Level,
  pub message: String,
}

/// Queue a message for the next rendered page.
pub async fn push(session: &Session, level: Level, message: impl Into<String>) -> Result<(), Error> {
  let mut queued: Vec<Flash> = session.get(FLASH_KEY).await?.unwrap_or_default();
  queued.push(Flash { level, message: message.into() });
  session.insert(FLASH_KEY, queued).await?;
  Ok(())
}

pub async fn success(session: &Session, message: impl Into<String>) -> Result<(), Error> {
  push(session, Level::Success, message).await
}

pub async fn error(session: &Session, message: impl Into<String>) -> Result<(), Error> {
  push(session, Level::Error, message).await
}

/// Drain every queued message.
pub async fn take(session: &Session) -> Result<Vec<Flash>, Error> {
  Ok(session.remove(FLASH_KEY).await?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use tower_sessions::MemoryStore;

  use super::*;

  #[tokio::test]
  async fn messages_are_drained_in_order() {
    let session = Session::new(None, Arc::new(MemoryStore::default()), None);
    success(&session, "một").await.unwrap();
    error(&session, "hai").await.unwrap();

    let drained = take(&session).await.unwrap();
    assert_eq!(drained, vec![
      Flash { level: Level::Success, message: "một".into() },
      Flash { level: Level::Error, message: "hai".into() },
    ]);
    assert!(take(&session).await.unwrap().is_empty());
  }
}
