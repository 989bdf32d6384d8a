//! User accounts and roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// What an account may do. Admins manage records and users; staff only read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  Staff,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Role::Admin => "admin",
      Role::Staff => "staff",
    }
  }

  pub fn parse(s: &str) -> Result<Role> {
    match s.trim() {
      "admin" => Ok(Role::Admin),
      "staff" => Ok(Role::Staff),
      other => Err(Error::UnknownRole(other.to_owned())),
    }
  }
}

/// A stored account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub id:            i64,
  pub username:      String,
  /// argon2 PHC string, e.g. `$argon2id$v=19$…`
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub role:          Role,
  pub created_at:    DateTime<Utc>,
}

impl User {
  pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

/// Input for creating an account; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub password_hash: String,
  pub role:          Role,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn role_round_trips_through_text() {
    assert_eq!(Role::parse(Role::Admin.as_str()), Ok(Role::Admin));
    assert_eq!(Role::parse(" staff "), Ok(Role::Staff));
    assert_eq!(Role::parse("root"), Err(Error::UnknownRole("root".into())));
  }
}
