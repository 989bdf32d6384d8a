//! Session login, password hashing and the user extractors.
//!
//! The session stores only the user id. Every request reloads the account,
//! so a deleted or demoted user loses access on their next request.

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{extract::FromRequestParts, http::request::Parts};
use congvan_core::{
  store::{RecordStore, StoreError as _, UserStore},
  user::{NewUser, Role, User},
};
use rand_core::OsRng;
use tower_sessions::Session;

use crate::{AppState, ServerConfig, error::Error};

pub const SESSION_USER_ID_KEY: &str = "user_id";

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Produce an argon2 PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, Error> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| Error::Hash(e.to_string()))
}

/// A malformed stored hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
  PasswordHash::new(hash).is_ok_and(|parsed| {
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok()
  })
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// Bind the session to `user`. The session id is rotated first.
pub async fn sign_in(session: &Session, user: &User) -> Result<(), Error> {
  session.cycle_id().await?;
  session.insert(SESSION_USER_ID_KEY, user.id).await?;
  Ok(())
}

pub async fn sign_out(session: &Session) -> Result<(), Error> {
  session.flush().await?;
  Ok(())
}

/// The account bound to `session`, if it still exists.
pub async fn session_user<S>(session: &Session, store: &S) -> Result<Option<User>, Error>
where
  S: UserStore,
{
  let Some(id) = session.get::<i64>(SESSION_USER_ID_KEY).await? else {
    return Ok(None);
  };
  store.get_user(id).await.map_err(Error::store)
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// Any signed-in user. Anonymous requests are redirected to the login page.
pub struct CurrentUser(pub User);

/// A signed-in admin. Other roles get 403.
pub struct AdminUser(pub User);

fn session_from_parts(parts: &Parts) -> Result<Session, Error> {
  parts
    .extensions
    .get::<Session>()
    .cloned()
    .ok_or(Error::Internal("session layer is not installed"))
}

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: RecordStore + UserStore + Clone + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let session = session_from_parts(parts)?;
    session_user(&session, state.store.as_ref())
      .await?
      .map(CurrentUser)
      .ok_or(Error::Unauthenticated)
  }
}

impl<S> FromRequestParts<AppState<S>> for AdminUser
where
  S: RecordStore + UserStore + Clone + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
    if !user.is_admin() {
      tracing::warn!(user = %user.username, uri = %parts.uri, "admin route refused");
      return Err(Error::Forbidden);
    }
    Ok(AdminUser(user))
  }
}

// ─── Seeding ─────────────────────────────────────────────────────────────────

/// Create the configured admin and staff accounts when missing. Existing
/// accounts are left untouched.
pub async fn seed_users<S>(store: &S, config: &ServerConfig) -> Result<(), Error>
where
  S: UserStore,
{
  let seeds = [
    (&config.admin_username, &config.admin_password, Role::Admin),
    (&config.staff_username, &config.staff_password, Role::Staff),
  ];

  for (username, password, role) in seeds {
    if store
      .find_user_by_username(username)
      .await
      .map_err(Error::store)?
      .is_some()
    {
      continue;
    }

    let input = NewUser {
      username:      username.clone(),
      password_hash: hash_password(password)?,
      role,
    };
    match store.create_user(input).await {
      Ok(user) => tracing::info!(username = %user.username, role = role.as_str(), "seeded account"),
      Err(e) if e.is_conflict() => {}
      Err(e) => return Err(Error::store(e)),
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use congvan_store_sqlite::SqliteStore;

  use super::*;

  #[test]
  fn password_round_trip() {
    let hash = hash_password("bí mật").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("bí mật", &hash));
    assert!(!verify_password("bi mat", &hash));
  }

  #[test]
  fn malformed_hash_never_verifies() {
    assert!(!verify_password("", "not-a-phc-string"));
  }

  #[tokio::test]
  async fn seeding_is_idempotent_and_keeps_existing_passwords() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let config = crate::tests::config();

    seed_users(&store, &config).await.unwrap();
    let admin = store.find_user_by_username("admin").await.unwrap().unwrap();
    assert_eq!(admin.role, Role::Admin);
    let staff = store.find_user_by_username("nhanvien").await.unwrap().unwrap();
    assert_eq!(staff.role, Role::Staff);

    store
      .set_password_hash(admin.id, hash_password("đổi rồi").unwrap())
      .await
      .unwrap();
    seed_users(&store, &config).await.unwrap();

    let admin = store.find_user_by_username("admin").await.unwrap().unwrap();
    assert!(verify_password("đổi rồi", &admin.password_hash));
    assert_eq!(store.list_users().await.unwrap().len(), 2);
  }
}
