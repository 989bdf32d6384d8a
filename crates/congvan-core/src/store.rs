//! The `RecordStore` and `UserStore` traits.
//!
//! Implemented by storage backends (e.g. `congvan-store-sqlite`). The web
//! layer depends on these abstractions, never on a concrete backend, and
//! holds no authoritative copy of anything: every read goes back to the
//! store.

use std::future::Future;

use crate::{
  filter::RecordFilter,
  page::{Page, PageRequest},
  record::{NewRecord, Record},
  user::{NewUser, Role, User},
};

/// Errors a backend may return.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The write was refused because it would duplicate a unique key: a
  /// record code within its month, or a username.
  fn is_conflict(&self) -> bool;
}

/// Shared by both stores so that a backend implementing both has a single
/// error type.
pub trait Store: Send + Sync {
  type Error: StoreError;
}

/// Persistence for correspondence records.
///
/// Every write is its own transaction. Results are ordered by id
/// descending unless stated otherwise.
pub trait RecordStore: Store {
  /// Persist a new record. The store assigns the id and timestamps.
  fn create_record(
    &self,
    input: NewRecord,
    owner_id: Option<i64>,
  ) -> impl Future<Output = Result<Record, Self::Error>> + Send + '_;

  /// Retrieve a record by id. Returns `None` if not found.
  fn get_record(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Record>, Self::Error>> + Send + '_;

  /// Replace every editable field of a record. Returns `None` if the id does
  /// not exist. Last write wins.
  fn update_record(
    &self,
    id: i64,
    input: NewRecord,
  ) -> impl Future<Output = Result<Option<Record>, Self::Error>> + Send + '_;

  /// Remove a record. Returns `false` if it did not exist.
  fn delete_record(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// All records matching `filter`, newest first.
  fn find_records<'a>(
    &'a self,
    filter: &'a RecordFilter,
  ) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send + 'a;

  /// One page of records matching `filter`, newest first.
  fn page_records<'a>(
    &'a self,
    filter: &'a RecordFilter,
    page: PageRequest,
  ) -> impl Future<Output = Result<Page<Record>, Self::Error>> + Send + 'a;

  /// Distinct non-blank categories in use, ascending. Feeds the filter form.
  fn list_categories(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;
}

/// Persistence for user accounts.
pub trait UserStore: Store {
  /// Create an account. Fails if the username is taken.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn find_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// All accounts, newest first.
  fn list_users(
    &self,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Replace the stored credential. Returns `false` if the id is unknown.
  fn set_password_hash(
    &self,
    id: i64,
    password_hash: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Change an account's role. Returns `false` if the id is unknown.
  fn set_role(
    &self,
    id: i64,
    role: Role,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Remove an account. Returns `false` if it did not exist.
  fn delete_user(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
