//! Record CRUD. Reading is open to every signed-in user; writes need an
//! admin.
//!
//! A rejected submission is kept in the session as a draft so the form
//! comes back prefilled after the redirect.

use axum::{
  Form,
  extract::{Path, State},
  response::{Html, Redirect},
};
use congvan_core::{
  record::RecordInput,
  store::{RecordStore, StoreError as _, UserStore},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{
  AppState,
  auth::{AdminUser, CurrentUser},
  error::Error,
  flash,
  views,
};

const DRAFT_KEY: &str = "record_draft";

const DUPLICATE_CODE: &str = "Mã công văn đã tồn tại trong tháng này.";
const WRITE_FAILED: &str = "Không lưu được công văn, vui lòng thử lại.";

#[derive(Serialize, Deserialize)]
struct Draft {
  /// `None` for the create form.
  id:    Option<i64>,
  input: RecordInput,
}

async fn take_draft(session: &Session, id: Option<i64>) -> Result<Option<RecordInput>, Error> {
  let draft: Option<Draft> = session.remove(DRAFT_KEY).await?;
  Ok(draft.filter(|d| d.id == id).map(|d| d.input))
}

/// Keep the submission, flash `message` and send the user back to the form.
async fn reject(
  session: &Session,
  id: Option<i64>,
  input: RecordInput,
  message: impl Into<String>,
  back: &str,
) -> Result<Redirect, Error> {
  session.insert(DRAFT_KEY, Draft { id, input }).await?;
  flash::error(session, message).await?;
  Ok(Redirect::to(back))
}

async fn categories<S: RecordStore>(store: &S) -> Vec<String> {
  store.list_categories().await.unwrap_or_else(|e| {
    tracing::warn!(error = %e, "category query failed");
    Vec::new()
  })
}

// ─── Read ────────────────────────────────────────────────────────────────────

pub async fn show<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  session: Session,
  Path(id): Path<i64>,
) -> Result<Html<String>, Error>
where
  S: RecordStore + UserStore + Clone + 'static,
{
  let record = state
    .store
    .get_record(id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound)?;
  let flashes = flash::take(&session).await?;
  Ok(views::record_detail(&user, &flashes, &record))
}

// ─── Create ──────────────────────────────────────────────────────────────────

pub async fn new_form<S>(
  State(state): State<AppState<S>>,
  AdminUser(user): AdminUser,
  session: Session,
) -> Result<Html<String>, Error>
where
  S: RecordStore + UserStore + Clone + 'static,
{
  let input = take_draft(&session, None).await?.unwrap_or_default();
  let categories = categories(state.store.as_ref()).await;
  let flashes = flash::take(&session).await?;
  Ok(views::record_form(
    &user,
    &flashes,
    "Thêm công văn",
    "/congvan/new",
    &input,
    &categories,
  ))
}

pub async fn create<S>(
  State(state): State<AppState<S>>,
  AdminUser(user): AdminUser,
  session: Session,
  Form(input): Form<RecordInput>,
) -> Result<Redirect, Error>
where
  S: RecordStore + UserStore + Clone + 'static,
{
  const BACK: &str = "/congvan/new";

  let record = match input.validate() {
    Ok(record) => record,
    Err(e) => return reject(&session, None, input, e.to_string(), BACK).await,
  };

  match state.store.create_record(record, Some(user.id)).await {
    Ok(created) => {
      tracing::info!(id = created.id, by = %user.username, "record created");
      flash::success(&session, format!("Đã thêm công văn #{}.", created.id)).await?;
      Ok(Redirect::to("/"))
    }
    Err(e) if e.is_conflict() => reject(&session, None, input, DUPLICATE_CODE, BACK).await,
    Err(e) => {
      tracing::error!(error = %e, "record create failed");
      reject(&session, None, input, WRITE_FAILED, BACK).await
    }
  }
}

// ─── Update ──────────────────────────────────────────────────────────────────

pub async fn edit_form<S>(
  State(state): State<AppState<S>>,
  AdminUser(user): AdminUser,
  session: Session,
  Path(id): Path<i64>,
) -> Result<Html<String>, Error>
where
  S: RecordStore + UserStore + Clone + 'static,
{
  let record = state
    .store
    .get_record(id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound)?;

  let input = match take_draft(&session, Some(id)).await? {
    Some(draft) => draft,
    None => RecordInput::from_record(&record),
  };
  let categories = categories(state.store.as_ref()).await;
  let flashes = flash::take(&session).await?;
  Ok(views::record_form(
    &user,
    &flashes,
    &format!("Sửa công văn #{id}"),
    &format!("/congvan/{id}/edit"),
    &input,
    &categories,
  ))
}

pub async fn update<S>(
  State(state): State<AppState<S>>,
  AdminUser(user): AdminUser,
  session: Session,
  Path(id): Path<i64>,
  Form(input): Form<RecordInput>,
) -> Result<Redirect, Error>
where
  S: RecordStore + UserStore + Clone + 'static,
{
  let back = format!("/congvan/{id}/edit");

  let record = match input.validate() {
    Ok(record) => record,
    Err(e) => return reject(&session, Some(id), input, e.to_string(), &back).await,
  };

  match state.store.update_record(id, record).await {
    Ok(Some(_)) => {
      tracing::info!(id, by = %user.username, "record updated");
      flash::success(&session, format!("Đã cập nhật công văn #{id}.")).await?;
      Ok(Redirect::to(&format!("/congvan/{id}")))
    }
    Ok(None) => Err(Error::NotFound),
    Err(e) if e.is_conflict() => reject(&session, Some(id), input, DUPLICATE_CODE, &back).await,
    Err(e) => {
      tracing::error!(error = %e, id, "record update failed");
      reject(&session, Some(id), input, WRITE_FAILED, &back).await
    }
  }
}

// ─── Delete ──────────────────────────────────────────────────────────────────

pub async fn delete<S>(
  State(state): State<AppState<S>>,
  AdminUser(user): AdminUser,
  session: Session,
  Path(id): Path<i64>,
) -> Result<Redirect, Error>
where
  S: RecordStore + UserStore + Clone + 'static,
{
  match state.store.delete_record(id).await {
    Ok(true) => {
      tracing::info!(id, by = %user.username, "record deleted");
      flash::success(&session, format!("Đã xóa công văn #{id}.")).await?;
      Ok(Redirect::to("/"))
    }
    Ok(false) => Err(Error::NotFound),
    Err(e) => {
      tracing::error!(error = %e, id, "record delete failed");
      flash::error(&session, "Không xóa được công văn, vui lòng thử lại.").await?;
      Ok(Redirect::to("/"))
    }
  }
}
