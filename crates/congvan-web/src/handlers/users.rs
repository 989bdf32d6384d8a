//! Account administration. Every route needs an admin, and every outcome
//! is a flash message plus a redirect back to the list.

use axum::{
  Form,
  extract::{Path, State},
  response::{Html, Redirect},
};
use congvan_core::{
  store::{RecordStore, StoreError as _, UserStore},
  user::{NewUser, Role},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
  AppState,
  auth::{AdminUser, hash_password},
  error::Error,
  flash,
  views,
};

const BACK: &str = "/users";
const WRITE_FAILED: &str = "Không lưu được tài khoản, vui lòng thử lại.";

#[derive(Deserialize)]
pub struct CreateForm {
  #[serde(default)]
  pub username: String,
  #[serde(default)]
  pub password: String,
  #[serde(default)]
  pub role:     String,
}

#[derive(Deserialize)]
pub struct PasswordForm {
  #[serde(default)]
  pub password: String,
}

#[derive(Deserialize)]
pub struct RoleForm {
  #[serde(default)]
  pub role: String,
}

async fn back_with_error(session: &Session, message: impl Into<String>) -> Result<Redirect, Error> {
  flash::error(session, message).await?;
  Ok(Redirect::to(BACK))
}

async fn back_with_success(session: &Session, message: impl Into<String>) -> Result<Redirect, Error> {
  flash::success(session, message).await?;
  Ok(Redirect::to(BACK))
}

pub async fn list<S>(
  State(state): State<AppState<S>>,
  AdminUser(admin): AdminUser,
  session: Session,
) -> Result<Html<String>, Error>
where
  S: RecordStore + UserStore + Clone + 'static,
{
  let users = state.store.list_users().await.map_err(Error::store)?;
  let flashes = flash::take(&session).await?;
  Ok(views::users(&admin, &flashes, &users))
}

pub async fn create<S>(
  State(state): State<AppState<S>>,
  AdminUser(admin): AdminUser,
  session: Session,
  Form(form): Form<CreateForm>,
) -> Result<Redirect, Error>
where
  S: RecordStore + UserStore + Clone + 'static,
{
  let username = form.username.trim();
  if username.is_empty() || form.password.trim().is_empty() {
    return back_with_error(&session, "Vui lòng nhập tên đăng nhập và mật khẩu.").await;
  }
  let role = if form.role.trim().is_empty() {
    Role::Staff
  } else {
    match Role::parse(&form.role) {
      Ok(role) => role,
      Err(e) => return back_with_error(&session, e.to_string()).await,
    }
  };

  let input = NewUser {
    username: username.to_owned(),
    password_hash: hash_password(&form.password)?,
    role,
  };
  match state.store.create_user(input).await {
    Ok(user) => {
      tracing::info!(username = %user.username, role = role.as_str(), by = %admin.username, "account created");
      back_with_success(&session, format!("Đã tạo tài khoản {}.", user.username)).await
    }
    Err(e) if e.is_conflict() => back_with_error(&session, "Tên đăng nhập đã tồn tại.").await,
    Err(e) => {
      tracing::error!(error = %e, "account create failed");
      back_with_error(&session, WRITE_FAILED).await
    }
  }
}

pub async fn reset<S>(
  State(state): State<AppState<S>>,
  AdminUser(admin): AdminUser,
  session: Session,
  Path(id): Path<i64>,
  Form(form): Form<PasswordForm>,
) -> Result<Redirect, Error>
where
  S: RecordStore + UserStore + Clone + 'static,
{
  if form.password.trim().is_empty() {
    return back_with_error(&session, "Mật khẩu mới không được để trống.").await;
  }
  let hash = hash_password(&form.password)?;
  match state.store.set_password_hash(id, hash).await {
    Ok(true) => {
      tracing::info!(id, by = %admin.username, "password reset");
      back_with_success(&session, "Đã đặt lại mật khẩu.").await
    }
    Ok(false) => Err(Error::NotFound),
    Err(e) => {
      tracing::error!(error = %e, id, "password reset failed");
      back_with_error(&session, WRITE_FAILED).await
    }
  }
}

pub async fn update<S>(
  State(state): State<AppState<S>>,
  AdminUser(admin): AdminUser,
  session: Session,
  Path(id): Path<i64>,
  Form(form): Form<RoleForm>,
) -> Result<Redirect, Error>
where
  S: RecordStore + UserStore + Clone + 'static,
{
  let role = match Role::parse(&form.role) {
    Ok(role) => role,
    Err(e) => return back_with_error(&session, e.to_string()).await,
  };
  if id == admin.id && role != Role::Admin {
    return back_with_error(&session, "Không thể tự hạ quyền quản trị của chính mình.").await;
  }

  match state.store.set_role(id, role).await {
    Ok(true) => {
      tracing::info!(id, role = role.as_str(), by = %admin.username, "role changed");
      back_with_success(&session, "Đã cập nhật vai trò.").await
    }
    Ok(false) => Err(Error::NotFound),
    Err(e) => {
      tracing::error!(error = %e, id, "role change failed");
      back_with_error(&session, WRITE_FAILED).await
    }
  }
}

pub async fn delete<S>(
  State(state): State<AppState<S>>,
  AdminUser(admin): AdminUser,
  session: Session,
  Path(id): Path<i64>,
) -> Result<Redirect, Error>
where
  S: RecordStore + UserStore + Clone + 'static,
{
  if id == admin.id {
    return back_with_error(&session, "Không thể xóa tài khoản đang đăng nhập.").await;
  }

  match state.store.delete_user(id).await {
    Ok(true) => {
      tracing::info!(id, by = %admin.username, "account deleted");
      back_with_success(&session, "Đã xóa tài khoản.").await
    }
    Ok(false) => Err(Error::NotFound),
    Err(e) => {
      tracing::error!(error = %e, id, "account delete failed");
      back_with_error(&session, WRITE_FAILED).await
    }
  }
}
