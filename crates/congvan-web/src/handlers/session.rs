//! Login, logout and the staff quick-login shortcut.

use axum::{
  Form,
  extract::State,
  response::{IntoResponse, Redirect, Response},
};
use congvan_core::{
  store::{RecordStore, UserStore},
  user::Role,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
  AppState,
  auth::{self, verify_password},
  error::Error,
  flash,
  views,
};

#[derive(Deserialize)]
pub struct LoginForm {
  #[serde(default)]
  pub username: String,
  #[serde(default)]
  pub password: String,
}

pub async fn login_form<S>(
  State(state): State<AppState<S>>,
  session: Session,
) -> Result<Response, Error>
where
  S: RecordStore + UserStore + Clone + 'static,
{
  if auth::session_user(&session, state.store.as_ref()).await?.is_some() {
    return Ok(Redirect::to("/").into_response());
  }
  let flashes = flash::take(&session).await?;
  Ok(views::login(&flashes).into_response())
}

pub async fn login<S>(
  State(state): State<AppState<S>>,
  session: Session,
  Form(form): Form<LoginForm>,
) -> Result<Redirect, Error>
where
  S: RecordStore + UserStore + Clone + 'static,
{
  let username = form.username.trim();
  let user = state
    .store
    .find_user_by_username(username)
    .await
    .map_err(Error::store)?;

  match user {
    Some(user) if verify_password(&form.password, &user.password_hash) => {
      auth::sign_in(&session, &user).await?;
      tracing::info!(username = %user.username, "signed in");
      Ok(Redirect::to("/"))
    }
    _ => {
      tracing::warn!(username, "failed login");
      flash::error(&session, "Sai tên đăng nhập hoặc mật khẩu.").await?;
      Ok(Redirect::to("/login"))
    }
  }
}

pub async fn logout(session: Session) -> Result<Redirect, Error> {
  auth::sign_out(&session).await?;
  Ok(Redirect::to("/login"))
}

/// Sign in as the configured staff account without a password. Only a
/// staff-role account qualifies.
pub async fn quick_login<S>(
  State(state): State<AppState<S>>,
  session: Session,
) -> Result<Redirect, Error>
where
  S: RecordStore + UserStore + Clone + 'static,
{
  let user = state
    .store
    .find_user_by_username(&state.config.staff_username)
    .await
    .map_err(Error::store)?
    .filter(|u| u.role == Role::Staff);

  match user {
    Some(user) => {
      auth::sign_in(&session, &user).await?;
      tracing::info!(username = %user.username, "quick login");
      Ok(Redirect::to("/"))
    }
    None => {
      tracing::warn!(username = %state.config.staff_username, "quick login account missing");
      flash::error(&session, "Chưa có tài khoản nhân viên để vào nhanh.").await?;
      Ok(Redirect::to("/login"))
    }
  }
}
