//! Web layer for the công văn register.
//!
//! Exposes an axum [`Router`] with session login, the filtered dashboard,
//! record CRUD, spreadsheet export and account administration, backed by
//! any store implementing [`RecordStore`] and [`UserStore`].

pub mod auth;
pub mod error;
pub mod flash;
pub mod handlers;
pub mod views;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use congvan_core::store::{RecordStore, UserStore};
use serde::Deserialize;
use sha2::{Digest as _, Sha512};
use tower_http::trace::TraceLayer;
use tower_sessions::{
  MemoryStore, SessionManagerLayer,
  cookie::{Key, SameSite},
};

use handlers::{dashboard, export, health, records, session, users};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CONGVAN_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                    String,
  #[serde(default = "default_port")]
  pub port:                    u16,
  #[serde(default = "default_database_path")]
  pub database_path:           PathBuf,
  /// Signs the session cookie. Any length; stretched with SHA-512.
  pub secret_key:              String,
  #[serde(default = "default_admin_username")]
  pub admin_username:          String,
  #[serde(default = "default_admin_password")]
  pub admin_password:          String,
  #[serde(default = "default_staff_username")]
  pub staff_username:          String,
  #[serde(default = "default_staff_password")]
  pub staff_password:          String,
  #[serde(default = "default_page_size")]
  pub page_size:               u32,
  /// Refuse to export unless both category and status are filtered.
  #[serde(default)]
  pub export_requires_filters: bool,
  #[serde(default)]
  pub secure_cookies:          bool,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8000 }
fn default_database_path() -> PathBuf { PathBuf::from("congvan.db") }
fn default_admin_username() -> String { "admin".to_owned() }
fn default_admin_password() -> String { "admin123".to_owned() }
fn default_staff_username() -> String { "nhanvien".to_owned() }
fn default_staff_password() -> String { "nhanvien123".to_owned() }
fn default_page_size() -> u32 { 20 }

impl ServerConfig {
  /// Dashboard page size, clamped to `1..=200`.
  pub fn per_page(&self) -> u32 { self.page_size.clamp(1, 200) }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub config:   Arc<ServerConfig>,
  /// Server-side session data; the cookie holds only a signed id.
  pub sessions: MemoryStore,
}

impl<S> AppState<S> {
  pub fn new(store: S, config: ServerConfig) -> Self {
    Self {
      store:    Arc::new(store),
      config:   Arc::new(config),
      sessions: MemoryStore::default(),
    }
  }
}

/// 64-byte cookie signing key derived from the configured secret.
fn session_key(secret: &str) -> Key {
  Key::from(Sha512::digest(secret.as_bytes()).as_slice())
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the whole site.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: RecordStore + UserStore + Clone + 'static,
{
  let sessions = SessionManagerLayer::new(state.sessions.clone())
    .with_secure(state.config.secure_cookies)
    .with_same_site(SameSite::Lax)
    .with_signed(session_key(&state.config.secret_key));

  Router::new()
    .route("/healthz",              get(health::handler))
    .route("/login",                get(session::login_form::<S>).post(session::login::<S>))
    .route("/logout",               get(session::logout))
    .route("/quick_login",          get(session::quick_login::<S>))
    .route("/",                     get(dashboard::handler::<S>))
    .route("/congvan/new",          get(records::new_form::<S>).post(records::create::<S>))
    .route("/congvan/{id}",         get(records::show::<S>))
    .route("/congvan/{id}/edit",    get(records::edit_form::<S>).post(records::update::<S>))
    .route("/congvan/{id}/delete",  post(records::delete::<S>))
    .route("/export",               get(export::handler::<S>))
    .route("/export-excel",         get(export::handler::<S>))
    .route("/users",                get(users::list::<S>).post(users::create::<S>))
    .route("/users/{id}/reset",     post(users::reset::<S>))
    .route("/users/{id}/update",    post(users::update::<S>))
    .route("/users/{id}/delete",    post(users::delete::<S>))
    .with_state(state)
    .layer(sessions)
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
  use std::io::{Cursor, Read as _};

  use axum::{
    body::Body,
    http::{Request, Response, StatusCode, header},
  };
  use congvan_core::{
    filter::RecordFilter,
    record::NewRecord,
    status::Status,
    store::{RecordStore as _, UserStore as _},
  };
  use congvan_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  pub(crate) fn config() -> ServerConfig {
    ServerConfig {
      host:                    "127.0.0.1".to_string(),
      port:                    8000,
      database_path:           PathBuf::from(":memory:"),
      secret_key:              "test secret".to_string(),
      admin_username:          "admin".to_string(),
      admin_password:          "admin123".to_string(),
      staff_username:          "nhanvien".to_string(),
      staff_password:          "nhanvien123".to_string(),
      page_size:               20,
      export_requires_filters: false,
      secure_cookies:          false,
    }
  }

  async fn make_state_with(config: ServerConfig) -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    auth::seed_users(&store, &config).await.unwrap();
    AppState::new(store, config)
  }

  async fn make_state() -> AppState<SqliteStore> { make_state_with(config()).await }

  /// Drives the router one request at a time, carrying the session cookie.
  struct Client {
    state:  AppState<SqliteStore>,
    cookie: Option<String>,
  }

  impl Client {
    fn new(state: &AppState<SqliteStore>) -> Self {
      Self { state: state.clone(), cookie: None }
    }

    async fn send(&mut self, method: &str, uri: &str, form: Option<&str>) -> Response<Body> {
      let mut builder = Request::builder().method(method).uri(uri);
      if let Some(cookie) = &self.cookie {
        builder = builder.header(header::COOKIE, cookie);
      }
      let body = match form {
        Some(form) => {
          builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
          Body::from(form.to_string())
        }
        None => Body::empty(),
      };

      let res = router(self.state.clone())
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
      if let Some(set) = res.headers().get(header::SET_COOKIE) {
        let pair = set.to_str().unwrap().split(';').next().unwrap();
        self.cookie = Some(pair.to_string());
      }
      res
    }

    async fn get(&mut self, uri: &str) -> Response<Body> { self.send("GET", uri, None).await }

    async fn post(&mut self, uri: &str, form: &str) -> Response<Body> {
      self.send("POST", uri, Some(form)).await
    }

    async fn login(&mut self, username: &str, password: &str) -> Response<Body> {
      self
        .post("/login", &format!("username={username}&password={password}"))
        .await
    }

    async fn admin(state: &AppState<SqliteStore>) -> Self {
      let mut client = Self::new(state);
      let res = client.login("admin", "admin123").await;
      assert_eq!(location(&res), "/");
      client
    }

    async fn staff(state: &AppState<SqliteStore>) -> Self {
      let mut client = Self::new(state);
      let res = client.get("/quick_login").await;
      assert_eq!(location(&res), "/");
      client
    }
  }

  fn location(res: &Response<Body>) -> &str {
    res.headers()
      .get(header::LOCATION)
      .map(|v| v.to_str().unwrap())
      .unwrap_or_default()
  }

  async fn text(res: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
  }

  async fn seed_record(state: &AppState<SqliteStore>, name: &str, status: Status) -> i64 {
    let input = NewRecord {
      name: Some(name.to_string()),
      category: Some("Khiếu nại".to_string()),
      ..NewRecord::with_status(status)
    };
    state.store.create_record(input, None).await.unwrap().id
  }

  // ── Health ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn healthz_needs_no_session() {
    let state = make_state().await;
    let res = Client::new(&state).get("/healthz").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(text(res).await, "ok");
  }

  // ── Session ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn anonymous_requests_are_sent_to_login() {
    let state = make_state().await;
    let mut client = Client::new(&state);
    for uri in ["/", "/congvan/1", "/export", "/users"] {
      let res = client.get(uri).await;
      assert_eq!(res.status(), StatusCode::SEE_OTHER, "{uri}");
      assert_eq!(location(&res), "/login", "{uri}");
    }
  }

  #[tokio::test]
  async fn wrong_password_is_flashed() {
    let state = make_state().await;
    let mut client = Client::new(&state);

    let res = client.login("admin", "nope").await;
    assert_eq!(location(&res), "/login");
    let page = text(client.get("/login").await).await;
    assert!(page.contains("Sai tên đăng nhập hoặc mật khẩu."), "{page}");

    assert_eq!(location(&client.get("/").await), "/login");
  }

  #[tokio::test]
  async fn login_then_logout() {
    let state = make_state().await;
    let mut client = Client::admin(&state).await;

    let res = client.get("/").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(text(res).await.contains("admin (admin)"));

    let res = client.get("/logout").await;
    assert_eq!(location(&res), "/login");
    assert_eq!(location(&client.get("/").await), "/login");
  }

  #[tokio::test]
  async fn quick_login_enters_as_staff() {
    let state = make_state().await;
    let mut client = Client::staff(&state).await;
    let page = text(client.get("/").await).await;
    assert!(page.contains("nhanvien (staff)"), "{page}");
    assert!(!page.contains("/congvan/new"));
  }

  #[tokio::test]
  async fn quick_login_without_staff_account_fails() {
    let state = make_state().await;
    let staff = state.store.find_user_by_username("nhanvien").await.unwrap().unwrap();
    state.store.delete_user(staff.id).await.unwrap();

    let mut client = Client::new(&state);
    let res = client.get("/quick_login").await;
    assert_eq!(location(&res), "/login");
    let page = text(client.get("/login").await).await;
    assert!(page.contains("Chưa có tài khoản nhân viên"), "{page}");
  }

  // ── Records ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn admin_creates_edits_and_deletes_a_record() {
    let state = make_state().await;
    let mut client = Client::admin(&state).await;
    let admin = state.store.find_user_by_username("admin").await.unwrap().unwrap();

    let res = client
      .post(
        "/congvan/new",
        "code=CV-01&category=Khieu+nai&name=Tran+Van+B&received_date=04%2F03%2F2025&status=hoan_thanh",
      )
      .await;
    assert_eq!(location(&res), "/");

    let all = state.store.find_records(&RecordFilter::default()).await.unwrap();
    assert_eq!(all.len(), 1);
    let record = &all[0];
    assert_eq!(record.status, "Hoàn thành");
    assert_eq!((record.month, record.year), (Some(3), Some(2025)));
    assert_eq!(record.owner_id, Some(admin.id));

    let id = record.id;
    let res = client
      .post(&format!("/congvan/{id}/edit"), "code=CV-01&name=Tran+Van+B&status=dang+xu+ly")
      .await;
    assert_eq!(location(&res), format!("/congvan/{id}"));
    let record = state.store.get_record(id).await.unwrap().unwrap();
    assert_eq!(record.status, "Đang xử lý");
    assert_eq!(record.category, None);

    let page = text(client.get(&format!("/congvan/{id}")).await).await;
    assert!(page.contains("Đã cập nhật công văn"), "{page}");
    assert!(page.contains("Tran Van B"));

    let res = client.post(&format!("/congvan/{id}/delete"), "").await;
    assert_eq!(location(&res), "/");
    assert!(state.store.get_record(id).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn invalid_submission_is_flashed_and_kept_as_draft() {
    let state = make_state().await;
    let mut client = Client::admin(&state).await;

    let res = client.post("/congvan/new", "code=CV-77&status=bogus").await;
    assert_eq!(location(&res), "/congvan/new");

    let page = text(client.get("/congvan/new").await).await;
    assert!(page.contains("Tình trạng không hợp lệ"), "{page}");
    assert!(page.contains(r#"value="CV-77""#), "{page}");
    assert!(state.store.find_records(&RecordFilter::default()).await.unwrap().is_empty());

    let page = text(client.get("/congvan/new").await).await;
    assert!(!page.contains("CV-77"), "draft is used once");
  }

  #[tokio::test]
  async fn negated_status_is_refused() {
    let state = make_state().await;
    let mut client = Client::admin(&state).await;

    let res = client.post("/congvan/new", "code=CV-78&status=Ch%C6%B0a+ho%C3%A0n+th%C3%A0nh").await;
    assert_eq!(location(&res), "/congvan/new");
    let page = text(client.get("/congvan/new").await).await;
    assert!(page.contains("Tình trạng không hợp lệ"), "{page}");
    assert!(state.store.find_records(&RecordFilter::default()).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn duplicate_code_in_the_same_month_is_refused() {
    let state = make_state().await;
    let mut client = Client::admin(&state).await;
    let form = "code=CV-09&month=5&year=2025&status=chua_thu";

    assert_eq!(location(&client.post("/congvan/new", form).await), "/");
    assert_eq!(location(&client.post("/congvan/new", form).await), "/congvan/new");
    let page = text(client.get("/congvan/new").await).await;
    assert!(page.contains("Mã công văn đã tồn tại trong tháng này."), "{page}");

    let other_month = "code=CV-09&month=6&year=2025&status=chua_thu";
    assert_eq!(location(&client.post("/congvan/new", other_month).await), "/");
  }

  #[tokio::test]
  async fn staff_cannot_delete_records() {
    let state = make_state().await;
    let id = seed_record(&state, "Nguyễn Văn An", Status::ChuaThu).await;
    let mut client = Client::staff(&state).await;

    let res = client.post(&format!("/congvan/{id}/delete"), "").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(state.store.get_record(id).await.unwrap().is_some());

    let res = client.get(&format!("/congvan/{id}")).await;
    assert_eq!(res.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn unknown_record_is_not_found() {
    let state = make_state().await;
    let mut client = Client::admin(&state).await;
    assert_eq!(client.get("/congvan/999").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(client.post("/congvan/999/delete", "").await.status(), StatusCode::NOT_FOUND);
  }

  // ── Dashboard ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn dashboard_filters_by_status_bucket() {
    let state = make_state().await;
    seed_record(&state, "Nguyễn Văn An", Status::ChuaThu).await;
    seed_record(&state, "Lê Thị Hoa", Status::HoanThanh).await;
    let mut client = Client::staff(&state).await;

    let page = text(client.get("/?tinh_trang=chua_thu").await).await;
    assert!(page.contains("Nguyễn Văn An"), "{page}");
    assert!(!page.contains("Lê Thị Hoa"), "{page}");
  }

  #[tokio::test]
  async fn dashboard_paginates() {
    let mut config = config();
    config.page_size = 2;
    let state = make_state_with(config).await;
    for i in 0..5 {
      seed_record(&state, &format!("Khách {i}"), Status::HoanThanh).await;
    }
    let mut client = Client::staff(&state).await;

    let page = text(client.get("/?page=3").await).await;
    assert!(page.contains("Trang 3/3 (5 công văn)"), "{page}");
    assert!(page.contains("Khách 0"));
    assert!(!page.contains("Khách 4"));
  }

  #[tokio::test]
  async fn dashboard_page_past_the_end_shows_last_page() {
    let mut config = config();
    config.page_size = 2;
    let state = make_state_with(config).await;
    for i in 0..5 {
      seed_record(&state, &format!("Khách {i}"), Status::HoanThanh).await;
    }
    let mut client = Client::staff(&state).await;

    let page = text(client.get("/?page=9").await).await;
    assert!(page.contains("Trang 3/3 (5 công văn)"), "{page}");
    assert!(page.contains("Khách 0"), "{page}");
  }

  // ── Export ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn export_with_nothing_to_export_redirects() {
    let state = make_state().await;
    let mut client = Client::staff(&state).await;

    let res = client.get("/export").await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
    let page = text(client.get("/").await).await;
    assert!(page.contains("Không có công văn nào để xuất."), "{page}");
  }

  #[tokio::test]
  async fn export_returns_a_workbook() {
    let state = make_state().await;
    seed_record(&state, "Nguyễn Văn An", Status::ChuaThu).await;
    seed_record(&state, "Lê Thị Hoa", Status::HoanThanh).await;
    let mut client = Client::staff(&state).await;

    let res = client.get("/export?tinh_trang=chua_thu").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_TYPE], congvan_xlsx::XLSX_CONTENT_TYPE);
    let disposition = res.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment; filename=\"congvan_"), "{disposition}");
    assert!(disposition.ends_with(".xlsx\""), "{disposition}");

    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let mut xml = String::new();
    archive
      .by_name("xl/worksheets/sheet1.xml")
      .unwrap()
      .read_to_string(&mut xml)
      .unwrap();
    assert!(xml.contains("Nguyễn Văn An"));
    assert!(!xml.contains("Lê Thị Hoa"));
  }

  #[tokio::test]
  async fn export_can_require_category_and_status() {
    let mut config = config();
    config.export_requires_filters = true;
    let state = make_state_with(config).await;
    seed_record(&state, "Nguyễn Văn An", Status::ChuaThu).await;
    let mut client = Client::staff(&state).await;

    let res = client.get("/export?tinh_trang=chua_thu").await;
    assert_eq!(location(&res), "/?tinh_trang=chua_thu");

    let res = client.get("/export?loai=Khi%E1%BA%BFu+n%E1%BA%A1i&tinh_trang=chua_thu").await;
    assert_eq!(res.status(), StatusCode::OK);
  }

  // ── Users ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn staff_cannot_manage_users() {
    let state = make_state().await;
    let mut client = Client::staff(&state).await;
    assert_eq!(client.get("/users").await.status(), StatusCode::FORBIDDEN);
    assert_eq!(
      client.post("/users", "username=x&password=y").await.status(),
      StatusCode::FORBIDDEN,
    );
  }

  #[tokio::test]
  async fn admin_cannot_delete_or_demote_themselves() {
    let state = make_state().await;
    let admin = state.store.find_user_by_username("admin").await.unwrap().unwrap();
    let mut client = Client::admin(&state).await;

    let res = client.post(&format!("/users/{}/delete", admin.id), "").await;
    assert_eq!(location(&res), "/users");
    let res = client.post(&format!("/users/{}/update", admin.id), "role=staff").await;
    assert_eq!(location(&res), "/users");

    let page = text(client.get("/users").await).await;
    assert!(page.contains("Không thể xóa tài khoản đang đăng nhập."), "{page}");
    assert!(page.contains("Không thể tự hạ quyền quản trị"), "{page}");

    let admin = state.store.get_user(admin.id).await.unwrap().unwrap();
    assert_eq!(admin.role, congvan_core::user::Role::Admin);
  }

  #[tokio::test]
  async fn admin_manages_accounts() {
    let state = make_state().await;
    let mut client = Client::admin(&state).await;

    let res = client.post("/users", "username=thu&password=pw1").await;
    assert_eq!(location(&res), "/users");
    let thu = state.store.find_user_by_username("thu").await.unwrap().unwrap();
    assert_eq!(thu.role, congvan_core::user::Role::Staff);

    client.post("/users", "username=thu&password=pw2").await;
    let page = text(client.get("/users").await).await;
    assert!(page.contains("Tên đăng nhập đã tồn tại."), "{page}");

    client.post(&format!("/users/{}/reset", thu.id), "password=moi").await;
    let mut other = Client::new(&state);
    assert_eq!(location(&other.login("thu", "moi").await), "/");

    client.post(&format!("/users/{}/update", thu.id), "role=admin").await;
    assert!(state.store.get_user(thu.id).await.unwrap().unwrap().is_admin());

    let res = client.post(&format!("/users/{}/delete", thu.id), "").await;
    assert_eq!(location(&res), "/users");
    assert!(state.store.get_user(thu.id).await.unwrap().is_none());
    assert_eq!(location(&other.get("/").await), "/login");

    assert_eq!(
      client.post("/users/9999/delete", "").await.status(),
      StatusCode::NOT_FOUND,
    );
  }

  #[tokio::test]
  async fn whitespace_password_is_refused() {
    let state = make_state().await;
    let mut client = Client::admin(&state).await;

    client.post("/users", "username=blank&password=+++").await;
    assert!(state.store.find_user_by_username("blank").await.unwrap().is_none());
    let page = text(client.get("/users").await).await;
    assert!(page.contains("Vui lòng nhập tên đăng nhập và mật khẩu."), "{page}");

    client.post("/users", "username=thu&password=pw1").await;
    let thu = state.store.find_user_by_username("thu").await.unwrap().unwrap();
    client.post(&format!("/users/{}/reset", thu.id), "password=%20%09").await;
    let page = text(client.get("/users").await).await;
    assert!(page.contains("Mật khẩu mới không được để trống."), "{page}");
    let mut other = Client::new(&state);
    assert_eq!(location(&other.login("thu", "pw1").await), "/");
  }
}
