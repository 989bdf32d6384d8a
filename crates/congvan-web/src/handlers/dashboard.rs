//! `GET /`: filtered, paginated list plus the status buckets and the
//! monthly completion breakdown.
//!
//! Query failures degrade to empty results with a banner instead of an
//! error page.

use axum::{
  extract::{Query, State},
  response::Html,
};
use congvan_core::{
  filter::{FilterParams, RecordFilter},
  page::{Page, PageRequest},
  report::Report,
  store::{RecordStore, UserStore},
};
use tower_sessions::Session;

use crate::{
  AppState,
  auth::CurrentUser,
  error::Error,
  flash,
  views::{self, Dashboard},
};

const QUERY_FAILED: &str = "Không tải được dữ liệu, kết quả có thể không đầy đủ.";

pub async fn handler<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  session: Session,
  Query(params): Query<FilterParams>,
) -> Result<Html<String>, Error>
where
  S: RecordStore + UserStore + Clone + 'static,
{
  let filter = RecordFilter::from_params(&params);
  let request = PageRequest::new(params.page(), state.config.per_page());
  let mut banner = None;

  let page = match state.store.page_records(&filter, request).await {
    Ok(page) => page,
    Err(e) => {
      tracing::error!(error = %e, ?filter, "record query failed");
      banner = Some(QUERY_FAILED);
      Page::empty(request.per_page)
    }
  };

  let everything = RecordFilter::default();
  let report = match state.store.find_records(&everything).await {
    Ok(all) => Report::compute(&all),
    Err(e) => {
      tracing::error!(error = %e, "report query failed");
      banner = Some(QUERY_FAILED);
      Report::default()
    }
  };

  let categories = state.store.list_categories().await.unwrap_or_else(|e| {
    tracing::warn!(error = %e, "category query failed");
    Vec::new()
  });

  let flashes = flash::take(&session).await?;

  Ok(views::dashboard(&Dashboard {
    user: &user,
    flashes: &flashes,
    params: &params,
    page: &page,
    report: &report,
    categories: &categories,
    banner,
  }))
}
