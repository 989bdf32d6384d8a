//! `GET /export`: the filtered record set as an `.xlsx` attachment.

use axum::{
  extract::{Query, State},
  http::header,
  response::{IntoResponse, Redirect, Response},
};
use chrono::Local;
use congvan_core::{
  filter::{FilterParams, RecordFilter},
  store::{RecordStore, UserStore},
};
use congvan_xlsx::XLSX_CONTENT_TYPE;
use tower_sessions::Session;

use crate::{AppState, auth::CurrentUser, error::Error, flash, handlers::dashboard_url};

pub async fn handler<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  session: Session,
  Query(params): Query<FilterParams>,
) -> Result<Response, Error>
where
  S: RecordStore + UserStore + Clone + 'static,
{
  let filter = RecordFilter::from_params(&params);
  let back = Redirect::to(&dashboard_url(&params));

  if state.config.export_requires_filters
    && (filter.category.is_none() || filter.status.is_none())
  {
    flash::error(&session, "Vui lòng chọn loại đơn thư và tình trạng trước khi xuất Excel.").await?;
    return Ok(back.into_response());
  }

  let records = match state.store.find_records(&filter).await {
    Ok(records) => records,
    Err(e) => {
      tracing::error!(error = %e, ?filter, "export query failed");
      flash::error(&session, "Không tải được dữ liệu để xuất, vui lòng thử lại.").await?;
      return Ok(back.into_response());
    }
  };

  if records.is_empty() {
    flash::error(&session, "Không có công văn nào để xuất.").await?;
    return Ok(back.into_response());
  }

  let bytes = congvan_xlsx::export_records(&records)?;
  let filename = format!("congvan_{}.xlsx", Local::now().format("%Y%m%d_%H%M%S"));
  tracing::info!(by = %user.username, rows = records.len(), %filename, "export");

  Ok(
    (
      [
        (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_owned()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
      ],
      bytes,
    )
      .into_response(),
  )
}
