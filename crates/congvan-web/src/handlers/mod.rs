//! Route handlers, one module per area of the site.

pub mod dashboard;
pub mod export;
pub mod health;
pub mod records;
pub mod session;
pub mod users;

use congvan_core::filter::FilterParams;

use crate::views::query_string;

/// The dashboard URL that reproduces the filters in `params`.
pub(crate) fn dashboard_url(params: &FilterParams) -> String {
  let pairs = params.pairs();
  if pairs.is_empty() {
    "/".to_owned()
  } else {
    format!("/?{}", query_string(pairs))
  }
}
