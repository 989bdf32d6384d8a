//! Pagination request and result types.

use serde::Serialize;

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  pub page:     u32,
  pub per_page: u32,
}

impl PageRequest {
  /// Page numbers below 1 are treated as 1; `per_page` is at least 1.
  pub fn new(page: u32, per_page: u32) -> Self {
    Self { page: page.max(1), per_page: per_page.max(1) }
  }

  pub fn offset(&self) -> u64 { u64::from(self.page - 1) * u64::from(self.per_page) }

  pub fn limit(&self) -> u64 { u64::from(self.per_page) }

  /// Pull a page past the end back to the last page holding `total` rows.
  pub fn clamp_to(self, total: u64) -> Self {
    let last = total.div_ceil(u64::from(self.per_page)).max(1);
    let last = u32::try_from(last).unwrap_or(u32::MAX);
    Self { page: self.page.min(last), ..self }
  }
}

/// One page of results plus the total count across all pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
  pub items:    Vec<T>,
  pub page:     u32,
  pub per_page: u32,
  pub total:    u64,
}

impl<T> Page<T> {
  /// Zero items on a single page; shown when the query could not run.
  pub fn empty(per_page: u32) -> Self {
    Self { items: Vec::new(), page: 1, per_page: per_page.max(1), total: 0 }
  }

  /// Number of pages, never less than one.
  pub fn pages(&self) -> u32 {
    let per = u64::from(self.per_page.max(1));
    (self.total.div_ceil(per)).max(1) as u32
  }

  pub fn has_prev(&self) -> bool { self.page > 1 }

  pub fn has_next(&self) -> bool { self.page < self.pages() }
}
