//! Filter criteria over the record register.
//!
//! [`FilterParams`] holds the raw query-string values exactly as submitted.
//! [`RecordFilter::from_params`] turns them into typed criteria, dropping
//! blanks and silently ignoring unparsable numbers. Stores translate the
//! result into a query; [`RecordFilter::matches`] is the same predicate
//! evaluated in memory.

use serde::Deserialize;

use crate::{
  record::{Record, non_blank},
  status::{Status, fold_case},
};

/// Query-string value meaning "category is empty or unset".
pub const EMPTY_CATEGORY: &str = "__empty__";

/// Raw dashboard/export query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
  #[serde(default, rename = "ma_kh", alias = "ma")]
  pub customer_code: Option<String>,
  #[serde(default, rename = "ten")]
  pub name:          Option<String>,
  #[serde(default, rename = "dia_chi")]
  pub address:       Option<String>,
  #[serde(default, rename = "loai")]
  pub category:      Option<String>,
  #[serde(default, rename = "thang")]
  pub month:         Option<String>,
  #[serde(default, rename = "nam")]
  pub year:          Option<String>,
  #[serde(default, rename = "tinh_trang")]
  pub status:        Option<String>,
  #[serde(default)]
  pub q:             Option<String>,
  #[serde(default)]
  pub page:          Option<String>,
}

impl FilterParams {
  /// Requested page number; anything unparsable means page 1.
  pub fn page(&self) -> u32 {
    self
      .page
      .as_deref()
      .and_then(|p| p.trim().parse().ok())
      .unwrap_or(1)
  }

  /// `(name, value)` pairs of every non-blank criterion, in a stable order.
  /// The page number is not included.
  pub fn pairs(&self) -> Vec<(&'static str, &str)> {
    [
      ("ma_kh", &self.customer_code),
      ("ten", &self.name),
      ("dia_chi", &self.address),
      ("loai", &self.category),
      ("thang", &self.month),
      ("nam", &self.year),
      ("tinh_trang", &self.status),
      ("q", &self.q),
    ]
    .into_iter()
    .filter_map(|(k, v)| {
      v.as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| (k, v))
    })
    .collect()
  }
}

/// Category criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
  /// Exact label match.
  Exact(String),
  /// Category is NULL or blank.
  Unset,
}

/// Status criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusFilter {
  /// Stored status classifies into this bucket.
  Bucket(Status),
  /// Case-insensitive substring of the stored text, for values outside the
  /// vocabulary.
  Contains(String),
}

/// Typed conjunction of criteria. `None` imposes no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
  pub customer_code: Option<String>,
  pub name:          Option<String>,
  pub address:       Option<String>,
  pub category:      Option<CategoryFilter>,
  pub month:         Option<u32>,
  pub year:          Option<i32>,
  pub status:        Option<StatusFilter>,
  /// Free-text keyword matched against the content field.
  pub keyword:       Option<String>,
}

impl RecordFilter {
  pub fn from_params(p: &FilterParams) -> Self {
    let text = |v: &Option<String>| v.as_deref().and_then(non_blank);

    let category = text(&p.category).map(|c| {
      if c == EMPTY_CATEGORY {
        CategoryFilter::Unset
      } else {
        CategoryFilter::Exact(c)
      }
    });

    let status = text(&p.status).map(|s| match Status::classify(&s) {
      Some(bucket) => StatusFilter::Bucket(bucket),
      None => StatusFilter::Contains(s),
    });

    Self {
      customer_code: text(&p.customer_code),
      name: text(&p.name),
      address: text(&p.address),
      category,
      month: text(&p.month).and_then(|m| m.parse().ok()),
      year: text(&p.year).and_then(|y| y.parse().ok()),
      status,
      keyword: text(&p.q),
    }
  }

  pub fn only_status(status: Status) -> Self {
    Self { status: Some(StatusFilter::Bucket(status)), ..Self::default() }
  }

  pub fn is_empty(&self) -> bool { *self == Self::default() }

  /// Evaluate the predicate against a single record.
  pub fn matches(&self, r: &Record) -> bool {
    fn contains(field: &Option<String>, needle: &Option<String>) -> bool {
      match needle {
        None => true,
        Some(n) => field
          .as_deref()
          .is_some_and(|f| fold_case(f).contains(&fold_case(n))),
      }
    }

    let category_ok = match &self.category {
      None => true,
      Some(CategoryFilter::Exact(c)) => r.category.as_deref() == Some(c.as_str()),
      Some(CategoryFilter::Unset) => {
        r.category.as_deref().is_none_or(|c| c.trim().is_empty())
      }
    };

    let status_ok = match &self.status {
      None => true,
      Some(StatusFilter::Bucket(b)) => r.bucket() == Some(*b),
      Some(StatusFilter::Contains(s)) => fold_case(&r.status).contains(&fold_case(s)),
    };

    contains(&r.customer_code, &self.customer_code)
      && contains(&r.name, &self.name)
      && contains(&r.address, &self.address)
      && category_ok
      && self.month.is_none_or(|m| r.month == Some(m))
      && self.year.is_none_or(|y| r.year == Some(y))
      && status_ok
      && contains(&r.content, &self.keyword)
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  fn params() -> FilterParams { FilterParams::default() }

  fn record() -> Record {
    Record {
      id:            1,
      code:          Some("CV-01".into()),
      category:      Some("Khiếu nại".into()),
      month:         Some(1),
      year:          Some(2025),
      customer_code: Some("PE0100".into()),
      name:          Some("Nguyễn Văn An".into()),
      address:       Some("12 Lê Lợi".into()),
      staff:         None,
      content:       Some("Đề nghị kiểm tra đồng hồ nước".into()),
      notes:         None,
      result:        None,
      received_date: None,
      status:        "Hoàn Thành".into(),
      owner_id:      None,
      created_at:    Utc::now(),
      updated_at:    Utc::now(),
    }
  }

  #[test]
  fn blank_params_produce_empty_filter() {
    let p = FilterParams {
      name: Some("  ".into()),
      status: Some(String::new()),
      ..params()
    };
    assert!(RecordFilter::from_params(&p).is_empty());
  }

  #[test]
  fn non_numeric_month_and_year_are_ignored() {
    let p = FilterParams {
      month: Some("tháng một".into()),
      year: Some("20x5".into()),
      ..params()
    };
    let f = RecordFilter::from_params(&p);
    assert_eq!(f.month, None);
    assert_eq!(f.year, None);
    assert!(f.is_empty());
  }

  #[test]
  fn sentinel_selects_unset_category() {
    let p = FilterParams { category: Some(EMPTY_CATEGORY.into()), ..params() };
    assert_eq!(
      RecordFilter::from_params(&p).category,
      Some(CategoryFilter::Unset)
    );
  }

  #[test]
  fn recognised_status_becomes_bucket() {
    let p = FilterParams { status: Some("hoan thanh".into()), ..params() };
    assert_eq!(
      RecordFilter::from_params(&p).status,
      Some(StatusFilter::Bucket(Status::HoanThanh))
    );
    let p = FilterParams { status: Some("tạm dừng".into()), ..params() };
    assert_eq!(
      RecordFilter::from_params(&p).status,
      Some(StatusFilter::Contains("tạm dừng".into()))
    );
  }

  #[test]
  fn substring_matching_ignores_case() {
    let f = RecordFilter {
      name: Some("NGUYỄN".into()),
      keyword: Some("đồng hồ".into()),
      ..Default::default()
    };
    assert!(f.matches(&record()));
  }

  #[test]
  fn every_criterion_must_hold() {
    let f = RecordFilter {
      category: Some(CategoryFilter::Exact("Khiếu nại".into())),
      month: Some(2),
      ..Default::default()
    };
    assert!(!f.matches(&record()));
  }

  #[test]
  fn unset_category_matches_blank_only() {
    let f = RecordFilter { category: Some(CategoryFilter::Unset), ..Default::default() };
    assert!(!f.matches(&record()));
    let mut r = record();
    r.category = None;
    assert!(f.matches(&r));
  }

  #[test]
  fn pairs_skip_blank_values() {
    let p = FilterParams {
      name: Some(" An ".into()),
      q: Some(String::new()),
      page: Some("3".into()),
      ..params()
    };
    assert_eq!(p.pairs(), vec![("ten", "An")]);
    assert_eq!(p.page(), 3);
  }
}
