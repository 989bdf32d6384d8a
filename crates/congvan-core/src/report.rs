//! Read-only dashboard views derived from the full record set.
//!
//! Nothing here is stored; every report is recomputed from a fresh read.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{record::Record, status::Status};

/// Label used for completed records that have no category.
pub const UNRECORDED_CATEGORY: &str = "(not recorded)";

/// Completed records per category for the latest month with any completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonthlyBreakdown {
  /// `(year, month)` of the latest completed month, if any.
  pub period:          Option<(i32, u32)>,
  /// `(category, completed count)` sorted by category ascending.
  pub by_category:     Vec<(String, usize)>,
  /// Every record in the month regardless of status.
  pub month_total:     usize,
  pub month_completed: usize,
}

impl MonthlyBreakdown {
  pub fn compute(records: &[Record]) -> Self {
    let latest = records
      .iter()
      .filter(|r| r.bucket() == Some(Status::HoanThanh))
      .filter_map(Record::period)
      .max();

    let Some(period) = latest else {
      return Self::default();
    };

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut month_total = 0;
    let mut month_completed = 0;

    for r in records.iter().filter(|r| r.period() == Some(period)) {
      month_total += 1;
      if r.bucket() != Some(Status::HoanThanh) {
        continue;
      }
      month_completed += 1;
      let category = r
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(UNRECORDED_CATEGORY);
      *counts.entry(category.to_owned()).or_default() += 1;
    }

    Self {
      period: Some(period),
      by_category: counts.into_iter().collect(),
      month_total,
      month_completed,
    }
  }
}

/// Everything the dashboard shows besides the filtered list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
  /// Records not yet collected, newest first.
  pub not_collected: Vec<Record>,
  /// Records in progress, newest first.
  pub in_progress:   Vec<Record>,
  pub breakdown:     MonthlyBreakdown,
}

impl Report {
  /// Derive the report from every record. Input order does not matter.
  pub fn compute(records: &[Record]) -> Self {
    let bucket = |status: Status| {
      let mut v: Vec<Record> = records
        .iter()
        .filter(|r| r.bucket() == Some(status))
        .cloned()
        .collect();
      v.sort_by(|a, b| b.id.cmp(&a.id));
      v
    };

    Self {
      not_collected: bucket(Status::ChuaThu),
      in_progress:   bucket(Status::DangXuLy),
      breakdown:     MonthlyBreakdown::compute(records),
    }
  }
}
