//! The processing-status vocabulary and its tolerant classifier.
//!
//! Statuses are stored as free text. New writes always store one of the
//! canonical labels below, but historical rows carry whatever was typed, so
//! every read goes through [`Status::classify`] rather than string equality.

use serde::{Deserialize, Serialize};
use unicode_normalization::{UnicodeNormalization as _, char::is_combining_mark};

use crate::error::{Error, Result};

/// One of the three recognised status buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
  /// "Chưa thu": not yet collected.
  ChuaThu,
  /// "Đang xử lý": in progress.
  DangXuLy,
  /// "Hoàn thành": completed.
  HoanThanh,
}

impl Status {
  pub const ALL: [Status; 3] = [Status::ChuaThu, Status::DangXuLy, Status::HoanThanh];

  /// The canonical label written to the store.
  pub fn label(self) -> &'static str {
    match self {
      Status::ChuaThu => "Chưa thu",
      Status::DangXuLy => "Đang xử lý",
      Status::HoanThanh => "Hoàn thành",
    }
  }

  /// Short code used by the SQL `status_bucket` function and in URLs.
  pub fn code(self) -> &'static str {
    match self {
      Status::ChuaThu => "chua_thu",
      Status::DangXuLy => "dang_xu_ly",
      Status::HoanThanh => "hoan_thanh",
    }
  }

  pub fn from_code(code: &str) -> Option<Status> {
    Status::ALL.into_iter().find(|s| s.code() == code)
  }

  /// Classify arbitrary stored text into a bucket.
  ///
  /// Case, diacritics and repeated whitespace are ignored. Anything carrying
  /// "chưa" ("not yet") is never completed or in progress, so "chưa xong" and
  /// "chưa xử lý" land in the not-collected bucket. Completed is tested
  /// before in-progress so that "đã xử lý" does not match via "xu ly".
  pub fn classify(raw: &str) -> Option<Status> {
    let norm = normalize(raw);
    if norm.is_empty() {
      return None;
    }
    if let Some(status) = Status::from_code(&norm.replace(' ', "_")) {
      return Some(status);
    }
    if norm.split(' ').any(|word| word == "chua") {
      Some(Status::ChuaThu)
    } else if ["hoan thanh", "xong", "da xu ly"].iter().any(|k| norm.contains(k)) {
      Some(Status::HoanThanh)
    } else if ["dang xu ly", "dang", "xu ly"].iter().any(|k| norm.contains(k)) {
      Some(Status::DangXuLy)
    } else {
      None
    }
  }

  /// Parse a submitted status, accepting only a canonical label or code.
  ///
  /// Case, diacritics and spacing are still forgiven, but free text that
  /// [`Status::classify`] would guess at is rejected.
  pub fn parse(raw: &str) -> Result<Status> {
    let norm = normalize(raw);
    Status::ALL
      .into_iter()
      .find(|s| norm == normalize(s.label()) || norm.replace(' ', "_") == s.code())
      .ok_or_else(|| Error::UnknownStatus(raw.trim().to_owned()))
  }
}

impl std::fmt::Display for Status {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

/// Lowercase, strip diacritics and collapse whitespace.
///
/// `đ` has no canonical decomposition, so it is mapped to `d` explicitly.
pub fn normalize(raw: &str) -> String {
  let stripped: String = raw
    .nfd()
    .filter(|c| !is_combining_mark(*c))
    .map(|c| match c {
      'đ' | 'Đ' => 'd',
      other => other,
    })
    .collect();
  stripped
    .to_lowercase()
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
}

/// Unicode-aware lowercase used for case-insensitive substring filters.
pub fn fold_case(raw: &str) -> String { raw.to_lowercase() }
