//! Records: entries in the correspondence register.

use chrono::{DateTime, Datelike as _, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  error::{Error, Result},
  status::Status,
};

/// A persisted correspondence record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
  pub id:            i64,
  pub code:          Option<String>,
  pub category:      Option<String>,
  pub month:         Option<u32>,
  pub year:          Option<i32>,
  pub customer_code: Option<String>,
  pub name:          Option<String>,
  pub address:       Option<String>,
  pub staff:         Option<String>,
  pub content:       Option<String>,
  pub notes:         Option<String>,
  pub result:        Option<String>,
  pub received_date: Option<NaiveDate>,
  /// Stored text; may predate the enforced vocabulary.
  pub status:        String,
  pub owner_id:      Option<i64>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl Record {
  /// The bucket this record's stored status falls into, if any.
  pub fn bucket(&self) -> Option<Status> { Status::classify(&self.status) }

  /// `(year, month)` when both are set.
  pub fn period(&self) -> Option<(i32, u32)> { Some((self.year?, self.month?)) }
}

/// Validated field values for creating or replacing a record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
  pub code:          Option<String>,
  pub category:      Option<String>,
  pub month:         Option<u32>,
  pub year:          Option<i32>,
  pub customer_code: Option<String>,
  pub name:          Option<String>,
  pub address:       Option<String>,
  pub staff:         Option<String>,
  pub content:       Option<String>,
  pub notes:         Option<String>,
  pub result:        Option<String>,
  pub received_date: Option<NaiveDate>,
  pub status:        Status,
}

impl NewRecord {
  /// A record with only a status set; mostly useful for fixtures.
  pub fn with_status(status: Status) -> Self {
    Self {
      code:          None,
      category:      None,
      month:         None,
      year:          None,
      customer_code: None,
      name:          None,
      address:       None,
      staff:         None,
      content:       None,
      notes:         None,
      result:        None,
      received_date: None,
      status,
    }
  }
}

/// Raw form fields as submitted. Every field is free text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordInput {
  #[serde(default)]
  pub code:          String,
  #[serde(default)]
  pub category:      String,
  #[serde(default)]
  pub month:         String,
  #[serde(default)]
  pub year:          String,
  #[serde(default)]
  pub customer_code: String,
  #[serde(default)]
  pub name:          String,
  #[serde(default)]
  pub address:       String,
  #[serde(default)]
  pub staff:         String,
  #[serde(default)]
  pub content:       String,
  #[serde(default)]
  pub notes:         String,
  #[serde(default)]
  pub result:        String,
  #[serde(default)]
  pub received_date: String,
  #[serde(default)]
  pub status:        String,
}

impl RecordInput {
  /// Prefill a form from an existing record.
  pub fn from_record(r: &Record) -> Self {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    Self {
      code:          text(&r.code),
      category:      text(&r.category),
      month:         r.month.map(|m| m.to_string()).unwrap_or_default(),
      year:          r.year.map(|y| y.to_string()).unwrap_or_default(),
      customer_code: text(&r.customer_code),
      name:          text(&r.name),
      address:       text(&r.address),
      staff:         text(&r.staff),
      content:       text(&r.content),
      notes:         text(&r.notes),
      result:        text(&r.result),
      received_date: r
        .received_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default(),
      status:        r.bucket().map(Status::code).unwrap_or_default().to_owned(),
    }
  }

  /// Validate and normalise the submission.
  ///
  /// Blank text becomes `None`. When month and year are both blank they are
  /// taken from the received date.
  pub fn validate(&self) -> Result<NewRecord> {
    if self.status.trim().is_empty() {
      return Err(Error::MissingField("tình trạng"));
    }
    let status = Status::parse(&self.status)?;
    let received_date = parse_date(&self.received_date)?;

    let mut month = parse_month(&self.month)?;
    let mut year = parse_year(&self.year)?;
    if month.is_none() && year.is_none()
      && let Some(d) = received_date
    {
      month = Some(d.month());
      year = Some(d.year());
    }

    Ok(NewRecord {
      code: non_blank(&self.code),
      category: non_blank(&self.category),
      month,
      year,
      customer_code: non_blank(&self.customer_code),
      name: non_blank(&self.name),
      address: non_blank(&self.address),
      staff: non_blank(&self.staff),
      content: non_blank(&self.content),
      notes: non_blank(&self.notes),
      result: non_blank(&self.result),
      received_date,
      status,
    })
  }
}

/// Trimmed text, or `None` when empty.
pub fn non_blank(s: &str) -> Option<String> {
  let t = s.trim();
  (!t.is_empty()).then(|| t.to_owned())
}

fn parse_month(s: &str) -> Result<Option<u32>> {
  let Some(t) = non_blank(s) else { return Ok(None) };
  match t.parse::<u32>() {
    Ok(m) if (1..=12).contains(&m) => Ok(Some(m)),
    _ => Err(Error::InvalidMonth(t)),
  }
}

fn parse_year(s: &str) -> Result<Option<i32>> {
  let Some(t) = non_blank(s) else { return Ok(None) };
  match t.parse::<i32>() {
    Ok(y) if (1900..=9999).contains(&y) => Ok(Some(y)),
    _ => Err(Error::InvalidYear(t)),
  }
}

/// Accepts `YYYY-MM-DD` (HTML date inputs) or `DD/MM/YYYY`.
pub fn parse_date(s: &str) -> Result<Option<NaiveDate>> {
  let Some(t) = non_blank(s) else { return Ok(None) };
  NaiveDate::parse_from_str(&t, "%Y-%m-%d")
    .or_else(|_| NaiveDate::parse_from_str(&t, "%d/%m/%Y"))
    .map(Some)
    .map_err(|_| Error::InvalidDate(t))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn input(status: &str) -> RecordInput {
    RecordInput { status: status.into(), ..Default::default() }
  }

  #[test]
  fn blank_fields_become_none() {
    let r = RecordInput { name: "   ".into(), ..input("Chưa thu") }
      .validate()
      .unwrap();
    assert_eq!(r.name, None);
    assert_eq!(r.status, Status::ChuaThu);
  }

  #[test]
  fn status_is_required_and_checked() {
    assert_eq!(input("").validate(), Err(Error::MissingField("tình trạng")));
    assert!(matches!(input("bỏ qua").validate(), Err(Error::UnknownStatus(_))));
  }

  #[test]
  fn month_out_of_range_is_rejected() {
    let r = RecordInput { month: "13".into(), ..input("hoàn thành") }.validate();
    assert_eq!(r, Err(Error::InvalidMonth("13".into())));
    let r = RecordInput { month: "abc".into(), ..input("hoàn thành") }.validate();
    assert_eq!(r, Err(Error::InvalidMonth("abc".into())));
  }

  #[test]
  fn period_derived_from_received_date() {
    let r = RecordInput { received_date: "05/02/2025".into(), ..input("Đang xử lý") }
      .validate()
      .unwrap();
    assert_eq!(r.received_date, NaiveDate::from_ymd_opt(2025, 2, 5));
    assert_eq!((r.year, r.month), (Some(2025), Some(2)));
  }

  #[test]
  fn explicit_period_wins_over_received_date() {
    let r = RecordInput {
      received_date: "2025-02-05".into(),
      month: "1".into(),
      year: "2025".into(),
      ..input("Đang xử lý")
    }
    .validate()
    .unwrap();
    assert_eq!(r.month, Some(1));
  }

  #[test]
  fn bad_date_is_rejected() {
    let r = RecordInput { received_date: "31/02/2025".into(), ..input("Hoàn thành") }.validate();
    assert!(matches!(r, Err(Error::InvalidDate(_))));
  }
}
