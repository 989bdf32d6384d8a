//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings; calendar dates are `YYYY-MM-DD`.

use chrono::{DateTime, NaiveDate, Utc};
use congvan_core::{
  record::Record,
  user::{Role, User},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn decode_role(s: &str) -> Result<Role> {
  Role::parse(s).map_err(|e| Error::Decode(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawRecord::from_row`].
pub const RECORD_COLUMNS: &str = "id, code, category, month, year, customer_code, name, \
   address, staff, content, notes, result, received_date, status, owner_id, \
   created_at, updated_at";

/// Raw values read directly from a `records` row.
pub struct RawRecord {
  pub id:            i64,
  pub code:          Option<String>,
  pub category:      Option<String>,
  pub month:         Option<i64>,
  pub year:          Option<i64>,
  pub customer_code: Option<String>,
  pub name:          Option<String>,
  pub address:       Option<String>,
  pub staff:         Option<String>,
  pub content:       Option<String>,
  pub notes:         Option<String>,
  pub result:        Option<String>,
  pub received_date: Option<String>,
  pub status:        String,
  pub owner_id:      Option<i64>,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      code:          row.get(1)?,
      category:      row.get(2)?,
      month:         row.get(3)?,
      year:          row.get(4)?,
      customer_code: row.get(5)?,
      name:          row.get(6)?,
      address:       row.get(7)?,
      staff:         row.get(8)?,
      content:       row.get(9)?,
      notes:         row.get(10)?,
      result:        row.get(11)?,
      received_date: row.get(12)?,
      status:        row.get(13)?,
      owner_id:      row.get(14)?,
      created_at:    row.get(15)?,
      updated_at:    row.get(16)?,
    })
  }

  pub fn into_record(self) -> Result<Record> {
    let month = self
      .month
      .map(|m| u32::try_from(m).map_err(|_| Error::Decode(format!("month {m}"))))
      .transpose()?;
    let year = self
      .year
      .map(|y| i32::try_from(y).map_err(|_| Error::Decode(format!("year {y}"))))
      .transpose()?;

    Ok(Record {
      id: self.id,
      code: self.code,
      category: self.category,
      month,
      year,
      customer_code: self.customer_code,
      name: self.name,
      address: self.address,
      staff: self.staff,
      content: self.content,
      notes: self.notes,
      result: self.result,
      received_date: self.received_date.as_deref().map(decode_date).transpose()?,
      status: self.status,
      owner_id: self.owner_id,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Column list matching [`RawUser::from_row`].
pub const USER_COLUMNS: &str = "id, username, password_hash, role, created_at";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub id:            i64,
  pub username:      String,
  pub password_hash: String,
  pub role:          String,
  pub created_at:    String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      username:      row.get(1)?,
      password_hash: row.get(2)?,
      role:          row.get(3)?,
      created_at:    row.get(4)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:            self.id,
      username:      self.username,
      password_hash: self.password_hash,
      role:          decode_role(&self.role)?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
