//! SQL scalar functions registered on every connection.
//!
//! SQLite's built-in `lower()` and `LIKE` only fold ASCII, which is useless
//! for Vietnamese text, and status classification needs the same tolerant
//! normaliser the application uses. Both are exposed to SQL here so that
//! filtering and pagination stay in the database.
//!
//! - `fold(text)`: Unicode lowercase, `NULL` passes through.
//! - `status_bucket(text)`: bucket code (`chua_thu`, …) or `NULL`.

use congvan_core::status::{Status, fold_case};
use rusqlite::{Connection, functions::FunctionFlags};

pub fn register(conn: &Connection) -> rusqlite::Result<()> {
  let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

  conn.create_scalar_function("fold", 1, flags, |ctx| {
    let s: Option<String> = ctx.get(0)?;
    Ok(s.map(|s| fold_case(&s)))
  })?;

  conn.create_scalar_function("status_bucket", 1, flags, |ctx| {
    let s: Option<String> = ctx.get(0)?;
    Ok(s.as_deref().and_then(Status::classify).map(Status::code))
  })?;

  Ok(())
}
