//! [`SqliteStore`]: the SQLite implementation of the record and user stores.

use std::path::Path;

use chrono::Utc;
use congvan_core::{
  filter::{CategoryFilter, RecordFilter, StatusFilter},
  page::{Page, PageRequest},
  record::{NewRecord, Record},
  status::fold_case,
  store::{RecordStore, Store, UserStore},
  user::{NewUser, Role, User},
};
use rusqlite::{OptionalExtension as _, types::Value};

use crate::{
  Error, Result,
  encode::{RECORD_COLUMNS, RawRecord, RawUser, USER_COLUMNS, encode_date, encode_dt},
  functions,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A register backed by a single SQLite file.
///
/// Clones share one connection thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init().await?;
    Ok(store)
  }

  /// A private in-memory database, gone when the last clone drops.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init().await?;
    Ok(store)
  }

  async fn init(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        functions::register(conn)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("sqlite schema initialised");
    Ok(())
  }

  #[cfg(test)]
  pub(crate) fn conn_for_tests(&self) -> &tokio_rusqlite::Connection { &self.conn }
}

// ─── Query building ──────────────────────────────────────────────────────────

/// Translate a filter into a `WHERE` clause and its positional parameters.
///
/// Substring criteria compare `fold()`ed columns against a pre-folded
/// needle, so matching is case-insensitive beyond ASCII.
fn where_clause(filter: &RecordFilter) -> (String, Vec<Value>) {
  let mut conds: Vec<&'static str> = vec![];
  let mut params: Vec<Value> = vec![];

  let mut contains = |column: &'static str, needle: &Option<String>| {
    if let Some(n) = needle {
      conds.push(column);
      params.push(Value::Text(fold_case(n)));
    }
  };
  contains("instr(fold(customer_code), ?) > 0", &filter.customer_code);
  contains("instr(fold(name), ?) > 0", &filter.name);
  contains("instr(fold(address), ?) > 0", &filter.address);
  contains("instr(fold(content), ?) > 0", &filter.keyword);

  match &filter.category {
    Some(CategoryFilter::Exact(c)) => {
      conds.push("category = ?");
      params.push(Value::Text(c.clone()));
    }
    Some(CategoryFilter::Unset) => {
      conds.push("(category IS NULL OR trim(category) = '')");
    }
    None => {}
  }

  if let Some(m) = filter.month {
    conds.push("month = ?");
    params.push(Value::Integer(i64::from(m)));
  }
  if let Some(y) = filter.year {
    conds.push("year = ?");
    params.push(Value::Integer(i64::from(y)));
  }

  match &filter.status {
    Some(StatusFilter::Bucket(b)) => {
      conds.push("status_bucket(status) = ?");
      params.push(Value::Text(b.code().to_owned()));
    }
    Some(StatusFilter::Contains(s)) => {
      conds.push("instr(fold(status), ?) > 0");
      params.push(Value::Text(fold_case(s)));
    }
    None => {}
  }

  let clause = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  };
  (clause, params)
}

/// Positional values for the editable columns, in `UPDATE`/`INSERT` order.
fn record_values(input: &NewRecord) -> Vec<Value> {
  let text = |v: &Option<String>| v.clone().map_or(Value::Null, Value::Text);
  vec![
    text(&input.code),
    text(&input.category),
    input.month.map_or(Value::Null, |m| Value::Integer(i64::from(m))),
    input.year.map_or(Value::Null, |y| Value::Integer(i64::from(y))),
    text(&input.customer_code),
    text(&input.name),
    text(&input.address),
    text(&input.staff),
    text(&input.content),
    text(&input.notes),
    text(&input.result),
    input.received_date.map_or(Value::Null, |d| Value::Text(encode_date(d))),
    Value::Text(input.status.label().to_owned()),
  ]
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl Store for SqliteStore {
  type Error = Error;
}

impl RecordStore for SqliteStore {
  async fn create_record(&self, input: NewRecord, owner_id: Option<i64>) -> Result<Record> {
    let now = encode_dt(Utc::now());
    let mut values = record_values(&input);
    values.push(owner_id.map_or(Value::Null, Value::Integer));
    values.push(Value::Text(now.clone()));
    values.push(Value::Text(now));

    let raw: RawRecord = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO records (
             code, category, month, year, customer_code, name, address, staff,
             content, notes, result, received_date, status,
             owner_id, created_at, updated_at
           ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
          rusqlite::params_from_iter(values),
        )?;
        let id = tx.last_insert_rowid();
        let raw = tx.query_row(
          &format!("SELECT {RECORD_COLUMNS} FROM records WHERE id = ?1"),
          rusqlite::params![id],
          RawRecord::from_row,
        )?;
        tx.commit()?;
        Ok(raw)
      })
      .await
      .map_err(Error::from_write)?;

    raw.into_record()
  }

  async fn get_record(&self, id: i64) -> Result<Option<Record>> {
    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {RECORD_COLUMNS} FROM records WHERE id = ?1"),
              rusqlite::params![id],
              RawRecord::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  async fn update_record(&self, id: i64, input: NewRecord) -> Result<Option<Record>> {
    let mut values = record_values(&input);
    values.push(Value::Text(encode_dt(Utc::now())));
    values.push(Value::Integer(id));

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE records SET
             code = ?, category = ?, month = ?, year = ?, customer_code = ?,
             name = ?, address = ?, staff = ?, content = ?, notes = ?,
             result = ?, received_date = ?, status = ?, updated_at = ?
           WHERE id = ?",
          rusqlite::params_from_iter(values),
        )?;
        let raw = if changed == 0 {
          None
        } else {
          Some(tx.query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM records WHERE id = ?1"),
            rusqlite::params![id],
            RawRecord::from_row,
          )?)
        };
        tx.commit()?;
        Ok(raw)
      })
      .await
      .map_err(Error::from_write)?;

    raw.map(RawRecord::into_record).transpose()
  }

  async fn delete_record(&self, id: i64) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM records WHERE id = ?1", rusqlite::params![id])?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn find_records(&self, filter: &RecordFilter) -> Result<Vec<Record>> {
    let (clause, params) = where_clause(filter);

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM records {clause} ORDER BY id DESC");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }

  async fn page_records(&self, filter: &RecordFilter, page: PageRequest) -> Result<Page<Record>> {
    let (clause, params) = where_clause(filter);

    let (total, page, raws): (i64, PageRequest, Vec<RawRecord>) = self
      .conn
      .call(move |conn| {
        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM records {clause}"),
          rusqlite::params_from_iter(params.iter()),
          |r| r.get(0),
        )?;

        let page = page.clamp_to(total.max(0) as u64);
        let sql = format!(
          "SELECT {RECORD_COLUMNS} FROM records {clause}
           ORDER BY id DESC LIMIT {} OFFSET {}",
          page.limit(),
          page.offset(),
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((total, page, rows))
      })
      .await?;

    Ok(Page {
      items:    raws.into_iter().map(RawRecord::into_record).collect::<Result<_>>()?,
      page:     page.page,
      per_page: page.per_page,
      total:    total.max(0) as u64,
    })
  }

  async fn list_categories(&self) -> Result<Vec<String>> {
    let categories = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT trim(category) AS c FROM records
           WHERE category IS NOT NULL AND trim(category) <> ''
           ORDER BY c",
        )?;
        let rows = stmt
          .query_map([], |r| r.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(categories)
  }
}

// ─── UserStore impl ──────────────────────────────────────────────────────────

impl UserStore for SqliteStore {
  async fn create_user(&self, input: NewUser) -> Result<User> {
    let at_str = encode_dt(Utc::now());

    let raw: RawUser = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO users (username, password_hash, role, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![input.username, input.password_hash, input.role.as_str(), at_str],
        )?;
        let id = tx.last_insert_rowid();
        let raw = tx.query_row(
          &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
          rusqlite::params![id],
          RawUser::from_row,
        )?;
        tx.commit()?;
        Ok(raw)
      })
      .await
      .map_err(Error::from_write)?;

    raw.into_user()
  }

  async fn get_user(&self, id: i64) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
              rusqlite::params![id],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
    let username = username.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
              rusqlite::params![username],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_COLUMNS} FROM users ORDER BY id DESC"
        ))?;
        let rows = stmt
          .query_map([], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn set_password_hash(&self, id: i64, password_hash: String) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET password_hash = ?1 WHERE id = ?2",
          rusqlite::params![password_hash, id],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn set_role(&self, id: i64, role: Role) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET role = ?1 WHERE id = ?2",
          rusqlite::params![role.as_str(), id],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn delete_user(&self, id: i64) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM users WHERE id = ?1", rusqlite::params![id])?)
      })
      .await?;
    Ok(changed > 0)
  }
}
