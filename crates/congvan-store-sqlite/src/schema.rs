//! SQL schema for the SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,               -- argon2 PHC string
    role          TEXT NOT NULL CHECK (role IN ('admin', 'staff')),
    created_at    TEXT NOT NULL                -- RFC 3339 UTC
);

-- Status is free text: rows written before the vocabulary was enforced
-- carry whatever was typed. Reads classify it with status_bucket().
CREATE TABLE IF NOT EXISTS records (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    code          TEXT,
    category      TEXT,
    month         INTEGER CHECK (month BETWEEN 1 AND 12),
    year          INTEGER,
    customer_code TEXT,
    name          TEXT,
    address       TEXT,
    staff         TEXT,
    content       TEXT,
    notes         TEXT,
    result        TEXT,
    received_date TEXT,                        -- YYYY-MM-DD
    status        TEXT NOT NULL,
    owner_id      INTEGER REFERENCES users(id) ON DELETE SET NULL,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

-- A missing month or year counts as one period, not as distinct NULLs.
DROP INDEX IF EXISTS records_code_period_idx;
CREATE UNIQUE INDEX IF NOT EXISTS records_code_period_key
    ON records(code, coalesce(month, 0), coalesce(year, 0)) WHERE code IS NOT NULL;
CREATE INDEX IF NOT EXISTS records_period_idx   ON records(year, month);
CREATE INDEX IF NOT EXISTS records_category_idx ON records(category);

PRAGMA user_version = 2;
";
