//! Core types and trait definitions for the công văn register.
//!
//! Nothing here knows about HTTP or SQL. The store traits are implemented
//! by `congvan-store-sqlite` and consumed by `congvan-web`.

// Store traits declare their futures `Send` explicitly.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod filter;
pub mod page;
pub mod record;
pub mod report;
pub mod status;
pub mod store;
pub mod user;

pub use error::{Error, Result};
