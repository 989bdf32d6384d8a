//! Liveness check. Does not touch the store.

pub async fn handler() -> &'static str { "ok" }
