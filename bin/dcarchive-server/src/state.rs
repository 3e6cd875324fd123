//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use dcarchive_fetch::Probe;

use crate::config::Config;
use crate::db::sqlite::SqliteStore;

#[derive(Clone)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// The build archive.
    pub store: Arc<SqliteStore>,
    /// Live prober used by `GET /api/latest`.
    pub prober: Arc<dyn Probe>,
}
