//! Database setup and reset commands.

use anyhow::bail;
use tracing::info;

use crate::config::Config;
use crate::db::BuildStore;
use crate::db::sqlite::SqliteStore;

/// Create the database if needed and apply pending migrations.
pub async fn setup(cfg: &Config) -> anyhow::Result<()> {
    let store = SqliteStore::connect(cfg.require_database_url()?).await?;
    let builds = store.count_builds(None).await?;
    store.close().await;
    info!(builds, "database ready");
    Ok(())
}

/// Delete every archived build and module.
pub async fn nuke(cfg: &Config, confirmed: bool) -> anyhow::Result<()> {
    if !confirmed {
        bail!("refusing to delete the archive without --yes");
    }
    let store = SqliteStore::connect(cfg.require_database_url()?).await?;
    let builds = store.clear().await?;
    store.close().await;
    info!(builds, "archive cleared");
    Ok(())
}
