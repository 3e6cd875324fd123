//! One discovery pass, run from the command line.

use std::sync::Arc;

use dcarchive_fetch::{Discovery, HttpProber, MemorySink, RunReport};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::sqlite::SqliteStore;

/// Discover every configured platform and upsert the results.
///
/// With `dry_run` the records go to an in-memory sink and are printed as
/// JSON instead. Ctrl-C cancels the pass; records already written stay.
pub async fn run(cfg: &Config, dry_run: bool) -> anyhow::Result<RunReport> {
    let discovery_cfg = cfg.load_discovery()?;

    // Connect before the first probe so a bad database aborts cheaply.
    let store = if dry_run {
        None
    } else {
        let url = cfg.require_database_url()?;
        let store = SqliteStore::connect(url).await?;
        info!(database_url = %url, "database ready");
        Some(store)
    };

    let prober = Arc::new(HttpProber::new(cfg.probe_options())?);
    let discovery = Discovery::from_config(prober, discovery_cfg);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling discovery");
            on_interrupt.cancel();
        }
    });

    let outcome = match &store {
        Some(store) => discovery.run(store, cancel).await,
        None => {
            let sink = MemorySink::new();
            let outcome = discovery.run(&sink, cancel).await;
            if outcome.is_ok() {
                println!("{}", serde_json::to_string_pretty(&sink.builds().await)?);
            }
            outcome
        }
    };

    watcher.abort();
    if let Some(store) = store {
        store.close().await;
    }

    let report = outcome?;
    for lane in &report.lanes {
        info!(
            platform = %lane.platform,
            skipped = lane.skipped,
            builds = lane.builds,
            modules = lane.modules,
            "lane finished"
        );
    }
    info!(
        builds = report.total_builds(),
        modules = report.total_modules(),
        "discovery finished"
    );
    Ok(report)
}
