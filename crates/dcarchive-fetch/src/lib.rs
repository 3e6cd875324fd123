//! Version discovery and probing engine.
//!
//! Given a handful of URL templates per platform, [`Discovery`] resolves the
//! latest published builds, walks bounded ranges of speculative versions with
//! cheap existence checks, enumerates each build's modules and hands the
//! normalised records to an [`ArchiveSink`].
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), dcarchive_fetch::FetchError> {
//! use std::sync::Arc;
//! use dcarchive_fetch::{Discovery, DiscoveryConfig, HttpProber, MemorySink, ProbeOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! let prober = Arc::new(HttpProber::new(ProbeOptions::default())?);
//! let discovery = Discovery::from_config(prober, DiscoveryConfig::default());
//! let sink = MemorySink::new();
//! let report = discovery.run(&sink, CancellationToken::new()).await?;
//! println!("{} builds", report.total_builds());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod modules;
pub mod prober;
pub mod range;
pub mod resolve;
pub mod sink;
pub mod strategy;

pub use config::{DiscoveryConfig, PlatformTarget};
pub use discovery::{Discovery, LaneReport, RunReport};
pub use error::{FetchError, SinkError};
pub use extract::{extract_version, extract_version_or_unknown};
pub use modules::{ModuleEnumerator, module_url};
pub use prober::{HttpProber, Probe, ProbeOptions, RedirectMode, RedirectTarget};
pub use range::{probe_counter_range, probe_patch_range};
pub use resolve::{LatestVersion, resolve_latest};
pub use sink::{ArchiveSink, MemorySink};
pub use strategy::{RangeProbeConfig, RedirectResolveConfig, Strategy};

#[cfg(test)]
pub(crate) mod testing;
