//! Per-platform discovery strategies.

use dcarchive_types::{DiscoveredBuild, Platform, VersionTriple};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::FetchError;
use crate::prober::{Probe, RedirectMode};
use crate::range::{probe_counter_range, probe_patch_range};
use crate::resolve::{LatestVersion, resolve_latest};

/// Learn the current version from a redirecting "latest" endpoint, then walk
/// the patch component downwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectResolveConfig {
    pub latest_url: String,
    #[serde(default)]
    pub redirect_mode: RedirectMode,
    /// Per-version installer URL; `{version}` is substituted.
    pub installer_template: String,
    pub max_steps: u32,
    /// Stop after this many confirmed builds; unbounded when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hits: Option<usize>,
}

/// Walk a `0.0.N` counter downwards from a known high-water mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeProbeConfig {
    pub base_url: String,
    pub start: u32,
    pub steps: u32,
    /// Per-version artifact URL; `{base}` and `{version}` are substituted.
    pub artifact_template: String,
    /// Stop after this many confirmed builds; unbounded when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hits: Option<usize>,
}

fn max_hits(configured: Option<usize>) -> usize {
    configured.unwrap_or(usize::MAX)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    RedirectResolve(RedirectResolveConfig),
    RangeProbe(RangeProbeConfig),
}

impl Strategy {
    pub fn validate(&self) -> Result<(), FetchError> {
        let template = match self {
            Strategy::RedirectResolve(c) => &c.installer_template,
            Strategy::RangeProbe(c) => &c.artifact_template,
        };
        if !template.contains("{version}") {
            return Err(FetchError::Config {
                message: format!("URL template {template:?} has no {{version}} placeholder"),
            });
        }
        Ok(())
    }

    /// Confirmed builds for `platform`, newest first.
    ///
    /// `Ok(None)` means the platform is skipped for this run because its
    /// latest version could not be resolved or is not a `major.minor.patch`
    /// triple.
    pub async fn discover(
        &self,
        probe: &dyn Probe,
        platform: Platform,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<DiscoveredBuild>>, FetchError> {
        match self {
            Strategy::RedirectResolve(c) => {
                let latest = resolve_latest(probe, &c.latest_url, c.redirect_mode).await;
                let version = match &latest {
                    LatestVersion::Resolved { version, .. } => version,
                    LatestVersion::Unresolved { reason } => {
                        warn!(%platform, %reason, "skipping platform for this run");
                        return Ok(None);
                    }
                };
                if let Err(e) = version.parse::<VersionTriple>() {
                    warn!(%platform, latest = %version, error = %e, "skipping platform for this run");
                    return Ok(None);
                }
                info!(%platform, latest = %version, "walking patch versions");
                probe_patch_range(probe, platform, version, &c.installer_template, c.max_steps, max_hits(c.max_hits), cancel)
                    .await
                    .map(Some)
            }
            Strategy::RangeProbe(c) => {
                info!(%platform, start = c.start, steps = c.steps, "walking counter versions");
                probe_counter_range(
                    probe,
                    platform,
                    &c.base_url,
                    &c.artifact_template,
                    c.start,
                    c.steps,
                    max_hits(c.max_hits),
                    cancel,
                )
                .await
                .map(Some)
            }
        }
    }
}
