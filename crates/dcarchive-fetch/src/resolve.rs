//! Redirect resolution of a platform's "latest" endpoint.

use dcarchive_types::UNRESOLVED_VERSION;
use tracing::{info, warn};

use crate::extract::extract_version;
use crate::prober::{Probe, RedirectMode, RedirectTarget};

/// Outcome of resolving a "latest" endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LatestVersion {
    Resolved { version: String, target: RedirectTarget },
    /// The platform is skipped for this run.
    Unresolved { reason: String },
}

impl LatestVersion {
    pub fn version(&self) -> Option<&str> {
        match self {
            LatestVersion::Resolved { version, .. } => Some(version),
            LatestVersion::Unresolved { .. } => None,
        }
    }

    /// The resolved version, or [`UNRESOLVED_VERSION`].
    pub fn as_str(&self) -> &str {
        self.version().unwrap_or(UNRESOLVED_VERSION)
    }
}

/// Follows (or reads) the redirect of `latest_url` and extracts the version
/// from where it points. Never fails.
pub async fn resolve_latest(probe: &dyn Probe, latest_url: &str, mode: RedirectMode) -> LatestVersion {
    let Some(target) = probe.resolve_redirect(latest_url, mode).await else {
        warn!(url = %latest_url, ?mode, "latest endpoint did not redirect");
        return LatestVersion::Unresolved {
            reason: format!("no redirect target for {latest_url}"),
        };
    };

    match extract_version(&target.url) {
        Some(version) => {
            info!(url = %latest_url, %version, "resolved latest version");
            LatestVersion::Resolved { version, target }
        }
        None => {
            warn!(url = %latest_url, target = %target.url, "no version in redirect target");
            LatestVersion::Unresolved {
                reason: format!("no version in redirect target {}", target.url),
            }
        }
    }
}
