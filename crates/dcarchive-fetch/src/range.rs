//! Bounded backward walks over speculative versions.
//!
//! Every step is an independent probe. A miss never ends the walk: builds are
//! regularly pulled from the CDN, leaving gaps.

use dcarchive_types::{DiscoveredBuild, Platform, ProbeResult, VersionCandidate, VersionTriple};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::FetchError;
use crate::prober::Probe;

/// Substitutes `{base}` and `{version}` in a URL template.
pub(crate) fn render_template(template: &str, base: &str, version: &str) -> String {
    template
        .replace("{base}", base.trim_end_matches('/'))
        .replace("{version}", version)
}

/// Probes `url`, giving up as soon as `cancel` fires.
pub(crate) async fn probe_or_cancel(
    probe: &dyn Probe,
    url: &str,
    cancel: &CancellationToken,
) -> Result<ProbeResult, FetchError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FetchError::Cancelled),
        result = probe.probe(url) => Ok(result),
    }
}

async fn check_candidate(
    probe: &dyn Probe,
    candidate: VersionCandidate,
    cancel: &CancellationToken,
) -> Result<Option<DiscoveredBuild>, FetchError> {
    let result = probe_or_cancel(probe, &candidate.source_url, cancel).await?;
    if result.exists {
        info!(
            platform = %candidate.platform,
            version = %candidate.version,
            size = result.byte_size,
            etag = %result.etag,
            "installer is downloadable"
        );
        Ok(Some(DiscoveredBuild {
            candidate,
            probe: result,
        }))
    } else {
        debug!(platform = %candidate.platform, version = %candidate.version, "no installer available");
        Ok(None)
    }
}

/// Walks the patch component of `latest` downwards.
///
/// Stops after `max_steps` probes, once `max_hits` builds were confirmed, or
/// when the patch would drop below zero. `installer_template` is rendered with
/// `{version}`.
pub async fn probe_patch_range(
    probe: &dyn Probe,
    platform: Platform,
    latest: &str,
    installer_template: &str,
    max_steps: u32,
    max_hits: usize,
    cancel: &CancellationToken,
) -> Result<Vec<DiscoveredBuild>, FetchError> {
    let latest: VersionTriple = latest.parse().map_err(|_| FetchError::MalformedVersion {
        version: latest.to_owned(),
    })?;

    let mut found = Vec::new();
    for step in 0..max_steps {
        if found.len() >= max_hits {
            break;
        }
        let Some(version) = latest.decrement_patch(step) else {
            break;
        };
        let version = version.to_string();
        let candidate = VersionCandidate {
            platform,
            source_url: render_template(installer_template, "", &version),
            version,
        };
        if let Some(build) = check_candidate(probe, candidate, cancel).await? {
            found.push(build);
        }
    }
    Ok(found)
}

/// Walks a flat `0.0.N` counter from `0.0.start` down through `steps`
/// candidates (never below `0.0.0`).
///
/// `artifact_template` is rendered with `{base}` = `base_url` and `{version}`.
#[allow(clippy::too_many_arguments)]
pub async fn probe_counter_range(
    probe: &dyn Probe,
    platform: Platform,
    base_url: &str,
    artifact_template: &str,
    start: u32,
    steps: u32,
    max_hits: usize,
    cancel: &CancellationToken,
) -> Result<Vec<DiscoveredBuild>, FetchError> {
    let mut found = Vec::new();
    if steps == 0 {
        return Ok(found);
    }
    let lowest = start.saturating_sub(steps - 1);

    for n in (lowest..=start).rev() {
        if found.len() >= max_hits {
            break;
        }
        let version = VersionTriple::counter(n).to_string();
        let candidate = VersionCandidate {
            platform,
            source_url: render_template(artifact_template, base_url, &version),
            version,
        };
        if let Some(build) = check_candidate(probe, candidate, cancel).await? {
            found.push(build);
        }
    }
    Ok(found)
}
