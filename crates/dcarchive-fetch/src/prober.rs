//! HEAD-based existence checks against the distribution CDN.

use std::time::Duration;

use async_trait::async_trait;
use dcarchive_types::ProbeResult;
use reqwest::header::{CONTENT_LENGTH, ETAG, HeaderMap, LOCATION};
use reqwest::{Client, redirect};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FetchError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_MAX_REDIRECTS: usize = 3;

/// How a redirecting "latest" endpoint is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectMode {
    /// Follow the chain (bounded) and read the terminal URL.
    Follow,
    /// Issue a single non-following request and read its `Location` header.
    #[default]
    Location,
}

/// Where a redirecting endpoint pointed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub url: String,
    /// Metadata of the terminal response. Always a miss in
    /// [`RedirectMode::Location`], which never requests the target.
    pub probe: ProbeResult,
}

/// An existence check.
///
/// Implementations must never fail: timeouts, connection errors and non-2xx
/// responses are all reported as [`ProbeResult::missing`].
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeResult;

    async fn resolve_redirect(&self, url: &str, mode: RedirectMode) -> Option<RedirectTarget>;
}

#[derive(Debug, Clone)]
pub struct ProbeOptions {
    pub timeout: Duration,
    pub max_redirects: usize,
    pub user_agent: String,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: concat!("dcarchive-fetch/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

/// [`Probe`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpProber {
    following: Client,
    direct: Client,
}

impl HttpProber {
    pub fn new(options: ProbeOptions) -> Result<Self, FetchError> {
        let following = Client::builder()
            .user_agent(options.user_agent.clone())
            .timeout(options.timeout)
            .redirect(redirect::Policy::limited(options.max_redirects))
            .build()?;
        let direct = Client::builder()
            .user_agent(options.user_agent)
            .timeout(options.timeout)
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(Self { following, direct })
    }
}

#[async_trait]
impl Probe for HttpProber {
    async fn probe(&self, url: &str) -> ProbeResult {
        let response = match self.following.head(url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(%url, error = %e, "probe failed");
                return ProbeResult::missing();
            }
        };
        if !response.status().is_success() {
            debug!(%url, status = response.status().as_u16(), "probe miss");
            return ProbeResult::missing();
        }
        probe_from_headers(response.headers())
    }

    async fn resolve_redirect(&self, url: &str, mode: RedirectMode) -> Option<RedirectTarget> {
        match mode {
            RedirectMode::Follow => {
                let response = self
                    .following
                    .head(url)
                    .send()
                    .await
                    .inspect_err(|e| debug!(%url, error = %e, "redirect chain failed"))
                    .ok()?;
                if !response.status().is_success() {
                    debug!(%url, status = response.status().as_u16(), "redirect chain ended in error status");
                    return None;
                }
                Some(RedirectTarget {
                    url: response.url().to_string(),
                    probe: probe_from_headers(response.headers()),
                })
            }
            RedirectMode::Location => {
                let response = self
                    .direct
                    .get(url)
                    .send()
                    .await
                    .inspect_err(|e| debug!(%url, error = %e, "redirect request failed"))
                    .ok()?;
                let status = response.status();
                if status.is_client_error() || status.is_server_error() {
                    debug!(%url, status = status.as_u16(), "redirect request rejected");
                    return None;
                }
                let location = response.headers().get(LOCATION)?.to_str().ok()?;
                let target = response.url().join(location).ok()?;
                Some(RedirectTarget {
                    url: target.to_string(),
                    probe: ProbeResult::missing(),
                })
            }
        }
    }
}

fn probe_from_headers(headers: &HeaderMap) -> ProbeResult {
    // `Response::content_length` reflects the (empty) HEAD body, so the header
    // is read directly.
    let size = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(0);
    let etag = headers
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(normalize_etag)
        .unwrap_or_default();
    ProbeResult::found(size, etag)
}

/// Strips one pair of surrounding quotes; a weak `W/` prefix is kept.
fn normalize_etag(raw: &str) -> String {
    let raw = raw.trim();
    let (weak, tag) = match raw.strip_prefix("W/") {
        Some(rest) => ("W/", rest),
        None => ("", raw),
    };
    let tag = tag
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(tag);
    format!("{weak}{tag}")
}
