//! Server configuration, loaded from environment variables at startup.

use std::path::PathBuf;
use std::time::Duration;

use dcarchive_fetch::{DiscoveryConfig, ProbeOptions};
use thiserror::Error;

/// Windows' "latest installer" endpoint, followed by `GET /api/latest`.
pub const WINDOWS_DOWNLOAD_URL: &str =
    "https://discord.com/api/downloads/distributions/app/installers/latest?channel=stable&platform=win&arch=x64";
pub const MAC_DOWNLOAD_URL: &str = "https://discord.com/api/download?platform=osx";
pub const LINUX_DOWNLOAD_URL: &str = "https://discord.com/api/download?platform=linux&format=deb";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("failed to read discovery config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Discovery(#[from] dcarchive_fetch::FetchError),
}

/// Per-platform endpoints queried live by `GET /api/latest`.
#[derive(Debug, Clone)]
pub struct LatestUrls {
    pub windows: String,
    pub mac: String,
    pub linux: String,
}

impl Default for LatestUrls {
    fn default() -> Self {
        Self {
            windows: WINDOWS_DOWNLOAD_URL.to_owned(),
            mac: MAC_DOWNLOAD_URL.to_owned(),
            linux: LINUX_DOWNLOAD_URL.to_owned(),
        }
    }
}

/// Runtime configuration for dcarchive-server.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// sqlx SQLite URL, e.g. `"sqlite://dcarchive.db"`. There is no default:
    /// commands that touch the archive refuse to start without it.
    pub database_url: Option<String>,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Comma-separated allowed origins; wildcard when unset.
    pub cors_allowed_origins: Option<String>,

    /// Builds per page on `GET /api/builds`.
    pub page_limit: u64,

    pub probe_timeout_secs: u64,
    pub max_redirects: usize,

    /// TOML file overriding the built-in discovery targets.
    pub discovery_config_path: Option<PathBuf>,

    pub latest_urls: LatestUrls,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_owned(),
            database_url: None,
            log_level: "info".to_owned(),
            log_json: false,
            cors_allowed_origins: None,
            page_limit: 20,
            probe_timeout_secs: 5,
            max_redirects: 3,
            discovery_config_path: None,
            latest_urls: LatestUrls::default(),
        }
    }
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build [`Config`] from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            bind_address: non_empty("DCARCHIVE_BIND").unwrap_or(defaults.bind_address),
            database_url: non_empty("DCARCHIVE_DATABASE_URL"),
            log_level: non_empty("DCARCHIVE_LOG").unwrap_or(defaults.log_level),
            log_json: lookup("DCARCHIVE_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            cors_allowed_origins: non_empty("DCARCHIVE_CORS_ORIGINS"),
            page_limit: parse_or(&lookup, "DCARCHIVE_PAGE_LIMIT", defaults.page_limit).max(1),
            probe_timeout_secs: parse_or(
                &lookup,
                "DCARCHIVE_PROBE_TIMEOUT_SECS",
                defaults.probe_timeout_secs,
            ),
            max_redirects: parse_or(&lookup, "DCARCHIVE_MAX_REDIRECTS", defaults.max_redirects),
            discovery_config_path: non_empty("DCARCHIVE_DISCOVERY_CONFIG").map(PathBuf::from),
            latest_urls: defaults.latest_urls,
        }
    }

    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing("DCARCHIVE_DATABASE_URL"))
    }

    pub fn probe_options(&self) -> ProbeOptions {
        ProbeOptions {
            timeout: Duration::from_secs(self.probe_timeout_secs),
            max_redirects: self.max_redirects,
            ..ProbeOptions::default()
        }
    }

    /// The discovery targets from [`Config::discovery_config_path`], or the
    /// built-in defaults.
    pub fn load_discovery(&self) -> Result<DiscoveryConfig, ConfigError> {
        let Some(path) = &self.discovery_config_path else {
            return Ok(DiscoveryConfig::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Ok(DiscoveryConfig::from_toml_str(&raw)?)
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
