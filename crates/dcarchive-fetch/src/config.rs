//! Discovery configuration.
//!
//! Offsets and ranges drift as upstream publishes builds, so none of them are
//! hard-coded in the strategies. [`DiscoveryConfig::default`] carries the
//! values the archive is currently populated with.

use std::collections::HashSet;

use dcarchive_types::Platform;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::prober::RedirectMode;
use crate::strategy::{RangeProbeConfig, RedirectResolveConfig, Strategy};

pub const WINDOWS_LATEST_URL: &str =
    "https://discord.com/api/downloads/distributions/app/installers/latest?channel=stable&platform=win&arch=x64";
pub const WINDOWS_INSTALLER_TEMPLATE: &str =
    "https://stable.dl2.discordapp.net/distro/app/stable/win/x64/{version}/DiscordSetup.exe";
pub const MAC_BASE_URL: &str = "https://stable.dl2.discordapp.net/apps/osx";
pub const LINUX_BASE_URL: &str = "https://stable.dl2.discordapp.net/apps/linux";

fn default_module_concurrency() -> usize {
    12
}

/// One discovery lane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformTarget {
    pub platform: Platform,
    pub strategy: Strategy,
    /// Base URL modules are probed under. Without one the build is archived
    /// with every module marked unavailable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Upper bound on concurrent module probes across all lanes.
    #[serde(default = "default_module_concurrency")]
    pub module_concurrency: usize,
    pub targets: Vec<PlatformTarget>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            module_concurrency: default_module_concurrency(),
            targets: vec![
                PlatformTarget {
                    platform: Platform::Windows,
                    strategy: Strategy::RedirectResolve(RedirectResolveConfig {
                        latest_url: WINDOWS_LATEST_URL.to_owned(),
                        redirect_mode: RedirectMode::Location,
                        installer_template: WINDOWS_INSTALLER_TEMPLATE.to_owned(),
                        max_steps: 200,
                        max_hits: Some(329),
                    }),
                    module_base_url: None,
                },
                PlatformTarget {
                    platform: Platform::Mac,
                    strategy: Strategy::RangeProbe(RangeProbeConfig {
                        base_url: MAC_BASE_URL.to_owned(),
                        start: 329,
                        steps: 330,
                        artifact_template: "{base}/{version}/Discord.dmg".to_owned(),
                        max_hits: None,
                    }),
                    module_base_url: Some(MAC_BASE_URL.to_owned()),
                },
                PlatformTarget {
                    platform: Platform::Linux,
                    strategy: Strategy::RangeProbe(RangeProbeConfig {
                        base_url: LINUX_BASE_URL.to_owned(),
                        start: 77,
                        steps: 78,
                        artifact_template: "{base}/{version}/discord-{version}.deb".to_owned(),
                        max_hits: None,
                    }),
                    module_base_url: Some(LINUX_BASE_URL.to_owned()),
                },
            ],
        }
    }
}

impl DiscoveryConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, FetchError> {
        let config: Self = toml::from_str(input).map_err(|e| FetchError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, FetchError> {
        toml::to_string_pretty(self).map_err(|e| FetchError::Config {
            message: e.to_string(),
        })
    }

    /// Each platform may appear once and every template must be usable.
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.module_concurrency == 0 {
            return Err(FetchError::Config {
                message: "module_concurrency must be at least 1".to_owned(),
            });
        }
        let mut seen = HashSet::new();
        for target in &self.targets {
            if !seen.insert(target.platform) {
                return Err(FetchError::Config {
                    message: format!("platform {} is configured more than once", target.platform),
                });
            }
            target.strategy.validate()?;
        }
        Ok(())
    }
}
