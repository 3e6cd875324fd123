//! Discovery and archive records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{MODULE_CATALOG, is_catalog_module};
use crate::error::TypeError;
use crate::platform::Platform;
use crate::PLACEHOLDER;

/// A hypothesised build that has not been confirmed to exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionCandidate {
    pub platform: Platform,
    pub version: String,
    pub source_url: String,
}

/// Outcome of one existence check.
///
/// A miss is an ordinary value, not an error: most candidates of a range walk
/// do not exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub exists: bool,
    pub byte_size: u64,
    pub etag: String,
}

impl ProbeResult {
    pub fn missing() -> Self {
        Self::default()
    }

    /// A zero-length artifact is reported as missing.
    pub fn found(byte_size: u64, etag: impl Into<String>) -> Self {
        if byte_size == 0 {
            return Self::missing();
        }
        Self {
            exists: true,
            byte_size,
            etag: etag.into(),
        }
    }
}

/// A candidate that probed as existing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredBuild {
    pub candidate: VersionCandidate,
    pub probe: ProbeResult,
}

/// Metadata for one downloadable module of one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub platform: Platform,
    pub version: String,
    pub module_name: String,
    pub download_size: u64,
    pub mirror_size: u64,
    pub download_etag: String,
    pub mirror_etag: String,
    pub download_link: String,
    pub mirror_link: Option<String>,
}

impl ModuleRecord {
    /// Builds a record from a confirmed probe of `download_link`. Mirror
    /// fields carry placeholders.
    pub fn from_probe(
        platform: Platform,
        version: impl Into<String>,
        module_name: impl Into<String>,
        download_link: impl Into<String>,
        probe: &ProbeResult,
    ) -> Self {
        Self {
            platform,
            version: version.into(),
            module_name: module_name.into(),
            download_size: probe.byte_size,
            mirror_size: 0,
            download_etag: probe.etag.clone(),
            mirror_etag: String::new(),
            download_link: download_link.into(),
            mirror_link: Some(PLACEHOLDER.to_owned()),
        }
    }
}

/// One archived build, unique per `(platform, version)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    pub platform: Platform,
    pub version: String,
    pub installer_link: String,
    pub installer_size: u64,
    pub installer_etag: String,
    pub mirror_link: String,
    pub mirror_size: u64,
    pub mirror_etag: String,
    pub download_all_mod_link: String,
    pub download_all_mod_size: u64,
    pub download_all_mod_etag: String,
    pub custom_install_link: String,
    pub custom_install_size: u64,
    pub custom_install_etag: String,
    pub nekocord_time_machine_link: String,
    /// Exactly one entry per catalog module; `None` when the module could not
    /// be found for this build.
    pub modules: BTreeMap<String, Option<ModuleRecord>>,
}

impl BuildRecord {
    /// A record for a confirmed installer with every placeholder field set and
    /// every catalog module marked unavailable.
    pub fn new_installer(
        platform: Platform,
        version: impl Into<String>,
        installer_link: impl Into<String>,
        probe: &ProbeResult,
    ) -> Self {
        Self {
            platform,
            version: version.into(),
            installer_link: installer_link.into(),
            installer_size: probe.byte_size,
            installer_etag: probe.etag.clone(),
            mirror_link: PLACEHOLDER.to_owned(),
            mirror_size: 0,
            mirror_etag: String::new(),
            download_all_mod_link: PLACEHOLDER.to_owned(),
            download_all_mod_size: 0,
            download_all_mod_etag: String::new(),
            custom_install_link: PLACEHOLDER.to_owned(),
            custom_install_size: 0,
            custom_install_etag: String::new(),
            nekocord_time_machine_link: PLACEHOLDER.to_owned(),
            modules: empty_module_map(),
        }
    }

    pub fn from_discovered(build: &DiscoveredBuild) -> Self {
        Self::new_installer(
            build.candidate.platform,
            build.candidate.version.clone(),
            build.candidate.source_url.clone(),
            &build.probe,
        )
    }

    pub fn set_module(&mut self, name: &str, record: Option<ModuleRecord>) -> Result<(), TypeError> {
        if !is_catalog_module(name) {
            return Err(TypeError::UnknownModule(name.to_owned()));
        }
        self.modules.insert(name.to_owned(), record);
        Ok(())
    }

    /// Restores missing catalog keys as `None` and drops keys outside the
    /// catalog.
    pub fn normalize_modules(&mut self) {
        self.modules.retain(|name, _| is_catalog_module(name));
        for name in MODULE_CATALOG {
            self.modules.entry(name.to_owned()).or_insert(None);
        }
    }

    /// Confirmed modules only.
    pub fn found_modules(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.modules.values().flatten()
    }
}

/// A module map with every catalog key present and unavailable.
pub fn empty_module_map() -> BTreeMap<String, Option<ModuleRecord>> {
    MODULE_CATALOG
        .iter()
        .map(|name| ((*name).to_owned(), None))
        .collect()
}
