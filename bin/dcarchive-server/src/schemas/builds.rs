//! Request / response types for the archive listing (`/api/builds`).

use std::collections::BTreeMap;

use dcarchive_types::{BuildRecord, ModuleRecord, Pagination};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for `GET /api/builds`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BuildsQuery {
    /// `windows`, `mac` or `linux`; every platform when omitted.
    pub platform: Option<String>,
    /// 1-based page number (default `1`).
    pub page: Option<u64>,
}

/// One downloadable module of a build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModuleResponse {
    pub version: String,
    #[serde(rename = "module_name")]
    pub module_name: String,
    pub download_size: u64,
    pub mirror_size: u64,
    pub download_etag: String,
    pub mirror_etag: String,
    pub download_link: String,
    pub mirror_link: Option<String>,
}

impl From<ModuleRecord> for ModuleResponse {
    fn from(m: ModuleRecord) -> Self {
        Self {
            version: m.version,
            module_name: m.module_name,
            download_size: m.download_size,
            mirror_size: m.mirror_size,
            download_etag: m.download_etag,
            mirror_etag: m.mirror_etag,
            download_link: m.download_link,
            mirror_link: m.mirror_link,
        }
    }
}

/// One archived build with all of its catalog modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildResponse {
    pub platform: String,
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
    /// Every catalog module; `null` when unavailable for this build.
    #[schema(value_type = BTreeMap<String, ModuleResponse>)]
    pub modules: BTreeMap<String, Option<ModuleResponse>>,
}

impl From<BuildRecord> for BuildResponse {
    fn from(b: BuildRecord) -> Self {
        Self {
            platform: b.platform.to_string(),
            version: b.version,
            installer_link: b.installer_link,
            installer_size: b.installer_size,
            installer_etag: b.installer_etag,
            mirror_link: b.mirror_link,
            mirror_size: b.mirror_size,
            mirror_etag: b.mirror_etag,
            download_all_mod_link: b.download_all_mod_link,
            download_all_mod_size: b.download_all_mod_size,
            download_all_mod_etag: b.download_all_mod_etag,
            custom_install_link: b.custom_install_link,
            custom_install_size: b.custom_install_size,
            custom_install_etag: b.custom_install_etag,
            nekocord_time_machine_link: b.nekocord_time_machine_link,
            modules: b
                .modules
                .into_iter()
                .map(|(name, module)| (name, module.map(ModuleResponse::from)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationResponse {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub pages: u64,
}

impl From<Pagination> for PaginationResponse {
    fn from(p: Pagination) -> Self {
        Self {
            total: p.total,
            page: p.page,
            limit: p.limit,
            pages: p.pages,
        }
    }
}

/// Response body for `GET /api/builds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BuildListResponse {
    pub builds: Vec<BuildResponse>,
    pub pagination: PaginationResponse,
}
