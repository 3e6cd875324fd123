//! Response types for the live "latest build" lookup (`/api/latest`).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The newest published build of one platform, as the CDN reports it now.
///
/// Only the installer fields are resolved live; the remaining links are
/// empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LatestBuildResponse {
    /// The resolved version, or `"Error fetching version"`.
    pub version: String,
    pub installer_link: String,
    pub installer_size: u64,
    pub installer_etag: String,
    pub mirror_link: String,
    pub download_all_mod_link: String,
    pub custom_install_link: String,
    pub nekocord_time_machine_link: String,
}

/// Response body for `GET /api/latest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LatestResponse {
    pub windows: LatestBuildResponse,
    pub mac: LatestBuildResponse,
    pub linux: LatestBuildResponse,
}
