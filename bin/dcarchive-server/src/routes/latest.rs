//! Live lookup of each platform's newest published build.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use dcarchive_fetch::{Probe, RedirectMode, extract_version_or_unknown};
use dcarchive_types::{UNKNOWN_VERSION, UNRESOLVED_VERSION};
use tracing::warn;
use utoipa::OpenApi;

use crate::schemas::latest::{LatestBuildResponse, LatestResponse};
use crate::state::AppState;

/// Shared caches may serve a lookup for an hour and keep serving it for a
/// day while revalidating.
pub const LATEST_CACHE_CONTROL: &str = "public, s-maxage=3600, stale-while-revalidate=86400";

#[derive(OpenApi)]
#[openapi(paths(get_latest), components(schemas(LatestResponse, LatestBuildResponse)))]
pub struct LatestApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/latest", get(get_latest))
}

/// Resolve the newest build of every platform (`GET /api/latest`).
///
/// A platform whose download endpoint does not redirect reports
/// `"Error fetching version"`; the request itself still succeeds.
#[utoipa::path(
    get,
    path = "/api/latest",
    tag = "latest",
    responses(
        (status = 200, description = "Newest build per platform", body = LatestResponse)
    )
)]
pub async fn get_latest(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let urls = &state.config.latest_urls;
    let prober = state.prober.as_ref();
    let (windows, mac, linux) = tokio::join!(
        latest_build(prober, &urls.windows),
        latest_build(prober, &urls.mac),
        latest_build(prober, &urls.linux),
    );

    (
        [(header::CACHE_CONTROL, LATEST_CACHE_CONTROL)],
        Json(LatestResponse { windows, mac, linux }),
    )
}

/// An endpoint without a redirect reports [`UNRESOLVED_VERSION`] and links
/// the endpoint itself. A redirect whose target carries no version reports
/// [`UNKNOWN_VERSION`] with the target's link, size and ETag.
async fn latest_build(probe: &dyn Probe, url: &str) -> LatestBuildResponse {
    let (version, installer_link, installer_size, installer_etag) =
        match probe.resolve_redirect(url, RedirectMode::Follow).await {
            Some(target) => {
                let version = extract_version_or_unknown(&target.url);
                if version == UNKNOWN_VERSION {
                    warn!(%url, target = %target.url, "no version in redirect target");
                }
                (version, target.url, target.probe.byte_size, target.probe.etag)
            }
            None => {
                warn!(%url, "latest endpoint did not redirect");
                (UNRESOLVED_VERSION.to_owned(), url.to_owned(), 0, String::new())
            }
        };

    LatestBuildResponse {
        version,
        installer_link,
        installer_size,
        installer_etag,
        mirror_link: String::new(),
        download_all_mod_link: String::new(),
        custom_install_link: String::new(),
        nekocord_time_machine_link: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::{StatusCode, header};

    use super::LATEST_CACHE_CONTROL;
    use crate::config::{LINUX_DOWNLOAD_URL, MAC_DOWNLOAD_URL, WINDOWS_DOWNLOAD_URL};
    use crate::routes::test_support::{self, StaticProbe};

    const WIN_INSTALLER: &str =
        "https://stable.dl2.discordapp.net/distro/app/stable/win/x64/1.0.9028/DiscordSetup.exe";
    const MAC_DMG: &str = "https://stable.dl2.discordapp.net/apps/osx/0.0.329/Discord.dmg";

    #[tokio::test]
    async fn resolves_each_platform() {
        let probe = StaticProbe::default()
            .with_redirect(WINDOWS_DOWNLOAD_URL, WIN_INSTALLER, 104_857_600, "\"w\"")
            .with_redirect(MAC_DOWNLOAD_URL, MAC_DMG, 200_000_000, "\"m\"");
        let state = test_support::state(Arc::new(probe)).await;

        let response = test_support::get(state, "/api/latest").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], LATEST_CACHE_CONTROL);

        let body = test_support::json(response).await;
        assert_eq!(body["windows"]["version"], "1.0.9028");
        assert_eq!(body["windows"]["installerLink"], WIN_INSTALLER);
        assert_eq!(body["windows"]["installerSize"], 104_857_600);
        assert_eq!(body["windows"]["installerEtag"], "\"w\"");
        assert_eq!(body["mac"]["version"], "0.0.329");
        assert_eq!(body["mac"]["mirrorLink"], "");
    }

    #[tokio::test]
    async fn unresolved_platform_reports_error_version() {
        let state = test_support::state(Arc::new(StaticProbe::default())).await;
        let body = test_support::json(test_support::get(state, "/api/latest").await).await;

        for platform in ["windows", "mac", "linux"] {
            assert_eq!(body[platform]["version"], "Error fetching version");
            assert_eq!(body[platform]["installerSize"], 0);
        }
        assert_eq!(body["windows"]["installerLink"], WINDOWS_DOWNLOAD_URL);
        assert_eq!(body["mac"]["installerLink"], MAC_DOWNLOAD_URL);
        assert_eq!(body["linux"]["installerLink"], LINUX_DOWNLOAD_URL);
    }

    #[tokio::test]
    async fn versionless_target_reports_unknown_version() {
        let target = "https://stable.dl2.discordapp.net/download/Discord.dmg";
        let upstream = StaticProbe::default().with_redirect(MAC_DOWNLOAD_URL, target, 150_000_000, "\"d\"");
        let state = test_support::state(Arc::new(upstream)).await;
        let body = test_support::json(test_support::get(state, "/api/latest").await).await;

        assert_eq!(body["mac"]["version"], "Unknown Version");
        assert_eq!(body["mac"]["installerLink"], target);
        assert_eq!(body["mac"]["installerSize"], 150_000_000);
        assert_eq!(body["mac"]["installerEtag"], "\"d\"");
        assert_eq!(body["windows"]["version"], "Error fetching version");
    }
}
