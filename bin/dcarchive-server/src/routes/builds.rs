//! Paginated archive listing.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use dcarchive_types::{Pagination, Platform};
use utoipa::OpenApi;

use crate::db::BuildStore;
use crate::error::ServerError;
use crate::schemas::builds::{
    BuildListResponse, BuildResponse, BuildsQuery, ModuleResponse, PaginationResponse,
};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(list_builds, get_build),
    components(schemas(BuildListResponse, BuildResponse, ModuleResponse, PaginationResponse))
)]
pub struct BuildsApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/builds", get(list_builds))
        .route("/builds/{platform}/{version}", get(get_build))
}

fn parse_platform(raw: &str) -> Result<Platform, ServerError> {
    raw.parse()
        .map_err(|_| ServerError::BadRequest(format!("unknown platform: {raw}")))
}

/// List archived builds, newest version first (`GET /api/builds`).
#[utoipa::path(
    get,
    path = "/api/builds",
    tag = "builds",
    params(BuildsQuery),
    responses(
        (status = 200, description = "One page of builds", body = BuildListResponse),
        (status = 400, description = "Unknown platform"),
        (status = 500, description = "Database error"),
    )
)]
pub async fn list_builds(
    State(state): State<Arc<AppState>>,
    Query(q): Query<BuildsQuery>,
) -> Result<Json<BuildListResponse>, ServerError> {
    let platform = q
        .platform
        .as_deref()
        .filter(|raw| !raw.is_empty())
        .map(parse_platform)
        .transpose()?;

    let total = state.store.count_builds(platform).await?;
    let pagination = Pagination::new(total, q.page.unwrap_or(1), state.config.page_limit);
    let builds = state
        .store
        .list_builds(platform, pagination.skip(), pagination.limit)
        .await?;

    Ok(Json(BuildListResponse {
        builds: builds.into_iter().map(BuildResponse::from).collect(),
        pagination: pagination.into(),
    }))
}

/// Fetch one archived build (`GET /api/builds/{platform}/{version}`).
#[utoipa::path(
    get,
    path = "/api/builds/{platform}/{version}",
    tag = "builds",
    params(
        ("platform" = String, Path, description = "windows, mac or linux"),
        ("version" = String, Path, description = "Build version, e.g. 1.0.9028"),
    ),
    responses(
        (status = 200, description = "The build", body = BuildResponse),
        (status = 400, description = "Unknown platform"),
        (status = 404, description = "Build not archived"),
    )
)]
pub async fn get_build(
    State(state): State<Arc<AppState>>,
    Path((platform, version)): Path<(String, String)>,
) -> Result<Json<BuildResponse>, ServerError> {
    let platform = parse_platform(&platform)?;
    let build = state
        .store
        .get_build(platform, &version)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("{platform} build {version}")))?;
    Ok(Json(build.into()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use dcarchive_types::{BuildRecord, MODULE_COUNT, ModuleRecord, Platform, ProbeResult};

    use crate::db::BuildStore;
    use crate::routes::test_support::{self, StaticProbe};
    use crate::state::AppState;

    async fn seeded() -> Arc<AppState> {
        let state = test_support::state(Arc::new(StaticProbe::default())).await;
        let probe = ProbeResult::found(1000, "\"e\"");
        for n in 1..=25 {
            let version = format!("0.0.{n}");
            let build = BuildRecord::new_installer(
                Platform::Mac,
                &version,
                format!("https://cdn.test/osx/{version}/Discord.dmg"),
                &probe,
            );
            state.store.upsert_build(&build).await.unwrap();
        }
        let windows = BuildRecord::new_installer(
            Platform::Windows,
            "1.0.9028",
            "https://cdn.test/win/1.0.9028/DiscordSetup.exe",
            &probe,
        );
        state.store.upsert_build(&windows).await.unwrap();
        let module = ModuleRecord::from_probe(
            Platform::Mac,
            "0.0.25",
            "discord_voice",
            "https://cdn.test/osx/0.0.25/modules/discord_voice-1.zip",
            &probe,
        );
        state.store.upsert_module(&module).await.unwrap();
        state
    }

    #[tokio::test]
    async fn first_page_has_default_limit() {
        let state = seeded().await;
        let body = test_support::json(test_support::get(state, "/api/builds").await).await;

        assert_eq!(body["builds"].as_array().unwrap().len(), 20);
        assert_eq!(body["pagination"]["total"], 26);
        assert_eq!(body["pagination"]["page"], 1);
        assert_eq!(body["pagination"]["limit"], 20);
        assert_eq!(body["pagination"]["pages"], 2);
        assert_eq!(body["builds"][0]["version"], "1.0.9028");
    }

    #[tokio::test]
    async fn filters_by_platform_and_pages() {
        let state = seeded().await;
        let response = test_support::get(state, "/api/builds?platform=mac&page=2").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = test_support::json(response).await;
        let builds = body["builds"].as_array().unwrap();
        assert_eq!(builds.len(), 5);
        assert!(builds.iter().all(|b| b["platform"] == "mac"));
        assert_eq!(builds[4]["version"], "0.0.1");
        assert_eq!(body["pagination"]["total"], 25);
    }

    #[tokio::test]
    async fn builds_use_camel_case_with_every_module_key() {
        let state = seeded().await;
        let body = test_support::json(test_support::get(state, "/api/builds?platform=mac").await).await;
        let newest = &body["builds"][0];

        assert_eq!(newest["version"], "0.0.25");
        assert_eq!(newest["installerSize"], 1000);
        assert_eq!(newest["mirrorLink"], "placeholder");
        assert_eq!(newest["modules"].as_object().unwrap().len(), MODULE_COUNT);
        assert_eq!(newest["modules"]["discord_voice"]["module_name"], "discord_voice");
        assert_eq!(newest["modules"]["discord_voice"]["downloadSize"], 1000);
        assert!(newest["modules"]["discord_krisp"].is_null());
    }

    #[tokio::test]
    async fn unknown_platform_is_rejected() {
        let state = seeded().await;
        let response = test_support::get(state, "/api/builds?platform=beos").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty() {
        let state = seeded().await;
        let body = test_support::json(test_support::get(state, "/api/builds?page=9").await).await;
        assert!(body["builds"].as_array().unwrap().is_empty());
        assert_eq!(body["pagination"]["page"], 9);
    }

    #[tokio::test]
    async fn single_build_lookup() {
        let state = seeded().await;
        let response = test_support::get(state.clone(), "/api/builds/windows/1.0.9028").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = test_support::json(response).await;
        assert_eq!(body["installerLink"], "https://cdn.test/win/1.0.9028/DiscordSetup.exe");

        let missing = test_support::get(state, "/api/builds/windows/1.0.1").await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
