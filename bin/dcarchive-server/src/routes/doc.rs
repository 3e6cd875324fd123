use axum::Json;
use utoipa::OpenApi;

use crate::routes::{builds, health, latest};

#[derive(OpenApi)]
#[openapi(info(
    title = "dcarchive-server",
    description = "Archive of Discord desktop builds and their modules",
    version = "0.1.0",
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(health::HealthApi::openapi());
    root.merge(builds::BuildsApi::openapi());
    root.merge(latest::LatestApi::openapi());
    root
}

/// `GET /api-docs/openapi.json`
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(get_docs())
}
