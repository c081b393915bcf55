//! `GET /find` and `GET /search`

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::error::QuickstartError;
use crate::platform::{FilesByResourceType, PlatformClient};
use crate::server::error::ApiError;

/// Search routes; `/search` is an alias of `/find`.
pub fn routes(platform: PlatformClient) -> Router {
    Router::new()
        .route("/find", get(find))
        .route("/search", get(find))
        .with_state(platform)
}

#[derive(Debug, Deserialize)]
struct FindParams {
    wellname: Option<String>,
}

async fn find(
    State(platform): State<PlatformClient>,
    Query(params): Query<FindParams>,
) -> Result<Json<FilesByResourceType>, ApiError> {
    let term = params
        .wellname
        .ok_or(QuickstartError::MissingParameter("wellname"))?;

    tracing::info!(wellname = %term, "Searching");
    let found = platform.search(&term).await?;
    tracing::debug!(resource_types = found.len(), "Search finished");

    Ok(Json(found))
}
