//! `GET /fetch`
//!
//! Resolves an SRN through the delivery API, then relays the object from
//! storage chunk by chunk.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::error::QuickstartError;
use crate::platform::PlatformClient;
use crate::server::error::ApiError;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Fetch route.
pub fn routes(platform: PlatformClient) -> Router {
    Router::new()
        .route("/fetch", get(fetch))
        .with_state(platform)
}

#[derive(Debug, Deserialize)]
struct FetchParams {
    srn: Option<String>,
}

async fn fetch(
    State(platform): State<PlatformClient>,
    Query(params): Query<FetchParams>,
) -> Result<Response, ApiError> {
    let srn = params.srn.ok_or(QuickstartError::MissingParameter("srn"))?;

    tracing::info!(%srn, "Resolving download location");
    let url = platform.resolve_download_url(&srn).await?;

    let object = platform.open_object(&url).await?;
    tracing::info!(
        %srn,
        content_type = ?object.content_type,
        content_length = ?object.content_length,
        "Streaming object"
    );

    let content_type = object
        .content_type
        .clone()
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
    let content_length = object.content_length;
    let body = Body::from_stream(object.into_byte_stream());

    let mut response = ([(header::CONTENT_TYPE, content_type)], body).into_response();
    if let Some(length) = content_length {
        response
            .headers_mut()
            .insert(header::CONTENT_LENGTH, length.into());
    }

    Ok(response)
}
