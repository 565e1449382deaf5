// ---------------------------------------------------------------------------
// handlers/system.rs: root banner, OpenAPI document, unknown-route fallback
// ---------------------------------------------------------------------------

use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value;
use utoipa::OpenApi;

use crate::models::Envelope;
use crate::ApiDoc;

use super::ApiError;

pub const ROOT_MESSAGE: &str = "Supabase gateway is running";

/// GET /: static liveness banner, never touches the backing client.
#[utoipa::path(get, path = "/", tag = "system",
    responses((status = 200, description = "Gateway is running", body = Value))
)]
pub async fn root() -> Json<Envelope<Value>> {
    Json(Envelope::message(ROOT_MESSAGE))
}

/// GET /api/openapi.json
pub async fn openapi_json() -> Result<Json<Value>, ApiError> {
    serde_json::to_value(ApiDoc::openapi())
        .map(Json)
        .map_err(|e| ApiError::Internal(format!("failed to render OpenAPI document: {e}")))
}

/// Fallback for every unrouted path.
pub async fn not_found(uri: Uri) -> impl IntoResponse {
    tracing::debug!(path = %uri.path(), "no route");
    (
        StatusCode::NOT_FOUND,
        Json(Envelope::failure(format!("Route {} not found", uri.path()))),
    )
}
