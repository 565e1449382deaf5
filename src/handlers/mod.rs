// ---------------------------------------------------------------------------
// handlers/: HTTP route handlers
// mod.rs owns the error type shared by every handler and re-exports the
// public handler functions so that `crate::handlers::*` paths stay flat.
// ---------------------------------------------------------------------------

pub(crate) mod system;
pub(crate) mod tables;

pub use system::{not_found, openapi_json, root};
pub use tables::{list_tables, table_data};

// utoipa generates `__path_*` structs next to each handler; the OpenApi derive
// in lib.rs expects them here.
pub use system::__path_root;
pub use tables::{__path_list_tables, __path_table_data};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::models::Envelope;
use crate::tables::GatewayError;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for all handlers. Logged server-side, rendered as the failure
/// envelope `{ success: false, data: null, message, timestamp }`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Validation(m) => ApiError::BadRequest(m),
            e @ GatewayError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            GatewayError::Upstream(m) => ApiError::Upstream(m),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "API error: {}", self);
        } else {
            tracing::warn!(status = status.as_u16(), "API error: {}", self);
        }
        (status, Json(Envelope::failure(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use serde_json::Value;

    use super::*;

    async fn render(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn status_mapping() {
        let cases = [
            (GatewayError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (
                GatewayError::NotFound { schema: "public".into(), table: "t".into() },
                StatusCode::NOT_FOUND,
            ),
            (GatewayError::Upstream("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            let (status, body) = render(err.into()).await;
            assert_eq!(status, expected);
            assert_eq!(body["success"], false);
            assert!(body["data"].is_null());
        }
    }

    #[tokio::test]
    async fn not_found_message_names_the_table() {
        let err = GatewayError::NotFound { schema: "public".into(), table: "ghosts".into() };
        let (_, body) = render(err.into()).await;
        assert_eq!(body["message"], "Table 'ghosts' not found in schema 'public'");
    }
}
