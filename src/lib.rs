pub mod config;
pub mod db;
pub mod handlers;
pub mod mcp;
pub mod models;
pub mod state;
pub mod tables;

use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

use state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Supabase Gateway",
        description = "Read-only access to the public schema of a Supabase project."
    ),
    paths(handlers::root, handlers::list_tables, handlers::table_data),
    components(schemas(
        models::TableReference,
        models::TableList,
        models::Pagination,
        models::PageResult
    )),
    tags(
        (name = "system", description = "Liveness"),
        (name = "tables", description = "Table listing and paged reads")
    )
)]
pub struct ApiDoc;

/// Build the application router with the given state.
/// Extracted from `main()` so integration tests can drive the app without
/// binding to a network port.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/openapi.json", get(handlers::openapi_json))
        .route("/api/tables/{project_id}", get(handlers::list_tables))
        .route("/api/data/{project_id}/{table_name}", get(handlers::table_data))
        .fallback(handlers::not_found)
        .with_state(state)
}
