// ---------------------------------------------------------------------------
// handlers/tables.rs: table listing and paged table data
// ---------------------------------------------------------------------------

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::models::{Envelope, PageResult, PaginationSpec, TableList};
use crate::state::AppState;
use crate::tables::{self, int_from_text, DataRequest};

use super::ApiError;

/// Raw pagination query. Kept as strings so malformed numbers degrade to the
/// defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationQuery {
    pub limit: Option<String>,
    pub page: Option<String>,
}

impl PaginationQuery {
    fn spec(&self) -> PaginationSpec {
        PaginationSpec::from_raw(
            int_from_text(self.limit.as_deref()),
            int_from_text(self.page.as_deref()),
        )
    }
}

#[utoipa::path(get, path = "/api/tables/{project_id}", tag = "tables",
    params(("project_id" = String, Path, description = "Project identifier (accepted, not used for routing)")),
    responses(
        (status = 200, description = "Tables in the public schema", body = Value),
        (status = 500, description = "Backing service failure", body = Value)
    )
)]
pub async fn list_tables(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<Envelope<TableList>>, ApiError> {
    tracing::debug!(project_id = %project_id, "list tables");
    let tables = tables::list_tables(state.client()).await?;
    Ok(Json(Envelope::ok(TableList { tables })))
}

#[utoipa::path(get, path = "/api/data/{project_id}/{table_name}", tag = "tables",
    params(
        ("project_id" = String, Path, description = "Project identifier (accepted, not used for routing)"),
        ("table_name" = String, Path, description = "Table in the public schema"),
        ("limit" = Option<u64>, Query, description = "Rows per page (default 10)"),
        ("page" = Option<u64>, Query, description = "Zero-based page number (default 0)")
    ),
    responses(
        (status = 200, description = "One page of rows", body = Value),
        (status = 400, description = "Invalid request", body = Value),
        (status = 404, description = "Table not found", body = Value),
        (status = 500, description = "Backing service failure", body = Value)
    )
)]
pub async fn table_data(
    State(state): State<AppState>,
    Path((project_id, table_name)): Path<(String, String)>,
    query: Result<Query<PaginationQuery>, QueryRejection>,
) -> Result<Json<Envelope<PageResult>>, ApiError> {
    let query = match query {
        Ok(Query(q)) => q,
        Err(e) => {
            tracing::debug!("unparsable query string, using default pagination: {}", e);
            PaginationQuery::default()
        }
    };

    tracing::debug!(project_id = %project_id, table = %table_name, "table data");
    let request = DataRequest::new(Some(&table_name), query.spec())?;
    let page = tables::get_table_data(state.client(), &request).await?;
    Ok(Json(Envelope::ok(page)))
}
