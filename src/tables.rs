// ---------------------------------------------------------------------------
// tables.rs: request normalization, existence check and page fetch shared by
// the HTTP and JSON-RPC transports
// ---------------------------------------------------------------------------

use serde_json::Value;

use crate::db::{ClientError, DataClient};
use crate::models::{PageResult, Pagination, PaginationSpec, READABLE_SCHEMA, TableReference};

/// Internal diagnostic view that never shows up in table listings.
pub const EXCLUDED_VIEW: &str = "pg_stat_statements";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("{0}")]
    Validation(String),

    #[error("Table '{table}' not found in schema '{schema}'")]
    NotFound { schema: String, table: String },

    #[error("{0}")]
    Upstream(String),
}

/// Canonical `get_table_data` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRequest {
    pub table_name: String,
    pub pagination: PaginationSpec,
}

impl DataRequest {
    pub fn new(table_name: Option<&str>, pagination: PaginationSpec) -> Result<Self, GatewayError> {
        // Blank means missing; otherwise the name is used exactly as given.
        let table_name = table_name
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| GatewayError::Validation("Missing required parameter: table_name".into()))?;
        Ok(Self {
            table_name: table_name.to_string(),
            pagination,
        })
    }
}

// ── Lenient integer parsing ─────────────────────────────────────────────────

/// Base-10 integer from a query-string value; anything else is `None`.
pub fn int_from_text(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
}

/// Integer from a loosely typed JSON value: integers, integral floats and
/// numeric strings are accepted.
pub fn int_from_json(raw: Option<&Value>) -> Option<i64> {
    match raw? {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => int_from_text(Some(s)),
        _ => None,
    }
}

// ── Operations ──────────────────────────────────────────────────────────────

/// Every table in the readable schema, ordered by name.
pub async fn list_tables(client: &dyn DataClient) -> Result<Vec<TableReference>, GatewayError> {
    let mut names = client
        .list_tables(READABLE_SCHEMA, EXCLUDED_VIEW)
        .await
        .map_err(|e| GatewayError::Upstream(format!("Failed to list tables: {e}")))?;

    // The backing service already orders by name; keep the guarantee local.
    names.retain(|n| n != EXCLUDED_VIEW);
    names.sort();

    tracing::debug!(count = names.len(), "listed tables");
    Ok(names.into_iter().map(TableReference::public).collect())
}

/// Confirm exactly one table named `table_name` exists in the readable schema.
pub async fn ensure_table(
    client: &dyn DataClient,
    table_name: &str,
) -> Result<TableReference, GatewayError> {
    let not_found = || GatewayError::NotFound {
        schema: READABLE_SCHEMA.to_string(),
        table: table_name.to_string(),
    };

    match client.find_tables(READABLE_SCHEMA, table_name).await {
        Ok(matches) if matches.len() == 1 => Ok(TableReference::public(table_name)),
        Ok(_) => Err(not_found()),
        Err(ClientError::Query(e)) => {
            tracing::debug!(table = %table_name, "metadata query rejected: {}", e);
            Err(not_found())
        }
        Err(ClientError::Transport(e)) => Err(GatewayError::Upstream(format!(
            "Failed to check table '{table_name}': {e}"
        ))),
    }
}

/// Fetch one page of `table` with an exact total count.
pub async fn fetch_page(
    client: &dyn DataClient,
    table: &TableReference,
    pagination: PaginationSpec,
) -> Result<PageResult, GatewayError> {
    let (from, to) = pagination.range();
    let selection = client
        .select_range(&table.schema, &table.name, from, to)
        .await
        .map_err(|e| {
            GatewayError::Upstream(format!("Failed to fetch data from table '{}': {e}", table.name))
        })?;

    let mut rows = selection.rows;
    rows.truncate(usize::try_from(pagination.limit).unwrap_or(usize::MAX));

    Ok(PageResult {
        rows,
        pagination: Pagination {
            total: selection.total,
            page: pagination.page,
            limit: pagination.limit,
            pages: pagination.pages_for(selection.total),
        },
    })
}

/// Existence check followed by the page fetch.
pub async fn get_table_data(
    client: &dyn DataClient,
    request: &DataRequest,
) -> Result<PageResult, GatewayError> {
    let table = ensure_table(client, &request.table_name).await?;
    let page = fetch_page(client, &table, request.pagination).await?;
    tracing::info!(
        table = %table.name,
        page = request.pagination.page,
        limit = request.pagination.limit,
        rows = page.rows.len(),
        total = page.pagination.total,
        "fetched table page"
    );
    Ok(page)
}
