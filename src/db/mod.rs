//! Backing data client.
//!
//! The gateway never talks SQL itself: schema introspection, ranged selects
//! and row counts are all single calls to a managed service. `DataClient` is
//! the capability the handlers depend on; `SupabaseClient` is the production
//! implementation over the PostgREST HTTP API.

pub mod supabase;

use async_trait::async_trait;

use crate::models::Row;

pub use supabase::SupabaseClient;

/// Failure reported by the backing service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The call never produced a usable answer: network failure, rejected
    /// credentials or a server-side fault.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered but refused the query itself.
    #[error("query error: {0}")]
    Query(String),
}

/// Rows for one inclusive range plus the exact row count of the table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeSelection {
    pub rows: Vec<Row>,
    pub total: u64,
}

#[async_trait]
pub trait DataClient: Send + Sync {
    /// Names of every table and view in `schema` except `exclude`, ordered
    /// ascending.
    async fn list_tables(&self, schema: &str, exclude: &str) -> Result<Vec<String>, ClientError>;

    /// Metadata rows in `schema` whose table name equals `name`.
    async fn find_tables(&self, schema: &str, name: &str) -> Result<Vec<String>, ClientError>;

    /// Rows `from..=to` of `schema.table` with an exact total count.
    async fn select_range(
        &self,
        schema: &str,
        table: &str,
        from: u64,
        to: u64,
    ) -> Result<RangeSelection, ClientError>;
}
