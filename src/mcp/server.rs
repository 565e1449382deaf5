// JSON-RPC dispatcher: exposes the table operations as tools over STDIO.
//
// Supported methods:
// - `listTools`      static tool descriptors, no backing-client call
// - `list_tables`    tables of the public schema
// - `get_table_data` one page of a table, with exact total count

use serde_json::{json, Value};

use super::framing::Frame;
use super::protocol::{
    CallError, GetTableDataParams, INTERNAL_ERROR, ListTablesParams, RpcCall, RpcError, RpcRequest,
    RpcResponse,
};
use crate::models::{PaginationSpec, TableList};
use crate::state::AppState;
use crate::tables::{self, int_from_json, DataRequest, GatewayError};

/// Line-level JSON-RPC handler. Holds no per-connection state.
#[derive(Clone)]
pub struct McpServer {
    state: AppState,
}

impl McpServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Handle one frame from the reader. A line that is not valid UTF-8 is a
    /// parse error; its bytes never reach a handler.
    pub async fn handle_frame(&self, frame: Frame) -> Option<RpcResponse> {
        match frame {
            Ok(line) => self.handle_line(line).await,
            Err(e) => {
                tracing::warn!("MCP: line is not valid UTF-8: {}", e);
                Some(RpcResponse::parse_error(e))
            }
        }
    }

    /// Handle one framed line. `None` means nothing is written back: blank
    /// lines and notifications.
    pub async fn handle_line(&self, line: String) -> Option<RpcResponse> {
        if line.trim().is_empty() {
            return None;
        }
        match serde_json::from_str::<Value>(&line) {
            Ok(value) => self.handle_value(value).await,
            Err(e) => {
                tracing::warn!("MCP: unparsable line: {}", e);
                Some(RpcResponse::parse_error(e))
            }
        }
    }

    pub async fn handle_value(&self, value: Value) -> Option<RpcResponse> {
        let request = match RpcRequest::from_value(value) {
            Ok(r) => r,
            Err(response) => {
                tracing::warn!("MCP: invalid request");
                return Some(response);
            }
        };

        tracing::debug!(method = %request.method, "MCP: incoming request");

        let outcome = match RpcCall::parse(&request.method, request.params) {
            Ok(call) => self.execute(call).await,
            Err(e) => Err(RpcError::from(e)),
        };

        // Notifications run but never answer, not even with an error.
        let id = request.id?;
        Some(match outcome {
            Ok(result) => RpcResponse::success(id, result),
            Err(error) => {
                tracing::warn!(method = %request.method, code = error.code, "MCP: {}", error.message);
                RpcResponse::failure(id, error)
            }
        })
    }

    async fn execute(&self, call: RpcCall) -> Result<Value, RpcError> {
        tracing::info!(method = call.method(), "MCP: call");
        match call {
            RpcCall::ListTools => Ok(json!({ "tools": tool_descriptors() })),
            RpcCall::ListTables(params) => self.list_tables(params).await,
            RpcCall::GetTableData(params) => self.get_table_data(params).await,
        }
    }

    async fn list_tables(&self, params: ListTablesParams) -> Result<Value, RpcError> {
        let project_id = self.resolve_project(params.project_id)?;
        tracing::debug!(project_id = %project_id, "MCP: list_tables");
        let tables = tables::list_tables(self.state.client())
            .await
            .map_err(execution_error)?;
        to_result(&TableList { tables })
    }

    async fn get_table_data(&self, params: GetTableDataParams) -> Result<Value, RpcError> {
        let project_id = self.resolve_project(params.project_id)?;
        let pagination = PaginationSpec::from_raw(
            int_from_json(params.limit.as_ref()),
            int_from_json(params.page.as_ref()),
        );
        let request = DataRequest::new(params.table_name.as_deref(), pagination)
            .map_err(execution_error)?;
        tracing::debug!(project_id = %project_id, table = %request.table_name, "MCP: get_table_data");

        let page = tables::get_table_data(self.state.client(), &request)
            .await
            .map_err(execution_error)?;
        to_result(&page)
    }

    /// The project id is required but only echoed into logs: one backing
    /// connection serves every project.
    fn resolve_project(&self, project_id: Option<String>) -> Result<String, RpcError> {
        project_id
            .filter(|p| !p.trim().is_empty())
            .or_else(|| self.state.defaults.project_id.clone())
            .ok_or_else(|| {
                CallError::InvalidParams("Missing required parameter: project_id".into()).into()
            })
    }
}

fn execution_error(err: GatewayError) -> RpcError {
    match err {
        GatewayError::Validation(m) => CallError::InvalidParams(m).into(),
        other => RpcError::new(INTERNAL_ERROR, other.to_string()),
    }
}

fn to_result<T: serde::Serialize>(value: &T) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError::new(INTERNAL_ERROR, e.to_string()))
}

// ── Tool descriptors ────────────────────────────────────────────────────────

/// Descriptors returned by `listTools`.
pub fn tool_descriptors() -> Vec<Value> {
    vec![
        tool(
            "list_tables",
            "List all tables in the public schema of the Supabase project.",
            json!({
                "type": "object",
                "properties": {
                    "project_id": { "type": "string", "description": "Supabase project identifier" }
                },
                "required": ["project_id"]
            }),
        ),
        tool(
            "get_table_data",
            "Read one page of rows from a table in the public schema, with the exact total row count.",
            json!({
                "type": "object",
                "properties": {
                    "project_id": { "type": "string", "description": "Supabase project identifier" },
                    "table_name": { "type": "string", "description": "Table to read" },
                    "limit": { "type": "number", "description": "Rows per page (default 10)" },
                    "page": { "type": "number", "description": "Zero-based page number (default 0)" }
                },
                "required": ["project_id", "table_name"]
            }),
        ),
    ]
}

fn tool(name: &str, description: &str, input_schema: Value) -> Value {
    json!({
        "name": name,
        "description": description,
        "inputSchema": input_schema,
    })
}
