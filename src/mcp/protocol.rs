//! JSON-RPC 2.0 message types for the STDIO transport.
//!
//! Loosely typed input is converted at the dispatch boundary: the envelope is
//! checked first ([`RpcRequest::from_value`]), then `method` + `params` become
//! one strongly typed [`RpcCall`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

// ── Responses ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl RpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Exactly one of `result` / `error` is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    pub fn parse_error(detail: impl std::fmt::Display) -> Self {
        Self::failure(Value::Null, RpcError::new(PARSE_ERROR, format!("Parse error: {detail}")))
    }
}

// ── Requests ────────────────────────────────────────────────────────────────

/// A structurally valid request. `id == None` marks a notification.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    pub id: Option<Value>,
    pub method: String,
    pub params: Value,
}

impl RpcRequest {
    /// Validate the JSON-RPC envelope. On failure the returned response
    /// echoes the id when the id itself is usable.
    pub fn from_value(value: Value) -> Result<Self, RpcResponse> {
        let Value::Object(mut obj) = value else {
            return Err(invalid_request(Value::Null, "request must be a JSON object"));
        };

        let id = match obj.remove("id") {
            None => None,
            Some(id @ (Value::Null | Value::String(_) | Value::Number(_))) => Some(id),
            Some(_) => {
                return Err(invalid_request(Value::Null, "id must be a string, number or null"));
            }
        };
        let echo = id.clone().unwrap_or(Value::Null);

        if obj.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
            return Err(invalid_request(echo, "jsonrpc must be \"2.0\""));
        }

        let method = match obj.remove("method") {
            Some(Value::String(m)) if !m.is_empty() => m,
            _ => return Err(invalid_request(echo, "method must be a non-empty string")),
        };

        let params = obj.remove("params").unwrap_or(Value::Null);
        if !matches!(params, Value::Null | Value::Object(_) | Value::Array(_)) {
            return Err(invalid_request(echo, "params must be an object or array"));
        }

        Ok(Self { id, method, params })
    }
}

fn invalid_request(id: Value, detail: &str) -> RpcResponse {
    RpcResponse::failure(id, RpcError::new(INVALID_REQUEST, format!("Invalid Request: {detail}")))
}

// ── Typed calls ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListTablesParams {
    #[serde(default, alias = "projectId")]
    pub project_id: Option<String>,
}

/// `limit` / `page` stay loosely typed: malformed values fall back to the
/// defaults instead of failing the call.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GetTableDataParams {
    #[serde(default, alias = "projectId")]
    pub project_id: Option<String>,
    #[serde(default, alias = "tableName")]
    pub table_name: Option<String>,
    #[serde(default)]
    pub limit: Option<Value>,
    #[serde(default)]
    pub page: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RpcCall {
    ListTools,
    ListTables(ListTablesParams),
    GetTableData(GetTableDataParams),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),
}

impl CallError {
    pub fn code(&self) -> i32 {
        match self {
            CallError::MethodNotFound(_) => METHOD_NOT_FOUND,
            CallError::InvalidParams(_) => INVALID_PARAMS,
        }
    }
}

impl From<CallError> for RpcError {
    fn from(err: CallError) -> Self {
        RpcError::new(err.code(), err.to_string())
    }
}

impl RpcCall {
    pub fn parse(method: &str, params: Value) -> Result<Self, CallError> {
        match method {
            "listTools" => Ok(RpcCall::ListTools),
            "list_tables" => typed_params(params).map(RpcCall::ListTables),
            "get_table_data" => typed_params(params).map(RpcCall::GetTableData),
            other => Err(CallError::MethodNotFound(other.to_string())),
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            RpcCall::ListTools => "listTools",
            RpcCall::ListTables(_) => "list_tables",
            RpcCall::GetTableData(_) => "get_table_data",
        }
    }
}

fn typed_params<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, CallError> {
    let params = match params {
        Value::Null => Value::Object(Map::new()),
        Value::Object(_) => params,
        _ => return Err(CallError::InvalidParams("params must be an object".into())),
    };
    serde_json::from_value(params).map_err(|e| CallError::InvalidParams(e.to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn error_code(resp: &RpcResponse) -> i32 {
        resp.error.as_ref().map(|e| e.code).unwrap_or_default()
    }

    #[test]
    fn valid_request_keeps_id_and_params() {
        let req = RpcRequest::from_value(json!({
            "jsonrpc": "2.0", "id": "abc", "method": "list_tables", "params": {"project_id": "p"}
        }))
        .unwrap();
        assert_eq!(req.id, Some(json!("abc")));
        assert_eq!(req.method, "list_tables");
        assert_eq!(req.params["project_id"], "p");
    }

    #[test]
    fn missing_id_is_a_notification() {
        let req = RpcRequest::from_value(json!({"jsonrpc": "2.0", "method": "listTools"})).unwrap();
        assert_eq!(req.id, None);
    }

    #[test]
    fn envelope_violations_are_invalid_requests() {
        let cases = [
            json!([1, 2]),
            json!({"jsonrpc": "1.0", "id": 1, "method": "listTools"}),
            json!({"id": 1, "method": "listTools"}),
            json!({"jsonrpc": "2.0", "id": 1}),
            json!({"jsonrpc": "2.0", "id": 1, "method": 7}),
            json!({"jsonrpc": "2.0", "id": {"x": 1}, "method": "listTools"}),
            json!({"jsonrpc": "2.0", "id": 1, "method": "listTools", "params": "x"}),
        ];
        for case in cases {
            let resp = RpcRequest::from_value(case.clone()).unwrap_err();
            assert_eq!(error_code(&resp), INVALID_REQUEST, "case {case}");
        }
    }

    #[test]
    fn invalid_request_echoes_usable_id() {
        let resp = RpcRequest::from_value(json!({"jsonrpc": "1.0", "id": 9, "method": "x"}))
            .unwrap_err();
        assert_eq!(resp.id, json!(9));

        let resp = RpcRequest::from_value(json!({"jsonrpc": "2.0", "id": [9], "method": "x"}))
            .unwrap_err();
        assert_eq!(resp.id, Value::Null);
    }

    #[test]
    fn calls_are_typed_per_method() {
        assert_eq!(RpcCall::parse("listTools", Value::Null), Ok(RpcCall::ListTools));

        let call = RpcCall::parse(
            "get_table_data",
            json!({"project_id": "p", "tableName": "users", "limit": "5"}),
        )
        .unwrap();
        let RpcCall::GetTableData(params) = call else {
            panic!("expected get_table_data");
        };
        assert_eq!(params.table_name.as_deref(), Some("users"));
        assert_eq!(params.limit, Some(json!("5")));
        assert_eq!(params.page, None);
    }

    #[test]
    fn unknown_method_and_bad_params() {
        assert_eq!(
            RpcCall::parse("drop_table", json!({})),
            Err(CallError::MethodNotFound("drop_table".into()))
        );
        let err = RpcCall::parse("get_table_data", json!({"table_name": 42})).unwrap_err();
        assert_eq!(err.code(), INVALID_PARAMS);
        let err = RpcCall::parse("list_tables", json!(["p"])).unwrap_err();
        assert_eq!(err.code(), INVALID_PARAMS);
    }

    #[test]
    fn response_serializes_only_one_branch() {
        let ok = serde_json::to_value(RpcResponse::success(json!(1), json!({}))).unwrap();
        assert_eq!(ok, json!({"jsonrpc": "2.0", "id": 1, "result": {}}));

        let err = serde_json::to_value(RpcResponse::parse_error("eof")).unwrap();
        assert!(err.get("result").is_none());
        assert_eq!(err["id"], Value::Null);
        assert_eq!(err["error"]["code"], PARSE_ERROR);
    }
}
