// Supabase / PostgREST implementation of `DataClient`.
//
// Every call is one HTTP round trip against `{project_url}/rest/v1`. Schema
// metadata goes through the `information_schema` profile, row reads through
// the readable schema's profile with a `Range` header and an exact count.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use url::Url;

use super::{ClientError, DataClient, RangeSelection};
use crate::models::Row;

const METADATA_PROFILE: &str = "information_schema";
const METADATA_TABLE: &str = "tables";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Authenticated handle to one Supabase project. Built once at startup and
/// shared read-only by every request.
#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    rest_url: Url,
    key: String,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("rest_url", &self.rest_url.as_str())
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    pub fn new(project_url: &Url, key: impl Into<String>) -> Result<Self, ClientError> {
        let rest_url = rest_base(project_url)?;
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            rest_url,
            key: key.into(),
        })
    }

    fn auth_headers(&self, profile: &str) -> Result<HeaderMap, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(&self.key)?);
        headers.insert(
            header::AUTHORIZATION,
            header_value(&format!("Bearer {}", self.key))?,
        );
        headers.insert("Accept-Profile", header_value(profile)?);
        Ok(headers)
    }

    fn endpoint(&self, relation: &str, query: &[(&str, &str)]) -> Result<Url, ClientError> {
        let mut url = self.rest_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::Transport("backing URL cannot carry a path".into()))?
            .pop_if_empty()
            .push(relation);
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    async fn metadata_names(&self, query: &[(&str, &str)]) -> Result<Vec<String>, ClientError> {
        let url = self.endpoint(METADATA_TABLE, query)?;
        tracing::debug!(url = %url, "supabase: metadata query");

        let resp = self
            .http
            .get(url)
            .headers(self.auth_headers(METADATA_PROFILE)?)
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("metadata request failed: {e}")))?;
        let resp = check_status(resp).await?;

        let rows: Vec<Row> = resp
            .json()
            .await
            .map_err(|e| ClientError::Transport(format!("failed to decode metadata rows: {e}")))?;

        Ok(rows
            .iter()
            .filter_map(|r| r.get("table_name").and_then(|v| v.as_str()))
            .map(str::to_string)
            .collect())
    }
}

#[async_trait]
impl DataClient for SupabaseClient {
    async fn list_tables(&self, schema: &str, exclude: &str) -> Result<Vec<String>, ClientError> {
        let schema_filter = format!("eq.{schema}");
        let exclude_filter = format!("neq.{exclude}");
        self.metadata_names(&[
            ("select", "table_schema,table_name"),
            ("table_schema", &schema_filter),
            ("table_name", &exclude_filter),
            ("order", "table_name.asc"),
        ])
        .await
    }

    async fn find_tables(&self, schema: &str, name: &str) -> Result<Vec<String>, ClientError> {
        let schema_filter = format!("eq.{schema}");
        let name_filter = format!("eq.{name}");
        self.metadata_names(&[
            ("select", "table_schema,table_name"),
            ("table_schema", &schema_filter),
            ("table_name", &name_filter),
        ])
        .await
    }

    async fn select_range(
        &self,
        schema: &str,
        table: &str,
        from: u64,
        to: u64,
    ) -> Result<RangeSelection, ClientError> {
        let url = self.endpoint(table, &[("select", "*")])?;
        let mut headers = self.auth_headers(schema)?;
        headers.insert("Range-Unit", HeaderValue::from_static("items"));
        headers.insert(header::RANGE, header_value(&format!("{from}-{to}"))?);
        headers.insert("Prefer", HeaderValue::from_static("count=exact"));

        tracing::debug!(table = %table, from, to, "supabase: ranged select");

        let resp = self
            .http
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("select on '{table}' failed: {e}")))?;

        // A range past the last row is answered with 416 and the real count.
        if resp.status() == StatusCode::RANGE_NOT_SATISFIABLE {
            return Ok(RangeSelection {
                rows: Vec::new(),
                total: exact_total(resp.headers(), table)?,
            });
        }

        let resp = check_status(resp).await?;
        let total = exact_total(resp.headers(), table)?;
        let rows: Vec<Row> = resp
            .json()
            .await
            .map_err(|e| ClientError::Transport(format!("failed to decode rows of '{table}': {e}")))?;

        Ok(RangeSelection { rows, total })
    }
}

fn rest_base(project_url: &Url) -> Result<Url, ClientError> {
    let mut base = project_url.clone();
    base.path_segments_mut()
        .map_err(|()| ClientError::Transport(format!("'{project_url}' is not a valid base URL")))?
        .pop_if_empty()
        .extend(["rest", "v1"]);
    Ok(base)
}

fn header_value(raw: &str) -> Result<HeaderValue, ClientError> {
    HeaderValue::from_str(raw)
        .map_err(|_| ClientError::Transport("credential contains invalid header characters".into()))
}

/// Split non-success answers into transport faults and query rejections.
async fn check_status(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = upstream_message(status, &body);
    Err(classify_status(status, message))
}

fn classify_status(status: StatusCode, message: String) -> ClientError {
    if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || status.is_server_error()
    {
        ClientError::Transport(message)
    } else {
        ClientError::Query(message)
    }
}

/// PostgREST errors are `{code, message, details, hint}`; fall back to the raw
/// body when it is something else.
fn upstream_message(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    if detail.is_empty() {
        format!("backing service returned {status}")
    } else {
        format!("backing service returned {status}: {detail}")
    }
}

/// The count requested with `Prefer: count=exact`. Its absence is an error;
/// the page length is not a total.
fn exact_total(headers: &HeaderMap, table: &str) -> Result<u64, ClientError> {
    content_range_total(headers).ok_or_else(|| {
        tracing::warn!(table = %table, "supabase: response carries no exact count");
        ClientError::Query(format!("backing service returned no exact row count for '{table}'"))
    })
}

/// Total from `Content-Range: 0-9/25` or `*/25`. `None` when the count is
/// missing or reported as `*`.
fn content_range_total(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_content_range_total)
}

fn parse_content_range_total(raw: &str) -> Option<u64> {
    let (_, total) = raw.trim().rsplit_once('/')?;
    total.trim().parse().ok()
}
