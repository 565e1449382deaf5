use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// One record returned by the backing service. The shape is owned by the
/// remote table, so it stays an opaque JSON object here.
pub type Row = Map<String, Value>;

/// The only schema this gateway introspects or reads from.
pub const READABLE_SCHEMA: &str = "public";

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TableReference {
    pub schema: String,
    pub name: String,
}

impl TableReference {
    pub fn public(name: impl Into<String>) -> Self {
        Self {
            schema: READABLE_SCHEMA.to_string(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TableList {
    pub tables: Vec<TableReference>,
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

pub const DEFAULT_LIMIT: u64 = 10;
pub const DEFAULT_PAGE: u64 = 0;

/// Validated pagination. `limit` is always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationSpec {
    pub limit: u64,
    pub page: u64,
}

impl Default for PaginationSpec {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            page: DEFAULT_PAGE,
        }
    }
}

impl PaginationSpec {
    /// Build from loosely parsed input. Absent, zero or negative values fall
    /// back to the defaults instead of failing the request.
    pub fn from_raw(limit: Option<i64>, page: Option<i64>) -> Self {
        let limit = limit
            .filter(|l| *l > 0)
            .map_or(DEFAULT_LIMIT, |l| l as u64);
        let page = page
            .filter(|p| *p >= 0)
            .map_or(DEFAULT_PAGE, |p| p as u64);
        Self { limit, page }
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.limit)
    }

    /// Inclusive `[from, to]` row range for this page.
    pub fn range(&self) -> (u64, u64) {
        let from = self.offset();
        (from, from.saturating_add(self.limit - 1))
    }

    pub fn pages_for(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub pages: u64,
}

/// One page of rows plus the counters the caller needs to walk the table.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PageResult {
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<Row>,
    pub pagination: Pagination,
}

// ---------------------------------------------------------------------------
// HTTP envelope
// ---------------------------------------------------------------------------

/// Uniform body for every HTTP response, success or failure.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: String,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            timestamp: now_timestamp(),
        }
    }
}

impl Envelope<Value> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            timestamp: now_timestamp(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            timestamp: now_timestamp(),
        }
    }
}

/// RFC 3339 UTC timestamp with millisecond precision.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_for_missing_values() {
        assert_eq!(PaginationSpec::from_raw(None, None), PaginationSpec::default());
    }

    #[test]
    fn pagination_rejects_zero_and_negative() {
        let spec = PaginationSpec::from_raw(Some(0), Some(-3));
        assert_eq!(spec.limit, DEFAULT_LIMIT);
        assert_eq!(spec.page, DEFAULT_PAGE);

        let spec = PaginationSpec::from_raw(Some(-1), Some(2));
        assert_eq!(spec.limit, DEFAULT_LIMIT);
        assert_eq!(spec.page, 2);
    }

    #[test]
    fn range_is_inclusive() {
        let spec = PaginationSpec::from_raw(Some(10), Some(2));
        assert_eq!(spec.offset(), 20);
        assert_eq!(spec.range(), (20, 29));
    }

    #[test]
    fn range_saturates_on_huge_pages() {
        let spec = PaginationSpec::from_raw(Some(i64::MAX), Some(i64::MAX));
        let (from, to) = spec.range();
        assert_eq!(from, u64::MAX);
        assert_eq!(to, u64::MAX);
    }

    #[test]
    fn pages_round_up() {
        let spec = PaginationSpec::from_raw(Some(10), None);
        assert_eq!(spec.pages_for(0), 0);
        assert_eq!(spec.pages_for(1), 1);
        assert_eq!(spec.pages_for(10), 1);
        assert_eq!(spec.pages_for(25), 3);
    }

    #[test]
    fn failure_envelope_has_null_data() {
        let body = serde_json::to_value(Envelope::failure("nope")).unwrap();
        assert_eq!(body["success"], false);
        assert!(body["data"].is_null());
        assert_eq!(body["message"], "nope");
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }
}
