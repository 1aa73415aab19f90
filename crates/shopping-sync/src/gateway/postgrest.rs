//! PostgREST Wire Format
//!
//! Renders the query model into PostgREST query parameters and interprets
//! its responses. The HTTP transport itself lives with the UI.

use serde::Deserialize;
use serde_json::Value;

use super::query::{Filter, Select};
use crate::error::{StoreError, StoreResult};

/// `Accept` header asking for a single JSON object instead of an array
pub const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// `Prefer` header making writes return the affected rows
pub const RETURN_REPRESENTATION: &str = "return=representation";

/// Query parameters for a read
pub fn select_params(query: &Select) -> Vec<(String, String)> {
    let mut columns = String::from("*");
    for relation in &query.relations {
        columns.push_str(&format!(
            ",{}:{}!{}(*)",
            relation.alias, relation.table, relation.foreign_key
        ));
    }

    let mut params = vec![("select".to_string(), columns)];
    params.extend(query.filters.iter().map(filter_param));

    if !query.order.is_empty() {
        let order = query
            .order
            .iter()
            .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
            .collect::<Vec<_>>()
            .join(",");
        params.push(("order".to_string(), order));
    }

    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

/// Query parameter for a row filter
pub fn filter_param(filter: &Filter) -> (String, String) {
    match filter {
        Filter::Eq { column, value: Value::Null } => (column.clone(), "is.null".to_string()),
        Filter::Eq { column, value } => (column.clone(), format!("eq.{}", plain(value))),
        Filter::In { column, values } => {
            let list = values.iter().map(quoted).collect::<Vec<_>>().join(",");
            (column.clone(), format!("in.({})", list))
        }
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn quoted(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        other => other.to_string(),
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

/// Map a non-success response to a store error
pub fn parse_error(status: u16, body: &str) -> StoreError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) => StoreError::Request {
            code: err.code,
            message: err.message,
        },
        Err(_) => StoreError::Request {
            code: Some(status.to_string()),
            message: if body.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                body.trim().to_string()
            },
        },
    }
}

/// Parse a success body; single-object responses become a one-element list
pub fn parse_rows(body: &str) -> StoreResult<Vec<Value>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Value>(body)? {
        Value::Array(rows) => Ok(rows),
        Value::Object(row) => Ok(vec![Value::Object(row)]),
        other => Err(StoreError::Decode(format!("unexpected body: {}", other))),
    }
}
