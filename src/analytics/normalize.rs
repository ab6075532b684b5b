//! Tolerant normalization of analytics SQL responses.
//!
//! The upstream may report column names and rows in several places. Each
//! location is tried in priority order; the first one with the right shape wins.

use serde::Serialize;
use serde_json::{Map, Value};

/// Normalized query result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub count: usize,
    pub items: Vec<Value>,
}

type ColumnExtractor = fn(&Value) -> Option<Vec<String>>;

/// Column name locations, highest priority first.
const COLUMN_EXTRACTORS: &[ColumnExtractor] = &[schema_columns, meta_columns, top_level_columns];

/// Row locations, highest priority first.
const ROW_KEYS: &[&str] = &["data", "rows", "result", "items"];

/// `meta.schema.columns[].name`
fn schema_columns(body: &Value) -> Option<Vec<String>> {
    body.pointer("/meta/schema/columns")?
        .as_array()?
        .iter()
        .map(|column| column.get("name")?.as_str().map(str::to_string))
        .collect()
}

/// `meta.columns[]`
fn meta_columns(body: &Value) -> Option<Vec<String>> {
    string_array(body.pointer("/meta/columns")?)
}

/// `columns[]`
fn top_level_columns(body: &Value) -> Option<Vec<String>> {
    string_array(body.get("columns")?)
}

fn string_array(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

fn extract_columns(body: &Value) -> Vec<String> {
    COLUMN_EXTRACTORS
        .iter()
        .find_map(|extract| extract(body))
        .unwrap_or_default()
}

fn extract_rows(body: &Value) -> Vec<Value> {
    ROW_KEYS
        .iter()
        .find_map(|key| body.get(*key)?.as_array().cloned())
        .unwrap_or_default()
}

fn zip_row(columns: &[String], row: Value) -> Value {
    match row {
        Value::Array(values) => {
            let mut values = values.into_iter();
            let object: Map<String, Value> = columns
                .iter()
                .map(|name| (name.clone(), values.next().unwrap_or(Value::Null)))
                .collect();
            Value::Object(object)
        }
        other => other,
    }
}

/// Normalize a parsed response body into `{count, items}`.
pub fn normalize(body: &Value) -> QueryResult {
    let columns = extract_columns(body);
    let rows = extract_rows(body);

    let row_major = !columns.is_empty() && rows.first().is_some_and(Value::is_array);
    let items: Vec<Value> = if row_major {
        rows.into_iter().map(|row| zip_row(&columns, row)).collect()
    } else {
        rows
    };

    QueryResult {
        count: items.len(),
        items,
    }
}

/// Parse and normalize a raw body. Unparseable bodies count as `{}`.
pub fn normalize_bytes(body: &[u8]) -> QueryResult {
    let parsed = serde_json::from_slice(body).unwrap_or_else(|_| Value::Object(Map::new()));
    normalize(&parsed)
}
