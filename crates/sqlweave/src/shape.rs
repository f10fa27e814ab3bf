//! Nesting of JSON-extracted result columns.
//!
//! A projection `supplier->address->city` comes back from the database as the
//! flat key `supplier_address_city`. The shaper moves it to
//! `row["supplier"]["address"]["city"]`. Only keys generated by the projection
//! are touched; explicit aliases stay flat.

use crate::column::ColumnExpr;
use crate::row::Row;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
struct NestedKey {
    flat: String,
    path: Vec<String>,
}

/// Reshapes rows produced by one projection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultShaper {
    keys: Vec<NestedKey>,
}

impl ResultShaper {
    /// Capture the generated JSON output keys of a projection.
    pub fn from_columns(columns: &[ColumnExpr]) -> Self {
        let keys = columns
            .iter()
            .filter(|column| !column.has_explicit_alias())
            .filter_map(|column| match column {
                ColumnExpr::Json { base, path, .. } => {
                    let flat = column.output_key()?;
                    let mut nested = vec![base.name().to_string()];
                    nested.extend(path.iter().cloned());
                    Some(NestedKey { flat, path: nested })
                }
                _ => None,
            })
            .collect();
        Self { keys }
    }

    /// Whether reshaping can change anything.
    pub fn is_noop(&self) -> bool {
        self.keys.is_empty()
    }

    /// Move every generated flat key into its nested position.
    ///
    /// A flat key stays where it is when a value already stored along its path
    /// cannot take it (a scalar, or an array addressed by a non-index key).
    pub fn reshape(&self, mut row: Row) -> Row {
        for key in &self.keys {
            let Some(value) = row.get(&key.flat).cloned() else {
                continue;
            };
            if insert_path(&mut row, &key.path, value) {
                row.shift_remove(&key.flat);
            }
        }
        row
    }

    /// Reshape all rows.
    pub fn reshape_all(&self, rows: Vec<Row>) -> Vec<Row> {
        if self.is_noop() {
            return rows;
        }
        rows.into_iter().map(|row| self.reshape(row)).collect()
    }
}

fn insert_path(target: &mut Map<String, Value>, path: &[String], value: Value) -> bool {
    let Some((first, rest)) = path.split_first() else {
        return false;
    };
    if rest.is_empty() {
        target.insert(first.clone(), value);
        return true;
    }
    let slot = target.entry(first.clone()).or_insert(Value::Null);
    insert_into(slot, rest, value)
}

fn insert_into(slot: &mut Value, path: &[String], value: Value) -> bool {
    let Some((key, rest)) = path.split_first() else {
        return false;
    };
    if !open_container(slot, key) {
        return false;
    }
    let child = match slot {
        Value::Object(map) => map.entry(key.clone()).or_insert(Value::Null),
        Value::Array(items) => {
            let Some(idx) = array_index(key) else {
                return false;
            };
            if items.len() <= idx {
                items.resize(idx + 1, Value::Null);
            }
            &mut items[idx]
        }
        _ => return false,
    };
    if rest.is_empty() {
        *child = value;
        return true;
    }
    insert_into(child, rest, value)
}

/// Make `slot` an object or array that `key` can address.
///
/// `null` becomes a fresh container (an array for index keys), a JSON-encoded
/// string is decoded in place, existing containers are kept. Anything else
/// holds data that must not be overwritten.
fn open_container(slot: &mut Value, key: &str) -> bool {
    let decoded = match slot {
        Value::Object(_) => return true,
        Value::Array(_) => return array_index(key).is_some(),
        Value::Null if array_index(key).is_some() => Value::Array(Vec::new()),
        Value::Null => Value::Object(Map::new()),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Value::Object(map),
            Ok(Value::Array(items)) if array_index(key).is_some() => Value::Array(items),
            _ => return false,
        },
        _ => return false,
    };
    *slot = decoded;
    true
}

fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}
