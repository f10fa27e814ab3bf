//! Row representation and mapping traits.
//!
//! Executors hand back rows as JSON objects keyed by output column name. Typed
//! access goes through serde, so any `Deserialize` struct is a valid row type.

use crate::error::{WeaveError, WeaveResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// One result row: output column name to value.
pub type Row = serde_json::Map<String, Value>;

/// Trait for converting a result row into a Rust type.
///
/// Implemented for every `DeserializeOwned` type; nested JSON columns map onto
/// nested structs after reshaping.
///
/// # Example
///
/// ```ignore
/// #[derive(serde::Deserialize)]
/// struct Product {
///     name: String,
///     supplier: Supplier,
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a row into Self
    fn from_row(row: &Row) -> WeaveResult<Self>;
}

impl<T: DeserializeOwned> FromRow for T {
    fn from_row(row: &Row) -> WeaveResult<Self> {
        serde_json::from_value(Value::Object(row.clone()))
            .map_err(|e| WeaveError::decode("<row>", e.to_string()))
    }
}

/// Extension trait for Row to provide typed access
pub trait RowExt {
    /// Get a column value, returning WeaveError::Decode on failure
    fn try_get_column<T: DeserializeOwned>(&self, column: &str) -> WeaveResult<T>;

    /// The value of the first column, if any.
    fn first_value(&self) -> Option<&Value>;
}

impl RowExt for Row {
    fn try_get_column<T: DeserializeOwned>(&self, column: &str) -> WeaveResult<T> {
        let value = self
            .get(column)
            .ok_or_else(|| WeaveError::decode(column, "column not present"))?;
        T::deserialize(value).map_err(|e| WeaveError::decode(column, e.to_string()))
    }

    fn first_value(&self) -> Option<&Value> {
        self.values().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Supplier {
        email: String,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Product {
        name: String,
        supplier: Supplier,
    }

    #[test]
    fn from_row_deserializes_nested() {
        let r = row(json!({"name": "Widget", "supplier": {"email": "a@b.c"}}));
        let p = Product::from_row(&r).unwrap();
        assert_eq!(p.supplier.email, "a@b.c");
    }

    #[test]
    fn from_row_reports_decode_error() {
        let r = row(json!({"name": 1}));
        assert!(matches!(
            Product::from_row(&r),
            Err(WeaveError::Decode { .. })
        ));
    }

    #[test]
    fn try_get_column() {
        let r = row(json!({"n": 3, "name": "x"}));
        assert_eq!(r.try_get_column::<i64>("n").unwrap(), 3);
        assert!(r.try_get_column::<i64>("missing").is_err());
        assert!(r.try_get_column::<i64>("name").is_err());
        assert_eq!(r.first_value(), Some(&json!(3)));
    }
}
