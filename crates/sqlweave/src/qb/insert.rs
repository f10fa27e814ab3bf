//! INSERT query builder.

use crate::config::QbConfig;
use crate::error::{WeaveError, WeaveResult};
use crate::ident::Ident;
use crate::qb::filter::{check, record};
use crate::qb::param::{Param, ParamList};
use crate::qb::traits::{BuiltQuery, MutationQb, SqlQb};
use std::sync::Arc;

/// Value expression for INSERT.
#[derive(Clone, Debug, PartialEq)]
enum ValueExpr {
    /// Parameterized value
    Param(Param),
    /// Allow-listed function call, embedded verbatim
    Function(String),
}

/// INSERT query builder: `INSERT INTO t (a, b) VALUES (?, ?)`.
#[derive(Clone, Debug)]
pub struct InsertQb {
    table: Option<Ident>,
    columns: Vec<Ident>,
    values: Vec<ValueExpr>,
    config: Arc<QbConfig>,
    build_error: Option<WeaveError>,
}

impl InsertQb {
    /// Create a new INSERT query builder.
    pub fn new(table: &str) -> Self {
        Self::with_config(table, QbConfig::shared())
    }

    /// Create a builder that uses `config` instead of the shared default.
    pub fn with_config(table: &str, config: Arc<QbConfig>) -> Self {
        let mut build_error = None;
        let table = match Ident::parse(table) {
            Ok(ident) => Some(ident),
            Err(err) => {
                record(&mut build_error, Err(err));
                None
            }
        };
        Self {
            table,
            columns: Vec::new(),
            values: Vec::new(),
            config,
            build_error,
        }
    }

    fn push(mut self, column: &str, value: ValueExpr) -> Self {
        match Ident::parse(column) {
            Ok(ident) => {
                self.columns.push(ident);
                self.values.push(value);
            }
            Err(err) => record(&mut self.build_error, Err(err)),
        }
        self
    }

    /// Set a column value.
    pub fn set(self, column: &str, value: impl Into<Param>) -> Self {
        self.push(column, ValueExpr::Param(value.into()))
    }

    /// Set an optional column value (None => skip).
    pub fn set_opt<T: Into<Param>>(self, column: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Set a column to an allow-listed function call, e.g. `NOW()`.
    pub fn set_function(mut self, column: &str, call: &str) -> Self {
        let checked = self.config.functions.passthrough(call);
        match checked {
            Ok(true) => self.push(column, ValueExpr::Function(call.to_string())),
            Ok(false) => {
                let err = WeaveError::validation(format!("'{call}' is not an allowed function call"));
                record(&mut self.build_error, Err(err));
                self
            }
            Err(err) => {
                record(&mut self.build_error, Err(err));
                self
            }
        }
    }
}

impl SqlQb for InsertQb {
    fn build(&self) -> WeaveResult<BuiltQuery> {
        check(&self.build_error)?;
        let table = self.table.as_ref().ok_or(WeaveError::MissingTable)?;
        if self.columns.is_empty() {
            return Err(WeaveError::validation("INSERT requires at least one column"));
        }

        let mut params = ParamList::new();
        let values: Vec<String> = self
            .values
            .iter()
            .map(|value| match value {
                ValueExpr::Param(param) => {
                    params.push(param.clone());
                    "?".to_string()
                }
                ValueExpr::Function(call) => call.clone(),
            })
            .collect();
        let columns: Vec<String> = self.columns.iter().map(Ident::to_sql).collect();

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.to_sql(),
            columns.join(", "),
            values.join(", ")
        );
        Ok(BuiltQuery::new(sql, params))
    }
}

impl MutationQb for InsertQb {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_insert() {
        let built = InsertQb::new("users")
            .set("username", "alice")
            .set("active", true)
            .build()
            .unwrap();
        assert_eq!(built.sql, "INSERT INTO users (username, active) VALUES (?, ?)");
        assert_eq!(built.params(), &[Param::from("alice"), Param::Bool(true)]);
    }

    #[test]
    fn test_insert_with_function() {
        let built = InsertQb::new("users")
            .set("username", "alice")
            .set_function("created_at", "NOW()")
            .set_opt("nickname", None::<&str>)
            .build()
            .unwrap();
        assert_eq!(
            built.sql,
            "INSERT INTO users (username, created_at) VALUES (?, NOW())"
        );
        assert_eq!(built.params.len(), 1);
    }

    #[test]
    fn test_insert_rejects_function_with_marker() {
        let err = InsertQb::new("users")
            .set_function("nickname", "IFNULL(alias, ?)")
            .set("username", "alice")
            .build()
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_insert_requires_columns() {
        let err = InsertQb::new("users").build().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_insert_rejects_bad_column() {
        let err = InsertQb::new("users").set("a b", 1i64).build().unwrap_err();
        assert!(err.is_validation());
    }
}
