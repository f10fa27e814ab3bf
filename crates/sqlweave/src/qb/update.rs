//! UPDATE query builder.

use crate::config::QbConfig;
use crate::error::{WeaveError, WeaveResult};
use crate::ident::Ident;
use crate::qb::filter::{check, impl_filter_methods, record};
use crate::qb::param::{Param, ParamList};
use crate::qb::traits::{BuiltQuery, MutationQb, SqlQb};
use crate::qb::tree::ConditionTree;
use std::sync::Arc;

/// SET field value type.
#[derive(Clone, Debug, PartialEq)]
enum SetField {
    /// Parameterized value
    Value(Param),
    /// Allow-listed function call, embedded verbatim
    Function(String),
}

/// UPDATE query builder sharing the SELECT condition engine.
#[derive(Clone, Debug)]
pub struct UpdateQb {
    table: Option<Ident>,
    set_fields: Vec<(Ident, SetField)>,
    tree: ConditionTree,
    config: Arc<QbConfig>,
    build_error: Option<WeaveError>,
}

impl UpdateQb {
    /// Create a new UPDATE query builder.
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
            set_fields: Vec::new(),
            tree: ConditionTree::new(),
            config,
            build_error,
        }
    }

    fn push_set(mut self, column: &str, field: SetField) -> Self {
        match Ident::parse(column) {
            Ok(ident) => self.set_fields.push((ident, field)),
            Err(err) => record(&mut self.build_error, Err(err)),
        }
        self
    }

    /// Set a column value.
    pub fn set(self, column: &str, value: impl Into<Param>) -> Self {
        self.push_set(column, SetField::Value(value.into()))
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
            Ok(true) => self.push_set(column, SetField::Function(call.to_string())),
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

    impl_filter_methods! { tree: tree, table: table }
}

impl SqlQb for UpdateQb {
    fn build(&self) -> WeaveResult<BuiltQuery> {
        check(&self.build_error)?;
        let table = self.table.as_ref().ok_or(WeaveError::MissingTable)?;
        if self.set_fields.is_empty() {
            return Err(WeaveError::validation("UPDATE requires at least one SET column"));
        }

        let mut params = ParamList::new();
        let mut set_parts = Vec::with_capacity(self.set_fields.len());
        for (column, field) in &self.set_fields {
            match field {
                SetField::Value(param) => {
                    params.push(param.clone());
                    set_parts.push(format!("{} = ?", column.to_sql()));
                }
                SetField::Function(call) => {
                    set_parts.push(format!("{} = {}", column.to_sql(), call));
                }
            }
        }

        let mut sql = format!("UPDATE {} SET {}", table.to_sql(), set_parts.join(", "));
        self.tree.render_into(&mut sql, &mut params)?;
        Ok(BuiltQuery::new(sql, params))
    }
}

impl MutationQb for UpdateQb {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_update() {
        let built = UpdateQb::new("users")
            .set("status", "inactive")
            .filter("id", "eq", "1")
            .build()
            .unwrap();
        assert_eq!(built.sql, "UPDATE users SET status = ? WHERE users.id = ?");
        assert_eq!(built.params(), &[Param::from("inactive"), Param::from("1")]);
    }

    #[test]
    fn test_update_multiple_set() {
        let built = UpdateQb::new("users")
            .set("name", "Alice")
            .set("age", 30i64)
            .set_opt("email", None::<String>)
            .filter("id", "eq", "1")
            .build()
            .unwrap();
        assert_eq!(built.sql, "UPDATE users SET name = ?, age = ? WHERE users.id = ?");
        assert_eq!(built.params.len(), 3);
        assert_eq!(built.params()[1], Param::Int(30));
    }

    #[test]
    fn test_update_with_function() {
        let built = UpdateQb::new("users")
            .set_function("updated_at", "NOW()")
            .filter("id", "eq", "1")
            .build()
            .unwrap();
        assert_eq!(built.sql, "UPDATE users SET updated_at = NOW() WHERE users.id = ?");

        let err = UpdateQb::new("users")
            .set_function("updated_at", "SLEEP(10)")
            .build()
            .unwrap_err();
        assert!(err.is_validation());

        let err = UpdateQb::new("users")
            .set_function("updated_at", "NOW()) WHERE (1=1")
            .build()
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_update_requires_set() {
        let err = UpdateQb::new("users").filter("id", "eq", "1").build().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_update_grouped_where() {
        let built = UpdateQb::new("users")
            .set("status", "inactive")
            .filter("status", "eq", "active")
            .start_group(crate::qb::Connector::And)
            .filter("role", "in", "user,guest")
            .or_filter("age", "lt", "18")
            .end_group()
            .build()
            .unwrap();
        assert_eq!(
            built.sql,
            "UPDATE users SET status = ? WHERE users.status = ? AND \
             (users.role IN (?,?) OR users.age < ?)"
        );
        assert_eq!(built.params.len(), built.placeholder_count());
    }
}
