//! DELETE query builder.

use crate::config::QbConfig;
use crate::error::{WeaveError, WeaveResult};
use crate::ident::Ident;
use crate::qb::filter::{check, impl_filter_methods, record};
use crate::qb::param::ParamList;
use crate::qb::traits::{BuiltQuery, MutationQb, SqlQb};
use crate::qb::tree::ConditionTree;
use std::sync::Arc;

/// DELETE query builder sharing the SELECT condition engine.
#[derive(Clone, Debug)]
pub struct DeleteQb {
    table: Option<Ident>,
    tree: ConditionTree,
    /// Whether to allow DELETE without WHERE (dangerous!)
    allow_delete_all: bool,
    config: Arc<QbConfig>,
    build_error: Option<WeaveError>,
}

impl DeleteQb {
    /// Create a new DELETE query builder.
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
            tree: ConditionTree::new(),
            allow_delete_all: false,
            config,
            build_error,
        }
    }

    /// Allow DELETE without WHERE conditions (dangerous!).
    ///
    /// By default, DELETE without WHERE generates `WHERE 1=0` (no-op).
    /// Call this with `true` to allow deleting all rows.
    pub fn allow_delete_all(mut self, allow: bool) -> Self {
        self.allow_delete_all = allow;
        self
    }

    impl_filter_methods! { tree: tree, table: table }
}

impl SqlQb for DeleteQb {
    fn build(&self) -> WeaveResult<BuiltQuery> {
        check(&self.build_error)?;
        let table = self.table.as_ref().ok_or(WeaveError::MissingTable)?;
        let mut sql = format!("DELETE FROM {}", table.to_sql());
        let mut params = ParamList::new();

        if self.tree.is_empty() {
            if !self.allow_delete_all {
                sql.push_str(" WHERE 1=0");
            }
            return Ok(BuiltQuery::new(sql, params));
        }

        self.tree.render_into(&mut sql, &mut params)?;
        Ok(BuiltQuery::new(sql, params))
    }
}

impl MutationQb for DeleteQb {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_with_filter() {
        let built = DeleteQb::new("sessions")
            .filter("expires_at", "lt", "NOW()")
            .or_filter("revoked", "eq", "1")
            .build()
            .unwrap();
        assert_eq!(
            built.sql,
            "DELETE FROM sessions WHERE sessions.expires_at < NOW() OR sessions.revoked = ?"
        );
        assert_eq!(built.params.len(), 1);
    }

    #[test]
    fn test_delete_without_where_is_noop() {
        let built = DeleteQb::new("sessions").build().unwrap();
        assert_eq!(built.sql, "DELETE FROM sessions WHERE 1=0");
    }

    #[test]
    fn test_delete_all_when_allowed() {
        let built = DeleteQb::new("sessions").allow_delete_all(true).build().unwrap();
        assert_eq!(built.sql, "DELETE FROM sessions");
    }

    #[test]
    fn test_delete_unbalanced_group() {
        let err = DeleteQb::new("sessions")
            .filter("id", "eq", "1")
            .end_group()
            .build()
            .unwrap_err();
        assert!(matches!(err, WeaveError::UnbalancedGroup(_)));
    }
}
