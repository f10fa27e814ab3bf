//! Trait definitions for query builders.

use crate::client::Executor;
use crate::error::WeaveResult;
use crate::qb::param::{Param, ParamList};
use crate::row::Row;
use std::future::Future;

/// Log target for every statement handed to an executor.
pub const SQL_LOG_TARGET: &str = "sqlweave.sql";

/// The result of building a query.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: ParamList,
}

impl BuiltQuery {
    /// Create a new built query.
    pub fn new(sql: String, params: ParamList) -> Self {
        Self { sql, params }
    }

    /// Values in binding order.
    pub fn params(&self) -> &[Param] {
        self.params.as_slice()
    }

    /// Number of `?` markers outside quoted literals and identifiers.
    pub fn placeholder_count(&self) -> usize {
        placeholder_positions(&self.sql).len()
    }

    /// The statement with every placeholder replaced by its literal value.
    ///
    /// For logging and debugging only; never send the result to a database.
    pub fn to_debug_sql(&self) -> String {
        let mut out = String::with_capacity(self.sql.len());
        let mut values = self.params.as_slice().iter();
        let mut last = 0;
        for pos in placeholder_positions(&self.sql) {
            out.push_str(&self.sql[last..pos]);
            match values.next() {
                Some(value) => out.push_str(&value.to_sql_literal()),
                None => out.push('?'),
            }
            last = pos + 1;
        }
        out.push_str(&self.sql[last..]);
        out
    }

    pub(crate) fn log(&self) {
        tracing::debug!(
            target: SQL_LOG_TARGET,
            sql = %self.sql,
            params = self.params.len(),
            "executing statement"
        );
    }
}

/// Byte offsets of the `?` markers that are not inside `'...'`, `"..."` or
/// `` `...` ``. Backslash escapes apply to the two string quotes only.
fn placeholder_positions(sql: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (idx, ch) in sql.char_indices() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(open) if ch == '\\' && open != '`' => escaped = true,
            Some(open) if ch == open => quote = None,
            Some(_) => {}
            None => match ch {
                '\'' | '"' | '`' => quote = Some(ch),
                '?' => positions.push(idx),
                _ => {}
            },
        }
    }
    positions
}

/// Base trait for all query builders.
pub trait SqlQb: Sync {
    /// Assemble the statement, or return the first error recorded while building.
    fn build(&self) -> WeaveResult<BuiltQuery>;

    /// Debug helper to get the SQL string.
    fn to_sql(&self) -> WeaveResult<String> {
        self.build().map(|built| built.sql)
    }

    /// Execute and return the raw rows, without any reshaping.
    fn fetch_rows(
        &self,
        exec: &impl Executor,
    ) -> impl Future<Output = WeaveResult<Vec<Row>>> + Send {
        async move {
            let built = self.build()?;
            built.log();
            exec.fetch(&built.sql, built.params()).await
        }
    }
}

/// Trait for mutation builders (INSERT/UPDATE/DELETE).
pub trait MutationQb: SqlQb {
    /// Execute and return affected row count.
    fn execute(&self, exec: &impl Executor) -> impl Future<Output = WeaveResult<u64>> + Send {
        async move {
            let built = self.build()?;
            built.log();
            exec.execute(&built.sql, built.params()).await
        }
    }
}
