//! SELECT query builder and its execution façade.

use crate::client::Executor;
use crate::column::ColumnExpr;
use crate::config::QbConfig;
use crate::error::{WeaveError, WeaveResult};
use crate::ident::Ident;
use crate::qb::filter::{check, impl_filter_methods, record};
use crate::qb::query::{
    Aggregate, JoinClause, JoinKind, OrderSpec, QuerySpec, assemble, assemble_aggregate,
};
use crate::qb::traits::{BuiltQuery, SqlQb};
use crate::row::{FromRow, Row, RowExt};
use crate::shape::ResultShaper;
use serde_json::Value;
use std::sync::Arc;

/// SELECT query builder.
///
/// Every call records into a [`QuerySpec`]; nothing is rendered until a
/// terminal call. The first invalid call is remembered and returned by
/// [`SelectQb::build`] and by every terminal call, before any executor is used.
#[derive(Clone, Debug)]
pub struct SelectQb {
    spec: QuerySpec,
    config: Arc<QbConfig>,
    build_error: Option<WeaveError>,
}

impl SelectQb {
    /// Create a new SELECT query builder for a table.
    pub fn new(table: &str) -> Self {
        Self::with_config(table, QbConfig::shared())
    }

    /// Create a builder that uses `config` instead of the shared default.
    pub fn with_config(table: &str, config: Arc<QbConfig>) -> Self {
        Self {
            spec: QuerySpec::default(),
            config,
            build_error: None,
        }
        .table(table)
    }

    /// Set (or replace) the table.
    ///
    /// Columns are qualified with the table when they are added, so the table
    /// can only change before any column, join, filter, grouping or ordering.
    pub fn table(mut self, table: &str) -> Self {
        if self.spec.table.is_some() && self.has_qualified_parts() {
            return self.fail(WeaveError::validation(format!(
                "Cannot change table to '{table}' after columns were added"
            )));
        }
        match Ident::parse(table) {
            Ok(ident) => self.spec.table = Some(ident),
            Err(err) => record(&mut self.build_error, Err(err)),
        }
        self
    }

    fn has_qualified_parts(&self) -> bool {
        let spec = &self.spec;
        !(spec.columns.is_empty()
            && spec.joins.is_empty()
            && spec.conditions.is_empty()
            && spec.group_by.is_empty()
            && spec.order_by.is_empty())
    }

    /// Emit `SELECT DISTINCT`.
    pub fn distinct(mut self) -> Self {
        self.spec.distinct = true;
        self
    }

    // ==================== Projection ====================

    /// Append projected columns. Without any, the query selects `*`.
    ///
    /// Accepts `column`, `table.column`, `column->key->key` (JSON text
    /// extraction), `* / table.*`, allow-listed function calls, each with an
    /// optional ` AS alias`.
    ///
    /// Two projections producing the same result key are rejected; give one
    /// of them an explicit alias.
    pub fn select(mut self, columns: &[&str]) -> Self {
        for raw in columns {
            let parsed =
                ColumnExpr::parse_projection(raw, self.spec.table.as_ref(), &self.config)
                    .and_then(|column| self.check_output_key(raw, column));
            match parsed {
                Ok(column) => self.spec.columns.push(column),
                Err(err) => record(&mut self.build_error, Err(err)),
            }
        }
        self
    }

    fn check_output_key(&self, raw: &str, column: ColumnExpr) -> WeaveResult<ColumnExpr> {
        let Some(key) = column.output_key() else {
            return Ok(column);
        };
        let taken = self
            .spec
            .columns
            .iter()
            .any(|existing| existing.output_key().as_deref() == Some(key.as_str()));
        if taken {
            return Err(WeaveError::validation(format!(
                "Projection '{}' repeats result key '{key}'",
                raw.trim()
            )));
        }
        Ok(column)
    }

    // ==================== JOIN ====================

    /// Add a join of `kind` (`INNER`, `LEFT`, `RIGHT`): `kind JOIN table ON left = right`.
    pub fn join(self, kind: &str, table: &str, left: &str, right: &str) -> Self {
        match kind.parse::<JoinKind>() {
            Ok(kind) => self.join_kind(kind, table, left, right),
            Err(err) => self.fail(err),
        }
    }

    /// Add a join with a typed kind.
    pub fn join_kind(mut self, kind: JoinKind, table: &str, left: &str, right: &str) -> Self {
        let parsed = JoinClause::parse(
            kind,
            table,
            left,
            right,
            self.spec.table.as_ref(),
            &self.config,
        );
        match parsed {
            Ok(join) => self.spec.joins.push(join),
            Err(err) => record(&mut self.build_error, Err(err)),
        }
        self
    }

    /// Add INNER JOIN.
    pub fn inner_join(self, table: &str, left: &str, right: &str) -> Self {
        self.join_kind(JoinKind::Inner, table, left, right)
    }

    /// Add LEFT JOIN.
    pub fn left_join(self, table: &str, left: &str, right: &str) -> Self {
        self.join_kind(JoinKind::Left, table, left, right)
    }

    /// Add RIGHT JOIN.
    pub fn right_join(self, table: &str, left: &str, right: &str) -> Self {
        self.join_kind(JoinKind::Right, table, left, right)
    }

    // ==================== WHERE ====================

    impl_filter_methods! { tree: spec.conditions, table: spec.table }

    // ==================== Grouping & Ordering ====================

    /// Append GROUP BY columns.
    pub fn group_by(mut self, columns: &[&str]) -> Self {
        for raw in columns {
            match ColumnExpr::parse_column(raw, self.spec.table.as_ref(), &self.config) {
                Ok(column) => self.spec.group_by.push(column),
                Err(err) => record(&mut self.build_error, Err(err)),
            }
        }
        self
    }

    /// Append ORDER BY entries: `-col` descending, `col` / `+col` ascending.
    pub fn order_by(mut self, entries: &[&str]) -> Self {
        for raw in entries {
            match OrderSpec::parse(raw, self.spec.table.as_ref(), &self.config) {
                Ok(order) => self.spec.order_by.push(order),
                Err(err) => record(&mut self.build_error, Err(err)),
            }
        }
        self
    }

    // ==================== Pagination ====================

    /// Set LIMIT.
    pub fn limit(mut self, n: u64) -> Self {
        self.spec.limit = Some(n);
        self
    }

    /// Set OFFSET.
    pub fn offset(mut self, n: u64) -> Self {
        self.spec.offset = Some(n);
        self
    }

    /// Pagination helper.
    ///
    /// `page` is 1-based (clamped to >= 1).
    /// `per_page` is clamped to >= 1.
    pub fn paginate(mut self, page: u64, per_page: u64) -> Self {
        let p = page.max(1);
        let size = per_page.max(1);
        self.spec.limit = Some(size);
        self.spec.offset = Some((p - 1).saturating_mul(size));
        self
    }

    // ==================== Build ====================

    fn fail(mut self, err: WeaveError) -> Self {
        record(&mut self.build_error, Err(err));
        self
    }

    /// The accumulated query state.
    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    /// Shaper for rows produced by this projection.
    pub fn shaper(&self) -> ResultShaper {
        ResultShaper::from_columns(&self.spec.columns)
    }

    /// Build the aggregate form: `SELECT FN([DISTINCT ]column) FROM ...`.
    ///
    /// `func` is one of `AVG, AVG_DISTINCT, COUNT, COUNT_DISTINCT, MAX, MIN,
    /// SUM, SUM_DISTINCT`; `column` may be `*` for `COUNT`.
    pub fn build_aggregate(&self, func: &str, column: &str) -> WeaveResult<BuiltQuery> {
        check(&self.build_error)?;
        let aggregate: Aggregate = func.parse()?;
        let column =
            ColumnExpr::parse_aggregate_arg(column, self.spec.table.as_ref(), &self.config)?;
        assemble_aggregate(&self.spec, aggregate, &column)
    }

    fn build_first(&self) -> WeaveResult<BuiltQuery> {
        check(&self.build_error)?;
        if self.spec.limit.is_some() {
            return assemble(&self.spec);
        }
        let mut spec = self.spec.clone();
        spec.limit = Some(1);
        assemble(&spec)
    }

    // ==================== Execution ====================

    /// Execute and return all rows, with JSON-extracted columns nested.
    pub async fn get(&self, exec: &impl Executor) -> WeaveResult<Vec<Row>> {
        let rows = self.fetch_rows(exec).await?;
        Ok(self.shaper().reshape_all(rows))
    }

    /// Execute and return the first row (`LIMIT 1` unless a limit is set).
    pub async fn row(&self, exec: &impl Executor) -> WeaveResult<Option<Row>> {
        let built = self.build_first()?;
        built.log();
        let row = exec.fetch_opt(&built.sql, built.params()).await?;
        Ok(row.map(|row| self.shaper().reshape(row)))
    }

    /// Execute and return the first column of the first row.
    pub async fn single(&self, exec: &impl Executor) -> WeaveResult<Option<Value>> {
        let built = self.build_first()?;
        built.log();
        let row = exec.fetch_opt(&built.sql, built.params()).await?;
        Ok(row.and_then(|row| row.first_value().cloned()))
    }

    /// Execute the aggregate form and return its value (`Null` without a row).
    pub async fn aggregate(
        &self,
        exec: &impl Executor,
        func: &str,
        column: &str,
    ) -> WeaveResult<Value> {
        let built = self.build_aggregate(func, column)?;
        built.log();
        let row = exec.fetch_opt(&built.sql, built.params()).await?;
        Ok(row
            .and_then(|row| row.first_value().cloned())
            .unwrap_or(Value::Null))
    }

    /// Execute and map all rows to `T`.
    pub async fn get_as<T: FromRow>(&self, exec: &impl Executor) -> WeaveResult<Vec<T>> {
        let rows = self.get(exec).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Execute and map the first row to `T`.
    pub async fn row_as<T: FromRow>(&self, exec: &impl Executor) -> WeaveResult<Option<T>> {
        let row = self.row(exec).await?;
        row.as_ref().map(T::from_row).transpose()
    }
}

impl SqlQb for SelectQb {
    fn build(&self) -> WeaveResult<BuiltQuery> {
        check(&self.build_error)?;
        assemble(&self.spec)
    }
}
