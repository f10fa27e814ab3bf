//! Shared WHERE handling for the SELECT, UPDATE and DELETE builders.

use crate::column::ColumnExpr;
use crate::condition::{Operator, translate};
use crate::config::QbConfig;
use crate::error::{WeaveError, WeaveResult};
use crate::ident::Ident;
use crate::qb::tree::{ConditionTree, Connector};

/// Resolve `column`, translate the operator and append the condition.
pub(crate) fn push_filter(
    tree: &mut ConditionTree,
    table: Option<&Ident>,
    config: &QbConfig,
    connector: Connector,
    column: &str,
    operator: Operator,
    value: &str,
) -> WeaveResult<()> {
    let column = ColumnExpr::parse_column(column, table, config)?;
    let fragment = translate(&column.to_sql(), operator, value, &config.functions)?;
    tree.add_condition(connector, fragment);
    Ok(())
}

/// Same as [`push_filter`], with the operator given as its token.
pub(crate) fn push_filter_token(
    tree: &mut ConditionTree,
    table: Option<&Ident>,
    config: &QbConfig,
    connector: Connector,
    column: &str,
    operator: &str,
    value: &str,
) -> WeaveResult<()> {
    let operator: Operator = operator.parse()?;
    push_filter(tree, table, config, connector, column, operator, value)
}

/// Keep the first error a builder runs into.
pub(crate) fn record(slot: &mut Option<WeaveError>, result: WeaveResult<()>) {
    if let Err(err) = result {
        if slot.is_none() {
            *slot = Some(err);
        }
    }
}

/// Return the recorded error, if any.
pub(crate) fn check(slot: &Option<WeaveError>) -> WeaveResult<()> {
    match slot {
        Some(err) => Err(err.clone()),
        None => Ok(()),
    }
}

/// Generate the filter methods shared by builders that own a condition tree,
/// an optional table, a `config` and a `build_error` slot.
///
/// Usage (inside an `impl` block):
/// ```ignore
/// impl_filter_methods! { tree: spec.conditions, table: spec.table }
/// ```
macro_rules! impl_filter_methods {
    (tree: $($tree:ident).+, table: $($table:ident).+) => {
        /// Add an AND-connected condition: `column <op> value`.
        pub fn filter(self, column: &str, op: &str, value: impl AsRef<str>) -> Self {
            self.filter_with($crate::qb::Connector::And, column, op, value)
        }

        /// Add an OR-connected condition: `column <op> value`.
        pub fn or_filter(self, column: &str, op: &str, value: impl AsRef<str>) -> Self {
            self.filter_with($crate::qb::Connector::Or, column, op, value)
        }

        /// Add a condition with an explicit connector.
        pub fn filter_with(
            mut self,
            connector: $crate::qb::Connector,
            column: &str,
            op: &str,
            value: impl AsRef<str>,
        ) -> Self {
            let result = $crate::qb::filter::push_filter_token(
                &mut self.$($tree).+,
                self.$($table).+.as_ref(),
                &self.config,
                connector,
                column,
                op,
                value.as_ref(),
            );
            $crate::qb::filter::record(&mut self.build_error, result);
            self
        }

        /// Add an AND-connected condition with a typed operator.
        pub fn filter_op(
            mut self,
            column: &str,
            op: $crate::condition::Operator,
            value: impl AsRef<str>,
        ) -> Self {
            let result = $crate::qb::filter::push_filter(
                &mut self.$($tree).+,
                self.$($table).+.as_ref(),
                &self.config,
                $crate::qb::Connector::And,
                column,
                op,
                value.as_ref(),
            );
            $crate::qb::filter::record(&mut self.build_error, result);
            self
        }

        /// Open a parenthesized group joined by `connector`.
        pub fn start_group(mut self, connector: $crate::qb::Connector) -> Self {
            self.$($tree).+.start_group(connector);
            self
        }

        /// Close the innermost group.
        pub fn end_group(mut self) -> Self {
            let result = self.$($tree).+.end_group();
            $crate::qb::filter::record(&mut self.build_error, result);
            self
        }
    };
}

pub(crate) use impl_filter_methods;
