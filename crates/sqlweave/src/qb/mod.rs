//! Query builders for sqlweave.
//!
//! Builders collect declarative calls and assemble a MySQL statement that uses
//! positional `?` placeholders, plus the values for those placeholders in the
//! same order.
//!
//! # Features
//!
//! - **Filter DSL**: `filter(column, operator, value)` with a closed operator set
//!   (`eq`, `has`, `in`, `null`, ...), see [`crate::Operator`]
//! - **JSON paths**: `column->key->key` addresses keys inside JSON columns
//! - **Grouping**: `start_group` / `end_group` for parenthesized AND/OR logic
//! - **Aggregates**: the same builder renders `SELECT COUNT(DISTINCT col) ...`
//! - **First error wins**: invalid calls are recorded and surface from `build()`
//!   or the terminal call, before anything is executed
//!
//! # Usage
//!
//! ```ignore
//! use sqlweave::qb;
//!
//! let rows = qb::select("products")
//!     .select(&["name", "supplier->email"])
//!     .filter("price", "gt", "20.00")
//!     .start_group(Connector::And)
//!     .filter("color", "eq", "red")
//!     .or_filter("color", "eq", "blue")
//!     .end_group()
//!     .order_by(&["-price"])
//!     .limit(20)
//!     .get(&exec)
//!     .await?;
//!
//! let colors = qb::select("products")
//!     .filter("price", "gt", "20.00")
//!     .aggregate(&exec, "COUNT_DISTINCT", "color")
//!     .await?;
//!
//! qb::update("products")
//!     .set("price", 19.99)
//!     .filter("id", "eq", "42")
//!     .execute(&exec)
//!     .await?;
//! ```

mod delete;
pub(crate) mod filter;
mod insert;
pub(crate) mod param;
mod query;
mod select;
mod traits;
mod tree;
mod update;

use crate::config::QbConfig;
use std::sync::Arc;

pub use delete::DeleteQb;
pub use insert::InsertQb;
pub use param::{Param, ParamList};
pub use query::{
    Aggregate, AggregateFn, Direction, JoinClause, JoinKind, NO_LIMIT, OrderSpec, QuerySpec,
    assemble, assemble_aggregate,
};
pub use select::SelectQb;
pub use traits::{BuiltQuery, MutationQb, SQL_LOG_TARGET, SqlQb};
pub use tree::{ConditionTree, Connector};
pub use update::UpdateQb;

/// Create a SELECT query builder for the given table.
///
/// # Example
/// ```ignore
/// let qb = sqlweave::qb::select("users").filter("id", "eq", "1");
/// ```
pub fn select(table: &str) -> SelectQb {
    SelectQb::new(table)
}

/// Create a SELECT query builder with an explicit configuration.
pub fn select_with(table: &str, config: Arc<QbConfig>) -> SelectQb {
    SelectQb::with_config(table, config)
}

/// Create an INSERT query builder for the given table.
///
/// # Example
/// ```ignore
/// let qb = sqlweave::qb::insert("users")
///     .set("username", "alice")
///     .set("email", "alice@example.com");
/// ```
pub fn insert(table: &str) -> InsertQb {
    InsertQb::new(table)
}

/// Create an INSERT query builder with an explicit configuration.
pub fn insert_with(table: &str, config: Arc<QbConfig>) -> InsertQb {
    InsertQb::with_config(table, config)
}

/// Create an UPDATE query builder for the given table.
pub fn update(table: &str) -> UpdateQb {
    UpdateQb::new(table)
}

/// Create an UPDATE query builder with an explicit configuration.
pub fn update_with(table: &str, config: Arc<QbConfig>) -> UpdateQb {
    UpdateQb::with_config(table, config)
}

/// Create a DELETE query builder for the given table.
///
/// # Safety
/// By default, DELETE without WHERE conditions will generate `WHERE 1=0` (no-op).
/// Use `allow_delete_all(true)` to allow deleting all rows.
pub fn delete(table: &str) -> DeleteQb {
    DeleteQb::new(table)
}

/// Create a DELETE query builder with an explicit configuration.
pub fn delete_with(table: &str, config: Arc<QbConfig>) -> DeleteQb {
    DeleteQb::with_config(table, config)
}
