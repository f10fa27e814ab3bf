//! # sqlweave
//!
//! A parameterized SQL statement assembler for MySQL.
//!
//! ## Features
//!
//! - **Always parameterized**: every value becomes a positional `?`, and the
//!   value list always has exactly one entry per placeholder, in order
//! - **Compact filter DSL**: `filter("price", "gt", "20.00")`, `filter("color", "in", "red,blue")`
//! - **JSON paths**: `supplier->address->city` reads a key inside a JSON column;
//!   row results are reshaped into nested objects
//! - **Grouped conditions**: `start_group` / `end_group` with AND/OR connectors,
//!   validated for balance
//! - **Aggregates**: `COUNT`, `COUNT_DISTINCT`, `SUM`, ... over the filtered set
//! - **Function passthrough**: an allow-listed call such as `NOW()` is embedded as-is
//! - **Executor-agnostic**: builders run against anything implementing [`Executor`];
//!   a MySQL pool implementation ships behind the `mysql` feature
//!
//! ## Query Builder (qb)
//!
//! ```ignore
//! use sqlweave::prelude::*;
//!
//! // SELECT
//! let products = select("products")
//!     .select(&["name", "price", "supplier->email"])
//!     .filter("price", "gt", "20.00")
//!     .order_by(&["-price"])
//!     .limit(10)
//!     .get(&exec)
//!     .await?;
//!
//! // Aggregate over the same filters
//! let n = select("products")
//!     .filter("price", "gt", "20.00")
//!     .aggregate(&exec, "COUNT_DISTINCT", "color")
//!     .await?;
//!
//! // INSERT / UPDATE / DELETE
//! insert("products").set("name", "Widget").execute(&exec).await?;
//! update("products").set("price", 9.5).filter("id", "eq", "7").execute(&exec).await?;
//! delete("products").filter("id", "eq", "7").execute(&exec).await?;
//! ```

pub mod client;
pub mod column;
pub mod condition;
pub mod config;
pub mod error;
pub mod functions;
pub mod ident;
pub mod prelude;
pub mod qb;
pub mod registry;
pub mod row;
pub mod shape;

#[cfg(feature = "mysql")]
pub mod mysql;

pub use client::Executor;
pub use column::ColumnExpr;
pub use condition::{Fragment, Operator, translate};
pub use config::{QbConfig, WeaveConfig};
pub use error::{WeaveError, WeaveResult};
pub use functions::{DEFAULT_FUNCTIONS, FunctionAllowList};
pub use ident::Ident;
pub use registry::{ConnectionRegistry, ConnectionStats, RegistryConfig};
pub use row::{FromRow, Row, RowExt};
pub use shape::ResultShaper;

// Re-export qb module for easy access
pub use qb::{
    BuiltQuery, Connector, DeleteQb, InsertQb, MutationQb, Param, QuerySpec, SelectQb, SqlQb,
    UpdateQb, delete, insert, select, update,
};

#[cfg(feature = "mysql")]
pub use mysql::MySqlExecutor;
