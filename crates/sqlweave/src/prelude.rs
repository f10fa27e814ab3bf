//! Convenient imports for typical `sqlweave` usage.
//!
//! ```ignore
//! use sqlweave::prelude::*;
//! ```

pub use crate::qb::{Connector, MutationQb, SqlQb};
pub use crate::{Executor, FromRow, Operator, QbConfig, Row, RowExt, WeaveError, WeaveResult};
pub use crate::{delete, insert, select, update};

#[cfg(feature = "mysql")]
pub use crate::MySqlExecutor;
