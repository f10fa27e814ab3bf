//! The executor capability the builders run against.

use crate::error::WeaveResult;
use crate::qb::Param;
use crate::row::Row;
use std::future::Future;
use std::sync::Arc;

/// Anything that can run a `?`-parameterized statement.
///
/// Implementations bind `params[i]` to the i-th `?` in `sql`. Errors are passed
/// back to the caller unchanged; the builders never retry.
pub trait Executor: Send + Sync {
    /// Run a query and return all rows.
    fn fetch(
        &self,
        sql: &str,
        params: &[Param],
    ) -> impl Future<Output = WeaveResult<Vec<Row>>> + Send;

    /// Run a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[Param],
    ) -> impl Future<Output = WeaveResult<u64>> + Send;

    /// Run a query and return the first row, if any.
    ///
    /// The default implementation fetches every row and keeps the first; the
    /// caller is expected to have limited the query.
    fn fetch_opt(
        &self,
        sql: &str,
        params: &[Param],
    ) -> impl Future<Output = WeaveResult<Option<Row>>> + Send {
        async move { Ok(self.fetch(sql, params).await?.into_iter().next()) }
    }
}

impl<E: Executor> Executor for &E {
    fn fetch(
        &self,
        sql: &str,
        params: &[Param],
    ) -> impl Future<Output = WeaveResult<Vec<Row>>> + Send {
        (**self).fetch(sql, params)
    }

    fn execute(
        &self,
        sql: &str,
        params: &[Param],
    ) -> impl Future<Output = WeaveResult<u64>> + Send {
        (**self).execute(sql, params)
    }
}

impl<E: Executor> Executor for Arc<E> {
    fn fetch(
        &self,
        sql: &str,
        params: &[Param],
    ) -> impl Future<Output = WeaveResult<Vec<Row>>> + Send {
        (**self).fetch(sql, params)
    }

    fn execute(
        &self,
        sql: &str,
        params: &[Param],
    ) -> impl Future<Output = WeaveResult<u64>> + Send {
        (**self).execute(sql, params)
    }
}
