//! Warehouse backend seam
//!
//! One [`Backend`] per registered instance. The postgres wire driver covers
//! Hologres and Redshift; the mysql driver covers MySQL and PolarDB. Pools
//! are opened lazily, so registration performs no network I/O and a failed
//! connect surfaces at query time as an execution failure.

mod maxcompute;
mod mysql;
mod postgres;

pub use maxcompute::MaxComputeBackend;
pub use mysql::MySqlBackend;
pub use postgres::PostgresBackend;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{0}")]
    Sql(#[from] sqlx::Error),

    #[error("Query timed out after {0}s")]
    Timeout(u64),

    #[error("{0}")]
    Unsupported(String),
}

/// Ordered tabular result: column order is the backend's, row values are
/// keyed by column name.
#[derive(Debug, Clone, Default)]
pub struct TableData {
    pub columns: Vec<String>,
    pub rows: Vec<serde_json::Map<String, Value>>,
}

/// An opened, reusable session with one warehouse instance
///
/// Implementations must tolerate concurrent independent calls; execution is
/// a per-call checkout from the underlying pool.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Run a row-returning statement
    async fn query(&self, sql: &str, timeout: Duration) -> Result<TableData, BackendError>;

    /// Run a non-row statement, returning the affected count where the
    /// driver reports one
    async fn execute(&self, sql: &str, timeout: Duration) -> Result<Option<u64>, BackendError>;
}

/// Bound a backend call with the configured per-query timeout
pub(crate) async fn bounded<T>(
    timeout: Duration,
    fut: impl std::future::Future<Output = Result<T, sqlx::Error>>,
) -> Result<T, BackendError> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(BackendError::from),
        Err(_) => Err(BackendError::Timeout(timeout.as_secs())),
    }
}
