//! Query execution against a resolved instance
//!
//! Every failure mode resolves to a returned [`QueryOutcome`]; nothing from
//! this boundary is allowed to escape as an error, and no operation is
//! retried.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::registry::ConnectionRegistry;
use crate::safety::{self, SafetyChecker};

/// Result envelope for one execution attempt
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum QueryOutcome {
    Rows {
        success: bool,
        platform: String,
        columns: Vec<String>,
        rows: Vec<serde_json::Map<String, Value>>,
        row_count: usize,
        query: String,
    },
    Acknowledged {
        success: bool,
        platform: String,
        message: String,
        rowcount: Option<u64>,
        query: String,
    },
    Failure {
        success: bool,
        platform: String,
        error: String,
        query: String,
    },
}

impl QueryOutcome {
    pub fn failure(platform: &str, error: impl Into<String>, query: &str) -> Self {
        QueryOutcome::Failure {
            success: false,
            platform: platform.to_string(),
            error: error.into(),
            query: query.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, QueryOutcome::Failure { .. })
    }
}

/// Execute a query on the named instance
///
/// An optional row cap is applied here independently of the validator's
/// auto-limit; both injection points check for an existing LIMIT token, so
/// a query limited once is never limited twice.
pub async fn run(
    registry: &ConnectionRegistry,
    instance_key: &str,
    query: &str,
    row_cap: Option<u32>,
    timeout: Duration,
) -> QueryOutcome {
    let Some(instance) = registry.resolve(instance_key) else {
        return QueryOutcome::failure(
            instance_key,
            format!(
                "Platform '{}' not configured. Available: [{}]",
                instance_key,
                registry.available().join(", ")
            ),
            query,
        );
    };

    let mut sql = query.trim().to_string();
    if let Some(cap) = row_cap {
        sql = safety::apply_limit(&sql, cap);
    }

    if SafetyChecker.is_read_shape(&sql) {
        match instance.backend.query(&sql, timeout).await {
            Ok(table) => QueryOutcome::Rows {
                success: true,
                platform: instance_key.to_string(),
                row_count: table.rows.len(),
                columns: table.columns,
                rows: table.rows,
                query: sql,
            },
            Err(e) => QueryOutcome::failure(instance_key, e.to_string(), &sql),
        }
    } else {
        match instance.backend.execute(&sql, timeout).await {
            Ok(rowcount) => QueryOutcome::Acknowledged {
                success: true,
                platform: instance_key.to_string(),
                message: "Query executed successfully (non-SELECT)".to_string(),
                rowcount,
                query: sql,
            },
            Err(e) => QueryOutcome::failure(instance_key, e.to_string(), &sql),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, BackendError, TableData};
    use crate::config::ParseMode;
    use crate::descriptor::ConnectionDescriptor;
    use crate::env::EnvMap;
    use crate::registry::Connector;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Records the SQL it receives and replays a canned response
    struct RecordingBackend {
        seen: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl Backend for RecordingBackend {
        async fn query(&self, sql: &str, _: Duration) -> Result<TableData, BackendError> {
            self.seen.lock().unwrap().push(sql.to_string());
            if self.fail {
                return Err(BackendError::Unsupported("relation does not exist".into()));
            }
            let mut row = serde_json::Map::new();
            row.insert("id".to_string(), serde_json::json!(1));
            Ok(TableData {
                columns: vec!["id".to_string()],
                rows: vec![row],
            })
        }

        async fn execute(&self, sql: &str, _: Duration) -> Result<Option<u64>, BackendError> {
            self.seen.lock().unwrap().push(sql.to_string());
            if self.fail {
                return Err(BackendError::Unsupported("permission denied".into()));
            }
            Ok(Some(3))
        }
    }

    struct RecordingConnector {
        seen: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl Connector for RecordingConnector {
        fn open(&self, _: &ConnectionDescriptor) -> anyhow::Result<Arc<dyn Backend>> {
            Ok(Arc::new(RecordingBackend {
                seen: self.seen.clone(),
                fail: self.fail,
            }))
        }
    }

    fn registry(fail: bool) -> (ConnectionRegistry, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let env: EnvMap = [("MYSQL_CONNECTION", "mysql://u:p@h/db")]
            .into_iter()
            .collect();
        let registry = ConnectionRegistry::build(
            &env,
            ParseMode::Permissive,
            &RecordingConnector {
                seen: seen.clone(),
                fail,
            },
        );
        (registry, seen)
    }

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_unknown_instance_lists_available() {
        let (registry, _) = registry(false);
        let outcome = run(&registry, "redshift_eu_avbu", "SELECT 1", None, TIMEOUT).await;
        let QueryOutcome::Failure { error, .. } = outcome else {
            panic!("expected failure");
        };
        assert!(error.contains("redshift_eu_avbu"));
        assert!(error.contains("mysql"));
    }

    #[tokio::test]
    async fn test_tabular_outcome() {
        let (registry, seen) = registry(false);
        let outcome = run(&registry, "mysql", "SELECT * FROM t LIMIT 5", None, TIMEOUT).await;
        let QueryOutcome::Rows {
            columns, row_count, ..
        } = outcome
        else {
            panic!("expected rows");
        };
        assert_eq!(columns, vec!["id"]);
        assert_eq!(row_count, 1);
        assert_eq!(seen.lock().unwrap().as_slice(), ["SELECT * FROM t LIMIT 5"]);
    }

    #[tokio::test]
    async fn test_row_cap_applied_once() {
        let (registry, seen) = registry(false);
        run(&registry, "mysql", "SELECT * FROM t", Some(50), TIMEOUT).await;
        assert_eq!(seen.lock().unwrap().as_slice(), ["SELECT * FROM t LIMIT 50"]);
    }

    #[tokio::test]
    async fn test_cap_composes_idempotently_with_validator_limit() {
        // Validator already injected a limit; the executor must not stack
        // a second one.
        let (registry, seen) = registry(false);
        let validated = SafetyChecker.validate("SELECT * FROM t", false, true, 100);
        run(&registry, "mysql", &validated.query, Some(100), TIMEOUT).await;
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            ["SELECT * FROM t LIMIT 100"]
        );
    }

    #[tokio::test]
    async fn test_non_read_shape_acknowledged() {
        let (registry, seen) = registry(false);
        let outcome = run(
            &registry,
            "mysql",
            "DELETE FROM t WHERE id=1",
            Some(100),
            TIMEOUT,
        )
        .await;
        let QueryOutcome::Acknowledged { rowcount, .. } = outcome else {
            panic!("expected acknowledgement");
        };
        assert_eq!(rowcount, Some(3));
        // The cap keys off the LIMIT token alone, so it also lands on DML
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            ["DELETE FROM t WHERE id=1 LIMIT 100"]
        );
    }

    #[tokio::test]
    async fn test_backend_error_becomes_failure_outcome() {
        let (registry, _) = registry(true);
        let outcome = run(&registry, "mysql", "SELECT * FROM missing", None, TIMEOUT).await;
        let QueryOutcome::Failure { error, query, .. } = outcome else {
            panic!("expected failure");
        };
        assert!(error.contains("relation does not exist"));
        assert_eq!(query, "SELECT * FROM missing");
    }
}
