//! Row-capped, timed statement execution.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{PipelineError, Stage};
use crate::schema::Row;
use crate::sql::{has_limit, is_select};
use crate::store::DataStore;

/// Append `LIMIT n` to a SELECT that has no LIMIT token of its own.
///
/// Anything else is returned unchanged, apart from trailing semicolons
/// which would otherwise end the statement before the appended clause.
pub fn apply_row_limit(sql: &str, row_limit: u32) -> String {
    if is_select(sql) && !has_limit(sql) {
        let body = sql.trim_end().trim_end_matches(';').trim_end();
        format!("{} LIMIT {}", body, row_limit)
    } else {
        sql.to_string()
    }
}

/// What happened when one statement was run.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOutcome {
    /// Statement text actually sent to the store
    pub executed_sql: String,
    pub rows: Vec<Row>,
    pub row_count: u64,
    pub elapsed_seconds: f64,
    pub succeeded: bool,
    pub error: Option<String>,
    pub timed_out: bool,
}

impl ExecutionOutcome {
    fn failed(executed_sql: String, started: Instant, error: String, timed_out: bool) -> Self {
        Self {
            executed_sql,
            rows: Vec::new(),
            row_count: 0,
            elapsed_seconds: started.elapsed().as_secs_f64(),
            succeeded: false,
            error: Some(error),
            timed_out,
        }
    }

    /// The failure as a pipeline error, `None` when the statement succeeded.
    pub fn to_error(&self, timeout: Duration) -> Option<PipelineError> {
        if self.succeeded {
            return None;
        }
        if self.timed_out {
            return Some(PipelineError::Timeout {
                stage: Stage::Execution,
                after: timeout,
            });
        }
        Some(PipelineError::Execution(
            self.error.clone().unwrap_or_default(),
        ))
    }
}

/// Runs statements against a [`DataStore`] on the blocking pool.
#[derive(Clone)]
pub struct QueryExecutor {
    store: Arc<dyn DataStore>,
    timeout: Duration,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn DataStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn store(&self) -> &Arc<dyn DataStore> {
        &self.store
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `sql` with the row cap applied. Never panics, never returns `Err`.
    ///
    /// A statement that overruns the timeout is reported as failed; the
    /// blocking call itself cannot be interrupted and finishes in the
    /// background.
    pub async fn execute(&self, sql: &str, row_limit: u32) -> ExecutionOutcome {
        let started = Instant::now();

        if row_limit == 0 {
            return ExecutionOutcome::failed(
                sql.to_string(),
                started,
                "Row limit must be a positive integer".to_string(),
                false,
            );
        }

        let executed_sql = apply_row_limit(sql, row_limit);
        debug!(sql = %executed_sql, "Executing statement");

        let store = Arc::clone(&self.store);
        let statement = executed_sql.clone();
        let task = tokio::task::spawn_blocking(move || store.execute(&statement));

        match tokio::time::timeout(self.timeout, task).await {
            Err(_) => {
                warn!(after = ?self.timeout, "Statement timed out");
                ExecutionOutcome::failed(
                    executed_sql,
                    started,
                    format!("{} timed out after {:?}", Stage::Execution, self.timeout),
                    true,
                )
            }
            Ok(Err(join_error)) => {
                warn!(error = %join_error, "Execution task failed");
                ExecutionOutcome::failed(executed_sql, started, join_error.to_string(), false)
            }
            Ok(Ok(Err(store_error))) => {
                warn!(error = %store_error, "Statement failed");
                ExecutionOutcome::failed(executed_sql, started, store_error.to_string(), false)
            }
            Ok(Ok(Ok(result))) => ExecutionOutcome {
                executed_sql,
                row_count: result.row_count,
                rows: result.rows,
                elapsed_seconds: started.elapsed().as_secs_f64(),
                succeeded: true,
                error: None,
                timed_out: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::schema::SchemaSnapshot;
    use crate::store::{seed_sample_data, SqliteStore, StatementResult, StoreError};
    use std::sync::Mutex;

    /// Records statements and answers with a fixed set of rows.
    struct RecordingStore {
        seen: Mutex<Vec<String>>,
        delay: Option<Duration>,
    }

    impl RecordingStore {
        fn new() -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                delay: None,
            }
        }
    }

    impl DataStore for RecordingStore {
        fn execute(&self, sql: &str) -> Result<StatementResult, StoreError> {
            self.seen.lock().unwrap().push(sql.to_string());
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            Ok(StatementResult::with_rows(vec![Row::new(), Row::new()]))
        }

        fn inspect_schema(&self, _sample_rows: usize) -> Result<SchemaSnapshot, StoreError> {
            Ok(SchemaSnapshot::default())
        }

        fn ping(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_apply_row_limit() {
        assert_eq!(apply_row_limit("SELECT * FROM t", 10), "SELECT * FROM t LIMIT 10");
        assert_eq!(apply_row_limit("select * from t;", 5), "select * from t LIMIT 5");
        assert_eq!(apply_row_limit("SELECT * FROM t LIMIT 3", 10), "SELECT * FROM t LIMIT 3");
        assert_eq!(apply_row_limit("UPDATE t SET a = 1", 10), "UPDATE t SET a = 1");
        // Whole-token match: a column named "limits" is not a LIMIT clause
        assert_eq!(
            apply_row_limit("SELECT limits FROM t", 10),
            "SELECT limits FROM t LIMIT 10"
        );
        // Literal suffix: a trailing line comment swallows the clause
        assert_eq!(
            apply_row_limit("SELECT * FROM t -- all of them", 2),
            "SELECT * FROM t -- all of them LIMIT 2"
        );
    }

    #[tokio::test]
    async fn test_executes_capped_statement() {
        let store = Arc::new(RecordingStore::new());
        let executor = QueryExecutor::new(store.clone(), Duration::from_secs(5));

        let outcome = executor.execute("SELECT * FROM t", 2).await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.row_count, 2);
        assert_eq!(outcome.executed_sql, "SELECT * FROM t LIMIT 2");
        assert_eq!(store.seen.lock().unwrap().as_slice(), ["SELECT * FROM t LIMIT 2"]);
    }

    #[tokio::test]
    async fn test_limit_caps_real_rows() {
        let store = SqliteStore::open_in_memory().unwrap();
        seed_sample_data(&store).unwrap();
        let executor = QueryExecutor::new(Arc::new(store), Duration::from_secs(5));

        let outcome = executor.execute("SELECT * FROM customers", 2).await;
        assert!(outcome.succeeded);
        assert_eq!(outcome.row_count, 2);
        assert_eq!(outcome.rows.len(), 2);
    }

    #[tokio::test]
    async fn test_stacked_select_is_not_run_uncapped() {
        let store = SqliteStore::open_in_memory().unwrap();
        seed_sample_data(&store).unwrap();
        let executor = QueryExecutor::new(Arc::new(store), Duration::from_secs(5));

        let outcome = executor
            .execute("SELECT * FROM customers; SELECT 1 FROM orders", 2)
            .await;

        assert!(!outcome.succeeded);
        assert!(outcome.rows.is_empty());
        assert!(outcome
            .error
            .as_deref()
            .unwrap()
            .contains("one statement at a time"));
    }

    #[tokio::test]
    async fn test_trailing_write_is_not_dropped_silently() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        seed_sample_data(store.as_ref()).unwrap();
        let executor = QueryExecutor::new(store.clone(), Duration::from_secs(5));

        let outcome = executor
            .execute(
                "SELECT id FROM customers LIMIT 1; \
                 INSERT INTO customers (id, name, email, city) VALUES (99, 'X', 'x@example.com', 'Y')",
                10,
            )
            .await;
        assert!(!outcome.succeeded);

        let count = executor
            .execute("SELECT COUNT(*) AS n FROM customers", 10)
            .await;
        assert_eq!(count.rows[0]["n"], 5);
    }

    #[tokio::test]
    async fn test_scalar_select() {
        let executor = QueryExecutor::new(
            Arc::new(SqliteStore::open_in_memory().unwrap()),
            Duration::from_secs(5),
        );
        let outcome = executor.execute("SELECT 1 as test_column", 100).await;
        assert!(outcome.succeeded);
        assert_eq!(outcome.row_count, 1);
        assert_eq!(outcome.rows[0]["test_column"], 1);
    }

    #[tokio::test]
    async fn test_store_error_is_reported_not_raised() {
        let executor = QueryExecutor::new(
            Arc::new(SqliteStore::open_in_memory().unwrap()),
            Duration::from_secs(5),
        );
        let outcome = executor.execute("SELECT * FROM nowhere", 100).await;

        assert!(!outcome.succeeded);
        assert!(!outcome.timed_out);
        assert!(outcome.rows.is_empty());
        assert_eq!(outcome.row_count, 0);
        assert!(outcome.error.as_deref().unwrap().contains("nowhere"));
        assert_eq!(
            outcome.to_error(executor.timeout()).unwrap().kind(),
            ErrorKind::Execution
        );
    }

    #[tokio::test]
    async fn test_zero_limit_rejected() {
        let store = Arc::new(RecordingStore::new());
        let executor = QueryExecutor::new(store.clone(), Duration::from_secs(5));

        let outcome = executor.execute("SELECT * FROM t", 0).await;
        assert!(!outcome.succeeded);
        assert!(store.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_slow_statement_times_out() {
        let store = RecordingStore {
            seen: Mutex::new(Vec::new()),
            delay: Some(Duration::from_millis(300)),
        };
        let executor = QueryExecutor::new(Arc::new(store), Duration::from_millis(20));

        let outcome = executor.execute("SELECT * FROM t", 10).await;

        assert!(!outcome.succeeded);
        assert!(outcome.timed_out);
        assert_eq!(
            outcome.to_error(executor.timeout()).unwrap().kind(),
            ErrorKind::Timeout
        );
    }
}
