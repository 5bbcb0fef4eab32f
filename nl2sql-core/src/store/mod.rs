//! Data store abstraction.
//!
//! The pipeline only needs three things from a database: run one statement,
//! describe its tables, and answer a liveness probe. [`SqliteStore`] is the
//! bundled implementation; tests plug in their own.

pub mod sample;
pub mod sqlite;

use crate::schema::{Row, SchemaSnapshot};

pub use sample::{reset_sample_data, seed_sample_data};
pub use sqlite::SqliteStore;

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("You can only execute one statement at a time")]
    MultipleStatements,

    #[error("Statement is empty")]
    EmptyStatement,

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of running a single statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementResult {
    /// Materialized rows, column names as keys in select-list order
    pub rows: Vec<Row>,
    /// Number of rows returned, or rows affected for statements that return none
    pub row_count: u64,
    pub returns_rows: bool,
}

impl StatementResult {
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            row_count: rows.len() as u64,
            rows,
            returns_rows: true,
        }
    }

    pub fn affected(row_count: u64) -> Self {
        Self {
            rows: Vec::new(),
            row_count,
            returns_rows: false,
        }
    }
}

/// A database the pipeline can query.
///
/// Methods are blocking; async callers move them onto the blocking pool.
pub trait DataStore: Send + Sync {
    /// Run exactly one statement as given.
    ///
    /// Text holding more than one statement is an error; nothing runs.
    fn execute(&self, sql: &str) -> Result<StatementResult, StoreError>;

    /// Describe every user table, with up to `sample_rows` rows of data each.
    fn inspect_schema(&self, sample_rows: usize) -> Result<SchemaSnapshot, StoreError>;

    /// Liveness probe.
    fn ping(&self) -> bool;
}
