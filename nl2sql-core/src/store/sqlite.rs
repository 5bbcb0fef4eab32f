//! SQLite-backed [`DataStore`].

use std::path::Path;
use std::sync::Mutex;

use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{DataStore, StatementResult, StoreError};
use crate::schema::{ColumnDescriptor, Row, SchemaSnapshot, TableDescriptor};

const LIST_TABLES: &str = "SELECT name FROM sqlite_master \
     WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";

/// SQLite database behind a mutex.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database file, creating parent directories as needed.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Opening SQLite database at {:?}", path);
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        debug!("Opening in-memory SQLite database");
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run a batch of statements, used for setup scripts.
    pub fn execute_batch(&self, sql: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| Ok(conn.execute_batch(sql)?))
    }

    /// Run `f` with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        f(&conn)
    }
}

impl DataStore for SqliteStore {
    fn execute(&self, sql: &str) -> Result<StatementResult, StoreError> {
        self.with_conn(|conn| {
            let mut batch = Batch::new(conn, sql);
            let mut stmt = batch.next()?.ok_or(StoreError::EmptyStatement)?;
            // Trailing whitespace and comments compile to nothing
            if !matches!(batch.next(), Ok(None)) {
                return Err(StoreError::MultipleStatements);
            }

            if stmt.column_count() == 0 {
                let changed = stmt.execute([])?;
                return Ok(StatementResult::affected(changed as u64));
            }

            let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let mut rows = stmt.query([])?;
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                let mut record = Row::new();
                for (idx, name) in names.iter().enumerate() {
                    record.insert(name.clone(), to_json(row.get_ref(idx)?));
                }
                out.push(record);
            }

            Ok(StatementResult::with_rows(out))
        })
    }

    fn inspect_schema(&self, sample_rows: usize) -> Result<SchemaSnapshot, StoreError> {
        let table_names = self.with_conn(|conn| {
            let mut stmt = conn.prepare(LIST_TABLES)?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(names)
        })?;

        let mut tables = Vec::with_capacity(table_names.len());
        for name in table_names {
            let columns = self.table_columns(&name)?;
            let samples = if sample_rows == 0 {
                Vec::new()
            } else {
                // Sample failures degrade to an empty list rather than failing the schema
                let query = format!("SELECT * FROM {} LIMIT {}", quote_identifier(&name), sample_rows);
                match self.execute(&query) {
                    Ok(result) => result.rows,
                    Err(e) => {
                        warn!(table = %name, error = %e, "Failed to read sample rows");
                        Vec::new()
                    }
                }
            };
            tables.push(TableDescriptor::new(name, columns).with_sample_rows(samples));
        }

        Ok(SchemaSnapshot::new(tables))
    }

    fn ping(&self) -> bool {
        self.with_conn(|conn| Ok(conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?))
            .is_ok()
    }
}

impl SqliteStore {
    fn table_columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_identifier(table)))?;
            let columns = stmt
                .query_map([], |row| {
                    let name: String = row.get("name")?;
                    let data_type: String = row.get("type")?;
                    let not_null: i64 = row.get("notnull")?;
                    let pk: i64 = row.get("pk")?;
                    Ok(ColumnDescriptor {
                        name,
                        data_type,
                        nullable: not_null == 0,
                        is_primary_key: pk > 0,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(columns)
        })
    }
}

/// Quote an identifier for interpolation into SQL text.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Map a SQLite value to its JSON form. BLOBs become lowercase hex.
fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(hex::encode(bytes)),
    }
}
