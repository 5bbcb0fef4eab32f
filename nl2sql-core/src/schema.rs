//! Schema snapshots and the textual context rendered from them.
//!
//! The context string is part of the generation prompt, so rendering is a
//! pure function of the snapshot: same snapshot, same bytes. Tables and
//! columns are emitted in snapshot order and never re-sorted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One result or sample row: column name to scalar, in column order.
pub type Row = serde_json::Map<String, Value>;

/// Sample rows rendered per table in a context.
pub const CONTEXT_SAMPLE_ROWS: usize = 2;

/// Header line that opens every rendered context.
const CONTEXT_HEADER: &str = "Database Schema:";

/// Prefix of the line naming each table in a rendered context.
const TABLE_PREFIX: &str = "Table:";

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Declared type as written in the DDL
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    #[serde(rename = "primary_key")]
    pub is_primary_key: bool,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            is_primary_key: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// Table metadata with a few sample rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescriptor {
    #[serde(rename = "table_name")]
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    #[serde(rename = "sample_data", default)]
    pub sample_rows: Vec<Row>,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            name: name.into(),
            columns,
            sample_rows: Vec::new(),
        }
    }

    pub fn with_sample_rows(mut self, rows: Vec<Row>) -> Self {
        self.sample_rows = rows;
        self
    }
}

/// Point-in-time, ordered description of a database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub tables: Vec<TableDescriptor>,
}

impl SchemaSnapshot {
    pub fn new(tables: Vec<TableDescriptor>) -> Self {
        Self { tables }
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn table(&self, name: &str) -> Option<&TableDescriptor> {
        self.tables.iter().find(|t| t.name == name)
    }
}

/// Render a snapshot as prompt context, with up to two sample rows per table.
pub fn build_context(snapshot: &SchemaSnapshot) -> String {
    build_context_with_samples(snapshot, CONTEXT_SAMPLE_ROWS)
}

/// Render a snapshot as prompt context with a custom sample-row cap.
pub fn build_context_with_samples(snapshot: &SchemaSnapshot, sample_rows: usize) -> String {
    let mut context = String::new();
    context.push_str(CONTEXT_HEADER);
    context.push_str("\n\n");

    for table in &snapshot.tables {
        context.push_str(&format!("{} {}\n", TABLE_PREFIX, table.name));
        context.push_str("Columns:\n");

        for column in &table.columns {
            context.push_str(&format!("  - {} ({})", column.name, column.data_type));
            if column.is_primary_key {
                context.push_str(" [PRIMARY KEY]");
            }
            if !column.nullable {
                context.push_str(" [NOT NULL]");
            }
            context.push('\n');
        }

        if !table.sample_rows.is_empty() && sample_rows > 0 {
            context.push_str("\nSample Data:\n");
            for (i, row) in table.sample_rows.iter().take(sample_rows).enumerate() {
                context.push_str(&format!("  Row {}: {}\n", i + 1, render_row(row)));
            }
        }

        context.push('\n');
    }

    context
}

/// Table names named by the `Table:` lines of a rendered context.
///
/// Works on caller-supplied contexts too, as long as they follow the same
/// line convention.
pub fn table_names_from_context(context: &str) -> Vec<String> {
    context
        .lines()
        .filter(|line| line.starts_with(TABLE_PREFIX))
        .filter_map(|line| line.split(':').nth(1))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

// Dict-literal form, `{'id': 1, 'name': 'Ada', 'city': None}`.
// Values are not escaped; sample data is trusted.
fn render_row(row: &Row) -> String {
    let fields: Vec<String> = row
        .iter()
        .map(|(column, value)| format!("'{}': {}", column, render_value(value)))
        .collect();
    format!("{{{}}}", fields.join(", "))
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::String(s) => format!("'{}'", s),
        other => other.to_string(),
    }
}
