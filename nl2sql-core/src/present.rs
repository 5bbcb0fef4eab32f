//! Display helpers for SQL text and result sets.
//!
//! None of these feed back into the pipeline: formatted SQL is for people,
//! the statement that gets validated and executed is always the cleaned one.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::Row;

/// Keywords that start a new line in [`format_sql`].
const LINE_KEYWORDS: &[&str] = &["SELECT", "FROM", "WHERE", "JOIN", "GROUP BY", "ORDER BY", "HAVING"];

static LINE_BREAKS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    LINE_KEYWORDS
        .iter()
        .map(|kw| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(kw));
            (*kw, Regex::new(&pattern).expect("valid keyword regex"))
        })
        .collect()
});

static TABLE_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:FROM|JOIN)\s+([a-zA-Z_][a-zA-Z0-9_]*)").expect("valid table regex")
});

/// Weighted constructs for [`estimate_complexity`], matched as substrings.
static COMPLEXITY_WEIGHTS: Lazy<Vec<(Regex, usize)>> = Lazy::new(|| {
    [
        ("JOIN", 2),
        ("SUBQUERY", 3),
        ("UNION", 2),
        ("GROUP BY", 1),
        ("ORDER BY", 1),
        ("HAVING", 2),
        ("CASE", 1),
        ("DISTINCT", 1),
    ]
    .into_iter()
    .map(|(construct, weight)| {
        let pattern = format!("(?i){}", regex::escape(construct));
        (Regex::new(&pattern).expect("valid construct regex"), weight)
    })
    .collect()
});

/// Put each major clause on its own line, keywords upper-cased.
pub fn format_sql(sql: &str) -> String {
    let mut formatted = sql.trim().to_string();
    for (keyword, pattern) in LINE_BREAKS.iter() {
        formatted = pattern
            .replace_all(&formatted, format!("\n{}", keyword).as_str())
            .into_owned();
    }

    formatted
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Stringify result values for display. NULL becomes `"NULL"`, numbers stay numbers.
pub fn format_query_results(rows: &[Row]) -> Vec<Row> {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|(column, value)| {
                    let shown = match value {
                        Value::Null => Value::String("NULL".to_string()),
                        Value::Number(_) | Value::String(_) => value.clone(),
                        other => Value::String(other.to_string()),
                    };
                    (column.clone(), shown)
                })
                .collect()
        })
        .collect()
}

/// One-line, human readable description of a result set.
pub fn result_summary(rows: &[Row], elapsed_seconds: f64) -> String {
    let Some(first) = rows.first() else {
        return format!(
            "Query executed successfully in {:.3}s but returned no results.",
            elapsed_seconds
        );
    };

    let row_count = rows.len();
    let column_count = first.len();
    format!(
        "Retrieved {} row{} with {} column{} in {:.3} seconds.",
        row_count,
        plural(row_count),
        column_count,
        plural(column_count),
        elapsed_seconds
    )
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Rough query complexity bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Complexity::Simple => "Simple",
            Complexity::Moderate => "Moderate",
            Complexity::Complex => "Complex",
        };
        f.write_str(label)
    }
}

/// Bucket a statement by a weighted count of its constructs.
///
/// Parenthesis imbalance counts three per unmatched bracket.
pub fn estimate_complexity(sql: &str) -> Complexity {
    let constructs: usize = COMPLEXITY_WEIGHTS
        .iter()
        .map(|(pattern, weight)| pattern.find_iter(sql).count() * weight)
        .sum();
    let imbalance = sql.matches('(').count().abs_diff(sql.matches(')').count());

    match constructs + imbalance * 3 {
        0..=2 => Complexity::Simple,
        3..=5 => Complexity::Moderate,
        _ => Complexity::Complex,
    }
}

/// Identifiers following FROM or JOIN, deduplicated in first-seen order.
pub fn extract_table_names(sql: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for capture in TABLE_REFERENCE.captures_iter(sql) {
        let name = &capture[1];
        if !names.iter().any(|seen| seen == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Keep only ASCII letters, digits and underscores.
pub fn sanitize_identifier(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}
