//! Heuristic confidence score for generated SQL.

use crate::schema::table_names_from_context;

const BASE: f64 = 0.5;
const STEP: f64 = 0.1;
const CEILING: f64 = 1.0;

/// Clause keywords that each add one step, matched case-insensitively.
const KEYWORDS: &[&str] = &["SELECT", "FROM", "WHERE", "JOIN", "GROUP BY", "ORDER BY"];

/// Score a candidate statement against the context it was generated from.
///
/// Starts at 0.5, adds 0.1 per clause keyword present and 0.1 per context
/// table named verbatim in the SQL, capped at 1.0. SELECT and FROM are
/// required for validity, so valid SQL always collects those two steps.
pub fn score(candidate_sql: &str, schema_context: &str) -> f64 {
    let upper = candidate_sql.to_uppercase();

    let keyword_hits = KEYWORDS.iter().filter(|kw| upper.contains(*kw)).count();
    let table_hits = table_names_from_context(schema_context)
        .iter()
        .filter(|table| candidate_sql.contains(table.as_str()))
        .count();

    (BASE + STEP * (keyword_hits + table_hits) as f64).min(CEILING)
}
