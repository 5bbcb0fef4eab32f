//! Rule-based safety and well-formedness checks.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

pub const MISSING_SELECT: &str = "Query must contain SELECT statement";
pub const MISSING_FROM: &str = "Query must contain FROM clause";
pub const UNBALANCED_PARENS: &str = "Unbalanced parentheses in query";
pub const DANGEROUS_PATTERN: &str = "Potentially dangerous SQL pattern detected";
pub const MISSING_LIMIT: &str = "Consider adding LIMIT clause for large datasets";
pub const SELECT_STAR: &str = "Consider selecting specific columns instead of *";

static SELECT_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bSELECT\b").expect("valid SELECT regex"));

static FROM_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bFROM\b").expect("valid FROM regex"));

static SELECT_STAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)SELECT\s+\*").expect("valid SELECT * regex"));

/// Injection-shape detectors. Heuristic, not exhaustive.
static DANGEROUS_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("stacked DROP TABLE", r"(?i);\s*DROP\s+TABLE"),
        ("stacked DELETE FROM", r"(?i);\s*DELETE\s+FROM"),
        ("stacked UPDATE ... SET", r"(?i);\s*UPDATE\s+.*\s+SET"),
        ("UNION SELECT with trailing comment", r"(?i)UNION\s+.*\s+SELECT.*--"),
    ]
    .into_iter()
    .map(|(label, pattern)| (label, Regex::new(pattern).expect("valid danger regex")))
    .collect()
});

/// Outcome of validating one candidate statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// SQL that has passed validation.
///
/// Only [`validate_query`] builds one, so holding a `ValidatedQuery` means
/// the checks ran and found no errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedQuery {
    sql: String,
    warnings: Vec<String>,
}

impl ValidatedQuery {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn into_parts(self) -> (String, Vec<String>) {
        (self.sql, self.warnings)
    }
}

/// Run every check against `candidate_sql`.
///
/// Errors block execution; warnings never do.
pub fn validate(candidate_sql: &str) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if !SELECT_TOKEN.is_match(candidate_sql) {
        errors.push(MISSING_SELECT.to_string());
    }

    if !FROM_TOKEN.is_match(candidate_sql) {
        errors.push(MISSING_FROM.to_string());
    }

    if candidate_sql.matches('(').count() != candidate_sql.matches(')').count() {
        errors.push(UNBALANCED_PARENS.to_string());
    }

    for (label, pattern) in DANGEROUS_PATTERNS.iter() {
        if pattern.is_match(candidate_sql) {
            errors.push(format!("{} ({})", DANGEROUS_PATTERN, label));
        }
    }

    if !super::has_limit(candidate_sql) {
        warnings.push(MISSING_LIMIT.to_string());
    }

    if SELECT_STAR_PATTERN.is_match(candidate_sql) {
        warnings.push(SELECT_STAR.to_string());
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Validate and, on success, wrap the statement as a [`ValidatedQuery`].
pub fn validate_query(candidate_sql: &str) -> Result<ValidatedQuery, PipelineError> {
    let report = validate(candidate_sql);
    if report.is_valid {
        Ok(ValidatedQuery {
            sql: candidate_sql.to_string(),
            warnings: report.warnings,
        })
    } else {
        Err(PipelineError::Validation {
            errors: report.errors,
        })
    }
}
