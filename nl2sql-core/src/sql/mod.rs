//! Post-processing of oracle output: cleaning, validation and scoring.
//!
//! Everything here is lexical; there is no SQL grammar. The checks catch
//! common shapes of model mistakes and statement stacking, nothing more.

pub mod clean;
pub mod confidence;
pub mod validate;

use once_cell::sync::Lazy;
use regex::Regex;

pub use clean::clean;
pub use confidence::score;
pub use validate::{validate, validate_query, ValidatedQuery, ValidationReport};

static LIMIT_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bLIMIT\b").expect("valid LIMIT regex"));

static LEADING_SELECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*SELECT\b").expect("valid SELECT regex"));

/// Whether the statement carries a LIMIT token anywhere.
pub fn has_limit(sql: &str) -> bool {
    LIMIT_TOKEN.is_match(sql)
}

/// Whether the statement's leading token is SELECT.
pub fn is_select(sql: &str) -> bool {
    LEADING_SELECT.is_match(sql)
}
