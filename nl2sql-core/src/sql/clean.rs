//! Cleaning raw oracle text into candidate SQL.

/// Marker opening a fenced code block.
const FENCE: &str = "```";

/// Leading label models sometimes emit before the statement.
const SQL_LABEL: &str = "sql";

/// Clean raw oracle output into a candidate SQL string.
///
/// One pass trims, unwraps a fenced block spanning more than two lines,
/// drops a leading `sql` label (any case), drops one trailing `;`, and
/// trims again. Passes repeat until the text stops changing, so cleaning an
/// already clean string is a no-op. The result is still untrusted.
pub fn clean(raw_sql: &str) -> String {
    let mut current = clean_once(raw_sql);
    loop {
        let next = clean_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_once(raw_sql: &str) -> String {
    let mut sql = raw_sql.trim().to_string();

    if sql.starts_with(FENCE) {
        let lines: Vec<&str> = sql.split('\n').collect();
        if lines.len() > 2 {
            sql = lines[1..lines.len() - 1].join("\n");
        }
    }

    if sql
        .get(..SQL_LABEL.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(SQL_LABEL))
    {
        sql = sql[SQL_LABEL.len()..].trim().to_string();
    }

    if let Some(stripped) = sql.strip_suffix(';') {
        sql = stripped.to_string();
    }

    sql.trim().to_string()
}
