//! Fixed prompt templates.
//!
//! Template wording is part of the oracle contract: generation quality
//! depends on it. Bump [`PROMPT_VERSION`] whenever the text changes.

/// Version tag of the template text below.
pub const PROMPT_VERSION: &str = "1";

/// SQL generation template, parameterised by `{schema}` and `{question}`.
pub const SQL_GENERATION_TEMPLATE: &str = "You are a SQL expert. Given the database schema and a natural language question, generate a precise SQL query.

Database Schema:
{schema}

Rules:
1. Generate ONLY the SQL query, no explanations or markdown
2. Use proper SQL syntax for the given schema
3. Include appropriate WHERE clauses, JOINs, and aggregate functions as needed
4. Use table and column names exactly as shown in the schema
5. For date queries, use appropriate date functions
6. Limit results to reasonable numbers (use LIMIT)
7. Do not include semicolon at the end

Question: {question}

SQL Query:";

/// Explanation template, parameterised by `{sql_query}` and `{question}`.
pub const EXPLANATION_TEMPLATE: &str = "Explain this SQL query in simple terms.

Original Question: {question}
SQL Query: {sql_query}

Provide a brief, clear explanation of what this query does:";

/// Stop sequences sent with every oracle call.
pub const STOP_SEQUENCES: &[&str] = &[];

/// Render the SQL generation prompt.
pub fn sql_generation_prompt(schema: &str, question: &str) -> String {
    render(
        SQL_GENERATION_TEMPLATE,
        &[("schema", schema), ("question", question)],
    )
}

/// Render the explanation prompt.
pub fn explanation_prompt(sql_query: &str, question: &str) -> String {
    render(
        EXPLANATION_TEMPLATE,
        &[("sql_query", sql_query), ("question", question)],
    )
}

/// Substitute `{name}` placeholders in a single left-to-right pass.
///
/// Substituted values are never rescanned, so braces inside a schema or a
/// question come through verbatim.
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + vars.iter().map(|(_, v)| v.len()).sum::<usize>());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let substituted = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close))
        });

        match substituted {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
