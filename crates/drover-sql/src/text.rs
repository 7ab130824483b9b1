use drover_core::Dialect;

/// Drops trailing close-parentheses that have no matching opener.
///
/// Assignment fragments are extracted from the right-hand side of a
/// `SET` clause with a greedy match, which can swallow the closing
/// parenthesis of an enclosing expression.
pub fn fix_parentheses(fragment: &str) -> String {
    let mut depth = 0i32;
    let mut keep = fragment.len();
    for (idx, ch) in fragment.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    keep = idx;
                    break;
                }
            }
            _ => {}
        }
    }
    fragment[..keep].trim_end().to_string()
}

/// Temp-table names carry a timestamp suffix. Two updates against the same
/// table within one microsecond would collide; the window is accepted.
pub fn temp_table_name(table: &str) -> String {
    format!("temp_{}_{}", table, chrono::Utc::now().timestamp_micros())
}

/// Synthesizes the traced SELECT a provider parses table metadata from.
///
/// The shape mirrors what an ORM query tracer emits for an unfiltered
/// scan of one table: a star projection with a stable extent alias.
pub fn traced_select(dialect: Dialect, schema: &str, table: &str) -> String {
    let alias = dialect.quote_ident("Extent1");
    match dialect {
        Dialect::SqlServer => format!(
            "SELECT * FROM {}.{} AS {alias}",
            dialect.quote_ident(schema),
            dialect.quote_ident(table),
        ),
        // MySQL schemas are databases; the connection already selects one.
        Dialect::MySql => format!("SELECT * FROM {} AS {alias}", dialect.quote_ident(table)),
    }
}
