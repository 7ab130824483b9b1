use drover_core::{ColumnMapping, Error, QueryInfo, Result};
use regex::Regex;

use std::sync::OnceLock;

fn from_clause() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"FROM \[([^\]]+)\]\.\[([^\]]+)\] AS (\[[^\]]+\])").expect("hard-coded regex")
    })
}

fn assignment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\[[^\]]+\])[^=]+=(.+)").expect("hard-coded regex"))
}

/// Parses schema, table and extent alias back out of a traced query, then
/// captures the WHERE tail with the alias prefix stripped so the clause can
/// be substituted into hand-built statements.
pub fn parse_traced_query(traced_sql: &str) -> Result<QueryInfo> {
    let captures = from_clause().captures(traced_sql).ok_or_else(|| {
        Error::unsupported(format!(
            "traced query does not target a single bracket-quoted table: {traced_sql}"
        ))
    })?;

    let alias = captures[3].to_string();
    let where_sql = match traced_sql.find("WHERE") {
        Some(index) => traced_sql[index..].replace(&format!("{alias}."), ""),
        None => String::new(),
    };

    Ok(QueryInfo {
        schema: captures[1].to_string(),
        table: captures[2].to_string(),
        alias,
        where_sql,
    })
}

pub fn delete_query(query: &QueryInfo) -> String {
    format!(
        "DELETE FROM [{}].[{}] {}",
        query.schema, query.table, query.where_sql
    )
    .trim_end()
    .to_string()
}

/// The modification query holds a compiled `(column = expression)` equality
/// in its WHERE fragment; the assignment is lifted out of it and the
/// right-hand side repaired for the parenthesis the greedy match swallows.
pub fn update_query(predicate: &QueryInfo, modification: &QueryInfo) -> String {
    let (column, value) = split_assignment(&modification.where_sql);

    format!(
        "UPDATE [{}].[{}] SET {} = {} {}",
        predicate.schema, predicate.table, column, value, predicate.where_sql
    )
    .trim_end()
    .to_string()
}

fn split_assignment(where_sql: &str) -> (String, String) {
    match assignment().captures(where_sql) {
        Some(captures) => (
            captures[1].to_string(),
            drover_sql::fix_parentheses(captures[2].trim()),
        ),
        None => (String::new(), String::new()),
    }
}

/// Staging-table DDL shaped exactly like the reader's column list. The
/// PRIMARY KEY constraint appears only when key columns are present; insert
/// staging carries none.
pub fn create_temp_table(schema: &str, temp_table: &str, columns: &[ColumnMapping]) -> String {
    let definitions = columns
        .iter()
        .map(|c| format!("[{}] {}", c.name_in_database, c.data_type))
        .collect::<Vec<_>>()
        .join(", ");

    let key = columns
        .iter()
        .filter(|c| c.is_primary_key)
        .map(|c| format!("[{}]", c.name_in_database))
        .collect::<Vec<_>>()
        .join(", ");

    if key.is_empty() {
        format!("CREATE TABLE [{schema}].[{temp_table}]({definitions})")
    } else {
        format!("CREATE TABLE [{schema}].[{temp_table}]({definitions}, PRIMARY KEY ({key}))")
    }
}

/// Copies staged rows into the live table. Binding the column subset by
/// name keeps the statement independent of the live table's own column
/// order, identity columns and defaults.
pub fn insert_from(schema: &str, table: &str, temp_table: &str, columns: &[ColumnMapping]) -> String {
    let names = columns
        .iter()
        .map(|c| format!("[{}]", c.name_in_database))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO [{schema}].[{table}] ({names}) SELECT {names} FROM [{schema}].[{temp_table}]"
    )
}

/// The set-based half of the merge protocol: one UPDATE joining the live
/// table to the loaded temp table on every primary-key column, assigning
/// only the non-key columns.
pub fn merge_update(table: &str, temp_table: &str, columns: &[ColumnMapping]) -> String {
    let setters = columns
        .iter()
        .filter(|c| !c.is_primary_key)
        .map(|c| format!("[{0}] = TEMP.[{0}]", c.name_in_database))
        .collect::<Vec<_>>()
        .join(", ");

    let filter = columns
        .iter()
        .filter(|c| c.is_primary_key)
        .map(|c| format!("ORIG.[{0}] = TEMP.[{0}]", c.name_in_database))
        .collect::<Vec<_>>()
        .join(" AND ");

    format!(
        "UPDATE [{table}] SET {setters} FROM [{table}] ORIG INNER JOIN [{temp_table}] TEMP ON {filter}"
    )
}

pub fn drop_table(schema: &str, table: &str) -> String {
    format!("DROP TABLE [{schema}].[{table}]")
}
