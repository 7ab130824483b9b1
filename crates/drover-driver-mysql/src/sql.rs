use drover_core::{ColumnMapping, Error, QueryInfo, Result};
use regex::Regex;

use std::path::Path;
use std::sync::OnceLock;

fn from_clause() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"FROM `([^`]+)` AS (`[^`]+`)").expect("hard-coded regex"))
}

fn assignment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(`[^`]+`)[^=]+=(.+)").expect("hard-coded regex"))
}

/// Parses table and extent alias out of a traced query. MySQL has no schema
/// part; the connection's database scopes the table.
pub fn parse_traced_query(traced_sql: &str) -> Result<QueryInfo> {
    let captures = from_clause().captures(traced_sql).ok_or_else(|| {
        Error::unsupported(format!(
            "traced query does not target a single backtick-quoted table: {traced_sql}"
        ))
    })?;

    let alias = captures[2].to_string();
    let where_sql = match traced_sql.find("WHERE") {
        Some(index) => traced_sql[index..].replace(&format!("{alias}."), ""),
        None => String::new(),
    };

    Ok(QueryInfo {
        schema: String::new(),
        table: captures[1].to_string(),
        alias,
        where_sql,
    })
}

pub fn delete_query(query: &QueryInfo) -> String {
    format!("DELETE FROM `{}` {}", query.table, query.where_sql)
        .trim_end()
        .to_string()
}

/// Lifts the compiled `(column = expression)` equality out of the
/// modification query's WHERE fragment. The target table keeps the traced
/// alias so the statement shape matches the predicate text.
pub fn update_query(predicate: &QueryInfo, modification: &QueryInfo) -> String {
    let (column, value) = split_assignment(&modification.where_sql);

    format!(
        "UPDATE `{}` {} SET {} = {} {}",
        predicate.table, predicate.alias, column, value, predicate.where_sql
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

/// Session-scoped staging table for the merge protocol.
pub fn create_temp_table(temp_table: &str, columns: &[ColumnMapping]) -> String {
    let definitions = columns
        .iter()
        .map(|c| format!("`{}` {}", c.name_in_database, c.data_type))
        .collect::<Vec<_>>()
        .join(", ");

    let key = columns
        .iter()
        .filter(|c| c.is_primary_key)
        .map(|c| format!("`{}`", c.name_in_database))
        .collect::<Vec<_>>()
        .join(", ");

    if key.is_empty() {
        format!("CREATE TEMPORARY TABLE `{temp_table}`({definitions})")
    } else {
        format!("CREATE TEMPORARY TABLE `{temp_table}`({definitions}, PRIMARY KEY ({key}))")
    }
}

pub fn merge_update(table: &str, temp_table: &str, columns: &[ColumnMapping]) -> String {
    let filter = columns
        .iter()
        .filter(|c| c.is_primary_key)
        .map(|c| format!("ORIG.`{0}` = TEMP.`{0}`", c.name_in_database))
        .collect::<Vec<_>>()
        .join(" AND ");

    let setters = columns
        .iter()
        .filter(|c| !c.is_primary_key)
        .map(|c| format!("ORIG.`{0}` = TEMP.`{0}`", c.name_in_database))
        .collect::<Vec<_>>()
        .join(", ");

    format!("UPDATE `{table}` ORIG INNER JOIN `{temp_table}` TEMP ON {filter} SET {setters}")
}

pub fn drop_temp_table(temp_table: &str) -> String {
    format!("DROP TEMPORARY TABLE `{temp_table}`")
}

/// The LOAD statement mirrors the staged document: comma separated,
/// optionally double-quoted fields, a header line to skip.
pub fn load_statement(path: &Path, table: &str, columns: &[ColumnMapping]) -> String {
    let names = columns
        .iter()
        .map(|c| format!("`{}`", c.name_in_database))
        .collect::<Vec<_>>()
        .join(", ");

    let terminator = if cfg!(windows) { "\\r\\n" } else { "\\n" };

    format!(
        "LOAD DATA LOCAL INFILE '{}' INTO TABLE `{table}` \
         FIELDS TERMINATED BY ',' OPTIONALLY ENCLOSED BY '\"' \
         LINES TERMINATED BY '{terminator}' IGNORE 1 LINES ({names})",
        path.display()
    )
}
