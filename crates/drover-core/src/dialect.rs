/// The SQL dialects the predicate compiler can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Bracket identifier quoting: `[name]`.
    SqlServer,
    /// Backtick identifier quoting: `` `name` ``.
    MySql,
}

impl Dialect {
    pub fn quote_ident(self, name: &str) -> String {
        match self {
            Dialect::SqlServer => format!("[{name}]"),
            Dialect::MySql => format!("`{name}`"),
        }
    }
}
