/// Pieces of a traced query, as parsed back out by a provider.
///
/// `where_sql` always carries the leading `WHERE` keyword so fragments can be
/// substituted directly into generated statements.
#[derive(Debug, Default, Clone)]
pub struct QueryInfo {
    pub schema: String,
    pub table: String,
    pub alias: String,
    pub where_sql: String,
}

/// Names the properties a bulk update intends to modify.
///
/// Primary-key columns are always carried along implicitly; they identify the
/// rows during the merge step and are never written by it.
#[derive(Debug, Default, Clone)]
pub struct UpdateSpec {
    properties: Vec<String>,
}

impl UpdateSpec {
    pub fn columns_to_update<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            properties: properties.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, property: &str) -> bool {
        self.properties.iter().any(|p| p == property)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
