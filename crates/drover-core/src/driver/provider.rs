use super::{Capability, Connection};
use crate::dialect::Dialect;
use crate::query::QueryInfo;
use crate::reader::RowReader;
use crate::Result;

use std::fmt::Debug;

/// One SQL dialect's implementation of the bulk operations.
///
/// Query builders (`delete_query`, `update_query`, `query_info`) are pure;
/// `insert_items` and `update_items` perform real I/O against the live
/// connection. Providers are selected in registration order by the first
/// `can_handle` match.
#[async_trait::async_trait]
pub trait Provider: Debug + Send + Sync {
    fn capability(&self) -> &Capability;

    /// The dialect predicates are compiled against for this provider.
    fn dialect(&self) -> Dialect;

    /// Strict type match on the live connection object.
    fn can_handle(&self, connection: &dyn Connection) -> bool;

    /// Builds `DELETE FROM <table> WHERE ...` from a parsed query.
    fn delete_query(&self, query: &QueryInfo) -> String;

    /// Builds `UPDATE <table> SET <assignment> WHERE ...`, extracting the
    /// assignment from the modification query's WHERE fragment.
    fn update_query(&self, predicate: &QueryInfo, modification: &QueryInfo) -> String;

    /// Parses schema, table, alias and WHERE clause out of a traced query,
    /// stripping the table alias prefix from column references so the clause
    /// composes with hand-built SQL.
    fn query_info(&self, traced_sql: &str) -> Result<QueryInfo>;

    /// Streams every row of `reader` into the target table through the
    /// dialect's native bulk-load mechanism, `batch_size` rows at a time.
    async fn insert_items(
        &self,
        reader: &mut dyn RowReader,
        schema: &str,
        table: &str,
        connection: &mut dyn Connection,
        batch_size: Option<usize>,
    ) -> Result<()>;

    /// Runs the merge-update protocol: create temp table, bulk-load the
    /// reader's rows into it, one set-based UPDATE joined on the primary
    /// key, drop the temp table. Returns the affected-row count of the
    /// merge statement.
    ///
    /// The reader's columns must already be filtered to the primary key plus
    /// the columns being updated, carrying full type names for the DDL.
    async fn update_items(
        &self,
        reader: &mut dyn RowReader,
        schema: &str,
        table: &str,
        connection: &mut dyn Connection,
        batch_size: Option<usize>,
    ) -> Result<u64>;
}
