use crate::Result;

use std::any::Any;
use std::fmt::Debug;

/// A live database connection, opaque to the batch engine.
///
/// Providers recognize their own connection type through `as_any` and drive
/// the native client underneath. Bulk paths open the connection if it is
/// closed; they never close it.
#[async_trait::async_trait]
pub trait Connection: Debug + Send + 'static {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn is_open(&self) -> bool;

    async fn open(&mut self) -> Result<()>;

    /// Executes a statement and returns the number of affected rows.
    async fn execute(&mut self, sql: &str) -> Result<u64>;
}
