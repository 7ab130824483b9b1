use drover_core::{Connection, Entity, MappingCatalog, MappingSource, Result, TypeKey};
use drover_sql::Expr;

/// The boundary between the batch engine and the host ORM.
///
/// A host context supplies the mapping metadata and the live connection the
/// bulk paths run on, plus the ordinary save semantics the engine falls back
/// to when no provider can handle the connection. Fallback operations go
/// through the host's change tracker one item at a time; the bulk paths
/// never do.
#[async_trait::async_trait]
pub trait HostContext: Send {
    /// Identifies the context type; the mapping catalog caches per key.
    fn context_key(&self) -> TypeKey;

    fn catalog(&self) -> &MappingCatalog;

    fn mapping_source(&self) -> &dyn MappingSource;

    fn connection(&mut self) -> &mut dyn Connection;

    /// Saves one new item with ordinary ORM semantics.
    async fn insert_one(&mut self, item: &dyn Entity) -> Result<()>;

    /// Persists one modified item with ordinary ORM semantics.
    async fn update_one(&mut self, item: &dyn Entity) -> Result<()>;

    /// Deletes the entities of `entity`'s set matching `predicate`, one
    /// tracked item at a time. Returns the number of deleted rows.
    async fn delete_filtered(&mut self, entity: TypeKey, predicate: &Expr) -> Result<u64>;

    /// Applies `property = modifier` to the entities matching `predicate`,
    /// one tracked item at a time. Returns the number of updated rows.
    async fn update_filtered(
        &mut self,
        entity: TypeKey,
        predicate: &Expr,
        property: &str,
        modifier: &Expr,
    ) -> Result<u64>;
}
