use crate::config::BatchConfig;
use crate::context::HostContext;

use drover_core::{
    ColumnMapping, Connection, ContextMapping, Entity, Error, Provider, RecordReader, Result,
    TableMapping, TypeKey, TypeMapping, UpdateSpec,
};
use drover_sql::{combine, compile, traced_select, Expr};

use std::marker::PhantomData;
use std::sync::Arc;

/// Per-call knobs for the bulk paths.
#[derive(Debug, Default, Clone)]
pub struct BatchOptions {
    /// Rows per bulk-load batch. Defaults to the provider's preference.
    pub batch_size: Option<usize>,
}

/// A bulk operation scoped to one entity set of a host context.
///
/// `T` is the set's root entity type. Item-bearing operations accept any
/// entity type and resolve its mapping through the declared base-type chain,
/// so subtype items flow through a supertype-scoped operation.
pub struct BatchOperation<'a, C: HostContext, T: Entity> {
    context: &'a mut C,
    config: &'a BatchConfig,
    connection_override: Option<&'a mut dyn Connection>,
    _entity: PhantomData<fn() -> T>,
}

impl<'a, C: HostContext, T: Entity> BatchOperation<'a, C, T> {
    pub fn for_set(context: &'a mut C, config: &'a BatchConfig) -> Self {
        Self {
            context,
            config,
            connection_override: None,
            _entity: PhantomData,
        }
    }

    /// Targets a different connection than the context's own, e.g. to bulk
    /// load into a staging database.
    pub fn with_connection(mut self, connection: &'a mut dyn Connection) -> Self {
        self.connection_override = Some(connection);
        self
    }

    pub async fn insert_all<E: Entity>(&mut self, items: &[E]) -> Result<()> {
        self.insert_all_with(items, BatchOptions::default()).await
    }

    /// Streams `items` into their mapped table through the provider's native
    /// bulk-load channel, bypassing change tracking entirely.
    ///
    /// Primary-key columns are left out so the database assigns fresh keys.
    /// For table-per-hierarchy sets the discriminator column is written as a
    /// constant per the item type's mapping.
    pub async fn insert_all_with<E: Entity>(
        &mut self,
        items: &[E],
        options: BatchOptions,
    ) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        let mapping = self.context_mapping()?;
        let type_mapping = resolve_type_mapping::<E>(&mapping)?;
        let table = type_mapping.table();
        let columns = insert_columns::<E>(table)?;
        let schema = table.schema.clone();
        let table_name = table.table.clone();

        match self.resolve_provider() {
            Some(provider) if provider.capability().insert => {
                let batch_size = options
                    .batch_size
                    .or(provider.capability().default_insert_batch_size);
                let mut reader = RecordReader::new(items, columns)?;

                tracing::debug!(
                    entity = E::key().name(),
                    rows = items.len(),
                    table = %table_name,
                    "bulk insert"
                );

                provider
                    .insert_items(
                        &mut reader,
                        &schema,
                        &table_name,
                        self.live_connection(),
                        batch_size,
                    )
                    .await
            }
            _ => {
                self.require_fallback("insert")?;
                for item in items {
                    self.context.insert_one(item).await?;
                }
                Ok(())
            }
        }
    }

    pub async fn update_all<E: Entity>(&mut self, items: &[E], spec: &UpdateSpec) -> Result<u64> {
        self.update_all_with(items, spec, BatchOptions::default())
            .await
    }

    /// Updates the named properties of every item through the provider's
    /// temp-table merge protocol: the primary key plus the properties in
    /// `spec` are bulk-loaded into a staging table, merged into the live
    /// table with one set-based UPDATE, and the staging table dropped.
    pub async fn update_all_with<E: Entity>(
        &mut self,
        items: &[E],
        spec: &UpdateSpec,
        options: BatchOptions,
    ) -> Result<u64> {
        if items.is_empty() {
            return Ok(0);
        }
        if spec.is_empty() {
            return Err(Error::configuration(
                "bulk update requires at least one property to update",
            ));
        }

        let mapping = self.context_mapping()?;
        let type_mapping = resolve_type_mapping::<E>(&mapping)?;
        let table = type_mapping.table();
        let columns = update_columns::<E>(table, spec);
        let schema = table.schema.clone();
        let table_name = table.table.clone();

        match self.resolve_provider() {
            Some(provider) if provider.capability().bulk_update => {
                let mut reader = RecordReader::new(items, columns)?;

                tracing::debug!(
                    entity = E::key().name(),
                    rows = items.len(),
                    table = %table_name,
                    "bulk update"
                );

                provider
                    .update_items(
                        &mut reader,
                        &schema,
                        &table_name,
                        self.live_connection(),
                        options.batch_size,
                    )
                    .await
            }
            _ => {
                self.require_fallback("update")?;
                for item in items {
                    self.context.update_one(item).await?;
                }
                Ok(items.len() as u64)
            }
        }
    }

    /// Narrows the operation to the rows matching `predicate`. Filtered
    /// operations expose only set-based delete and update.
    pub fn filter(self, predicate: Expr) -> FilteredBatchOperation<'a, C, T> {
        FilteredBatchOperation {
            operation: self,
            predicate,
        }
    }

    fn target_table<E: Entity>(&self) -> Result<(String, String)> {
        let mapping = self.context_mapping()?;
        let type_mapping = resolve_type_mapping::<E>(&mapping)?;
        let table = type_mapping.table();
        Ok((table.schema.clone(), table.table.clone()))
    }

    fn context_mapping(&self) -> Result<Arc<ContextMapping>> {
        self.context
            .catalog()
            .mapping_for(self.context.context_key(), self.context.mapping_source())
    }

    fn resolve_provider(&mut self) -> Option<Arc<dyn Provider>> {
        let connection: &dyn Connection = match &self.connection_override {
            Some(connection) => &**connection,
            None => self.context.connection(),
        };
        self.config.provider_for(connection)
    }

    fn live_connection(&mut self) -> &mut dyn Connection {
        match &mut self.connection_override {
            Some(connection) => &mut **connection,
            None => self.context.connection(),
        }
    }

    fn require_fallback(&self, operation: &str) -> Result<()> {
        if self.config.disable_fallback {
            return Err(Error::configuration(format!(
                "no registered provider can bulk {operation} on this connection and fallback is disabled"
            )));
        }

        tracing::warn!(operation, "no capable provider, falling back to per-item saves");
        Ok(())
    }
}

/// A batch operation narrowed by a predicate.
pub struct FilteredBatchOperation<'a, C: HostContext, T: Entity> {
    operation: BatchOperation<'a, C, T>,
    predicate: Expr,
}

impl<C: HostContext, T: Entity> FilteredBatchOperation<'_, C, T> {
    /// Deletes the matching rows with one set-based statement. Returns the
    /// affected-row count.
    ///
    /// The predicate is compiled before anything executes, so an unsupported
    /// expression aborts with no partial mutation.
    pub async fn delete(mut self) -> Result<u64> {
        let (schema, table) = self.operation.target_table::<T>()?;

        match self.operation.resolve_provider() {
            Some(provider) if provider.capability().delete => {
                let dialect = provider.dialect();
                let predicate_sql = compile(&self.predicate, dialect)?;

                let mut info = provider.query_info(&traced_select(dialect, &schema, &table))?;
                info.where_sql = format!("WHERE {predicate_sql}");

                let delete = provider.delete_query(&info);
                tracing::debug!(sql = %delete, "bulk delete");

                let connection = self.operation.live_connection();
                if !connection.is_open() {
                    connection.open().await?;
                }
                connection.execute(&delete).await
            }
            _ => {
                self.operation.require_fallback("delete")?;
                self.operation
                    .context
                    .delete_filtered(T::key(), &self.predicate)
                    .await
            }
        }
    }

    /// Sets `property` to `modifier` on the matching rows with one set-based
    /// statement. The modifier may reference other properties of the row.
    pub async fn update(mut self, property: &str, modifier: Expr) -> Result<u64> {
        let (schema, table) = self.operation.target_table::<T>()?;

        match self.operation.resolve_provider() {
            Some(provider) if provider.capability().update => {
                let dialect = provider.dialect();
                let predicate_sql = compile(&self.predicate, dialect)?;
                let modification_sql =
                    compile(&combine(Expr::field(property), modifier.clone()), dialect)?;

                let mut predicate_info =
                    provider.query_info(&traced_select(dialect, &schema, &table))?;
                predicate_info.where_sql = format!("WHERE {predicate_sql}");

                let mut modification_info = predicate_info.clone();
                modification_info.where_sql = format!("WHERE {modification_sql}");

                let update = provider.update_query(&predicate_info, &modification_info);
                tracing::debug!(sql = %update, "bulk update where");

                let connection = self.operation.live_connection();
                if !connection.is_open() {
                    connection.open().await?;
                }
                connection.execute(&update).await
            }
            _ => {
                self.operation.require_fallback("update")?;
                self.operation
                    .context
                    .update_filtered(T::key(), &self.predicate, property, &modifier)
                    .await
            }
        }
    }
}

/// Looks up the type mapping for `E`, walking the declared base-type chain
/// so subtypes resolve to their hierarchy root's table.
fn resolve_type_mapping<E: Entity>(mapping: &ContextMapping) -> Result<&TypeMapping> {
    if let Ok(found) = mapping.type_mapping(E::key()) {
        return Ok(found);
    }

    for base in E::base_types() {
        if let Ok(found) = mapping.type_mapping(base) {
            return Ok(found);
        }
    }

    Err(Error::configuration(format!(
        "no mapping registered for entity `{}` or any of its base types",
        E::key().name()
    )))
}

fn owner_chain<E: Entity>() -> Vec<TypeKey> {
    let mut owners = vec![E::key()];
    owners.extend(E::base_types());
    owners
}

/// The column set for a fresh insert: every property declared by `E` or a
/// base type, keys excluded, plus the discriminator constant when the table
/// is shared by a hierarchy. A hierarchy table with no discriminator literal
/// for `E` cannot take its rows at all.
fn insert_columns<E: Entity>(table: &TableMapping) -> Result<Vec<ColumnMapping>> {
    let owners = owner_chain::<E>();

    let mut columns: Vec<ColumnMapping> = table
        .property_mappings
        .iter()
        .filter(|p| owners.contains(&p.owner) && !p.is_primary_key)
        .map(|p| ColumnMapping {
            name_in_database: p.column_name.clone(),
            name_on_object: p.property_path.clone(),
            data_type: p.db_type.full(),
            is_primary_key: false,
            static_value: None,
        })
        .collect();

    if let Some(tph) = &table.tph {
        let discriminator = tph.discriminator_for(E::key()).ok_or_else(|| {
            Error::configuration(format!(
                "hierarchy table `{}` maps no discriminator value for entity `{}`",
                table.table,
                E::key().name()
            ))
        })?;

        columns.push(ColumnMapping {
            name_in_database: tph.column_name.clone(),
            name_on_object: String::new(),
            data_type: "nvarchar(max)".to_string(),
            is_primary_key: false,
            static_value: Some(discriminator.to_string()),
        });
    }

    Ok(columns)
}

/// The column set for a merge update: the primary key plus the properties
/// named by the spec, with full type names for the staging-table DDL.
///
/// Key columns are taken regardless of which type the dedup pass credited
/// them to. A hierarchy shares one key, so a subtype re-declaring it must
/// not hide it from supertype updates.
fn update_columns<E: Entity>(table: &TableMapping, spec: &UpdateSpec) -> Vec<ColumnMapping> {
    let owners = owner_chain::<E>();

    table
        .property_mappings
        .iter()
        .filter(|p| p.is_primary_key || (owners.contains(&p.owner) && spec.contains(&p.property_path)))
        .map(|p| ColumnMapping {
            name_in_database: p.column_name.clone(),
            name_on_object: p.property_path.clone(),
            data_type: p.db_type.full(),
            is_primary_key: p.is_primary_key,
            static_value: None,
        })
        .collect()
}
