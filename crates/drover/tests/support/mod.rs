//! Hand-built fakes: a recording connection and provider, plus mapping
//! sources for a flat entity set and a table-per-hierarchy set.

use drover::{
    Capability, ColumnMapping, Connection, Dialect, Entity, Error, Expr, FieldAccessor,
    HostContext, MappingCatalog, MappingSource, Provider, QueryInfo, Result, RowReader, TypeKey,
};
use drover_core::schema::source::{
    DbType, DiscriminatorCondition, EntitySetDef, FragmentDef, PropertyDef,
};

use std::any::Any;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct FakeConnection {
    pub open: bool,
    pub executed: Vec<String>,
    /// Affected-row count returned by every `execute`.
    pub affected: u64,
}

#[async_trait::async_trait]
impl Connection for FakeConnection {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn is_open(&self) -> bool {
        self.open
    }

    async fn open(&mut self) -> Result<()> {
        self.open = true;
        Ok(())
    }

    async fn execute(&mut self, sql: &str) -> Result<u64> {
        self.executed.push(sql.to_string());
        Ok(self.affected)
    }
}

/// One recorded bulk call.
#[derive(Debug, Clone)]
pub struct BulkCall {
    pub schema: String,
    pub table: String,
    pub columns: Vec<ColumnMapping>,
    pub batch_sizes: Vec<usize>,
}

/// A provider that records what the engine hands it instead of talking to a
/// database. Query builders use the bracket dialect in simplified shapes.
#[derive(Debug)]
pub struct FakeProvider {
    pub capability: Capability,
    pub inserts: Mutex<Vec<BulkCall>>,
    pub updates: Mutex<Vec<BulkCall>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::with_capability(Capability::SQL_SERVER)
    }

    pub fn with_capability(capability: Capability) -> Self {
        Self {
            capability,
            inserts: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
        }
    }

    fn drain(reader: &mut dyn RowReader, schema: &str, table: &str, max: usize) -> BulkCall {
        let mut call = BulkCall {
            schema: schema.to_string(),
            table: table.to_string(),
            columns: reader.columns().to_vec(),
            batch_sizes: Vec::new(),
        };

        loop {
            let rows = reader.read_batch(max);
            if rows.is_empty() {
                break;
            }
            call.batch_sizes.push(rows.len());
        }

        call
    }
}

#[async_trait::async_trait]
impl Provider for FakeProvider {
    fn capability(&self) -> &Capability {
        &self.capability
    }

    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
    }

    fn can_handle(&self, connection: &dyn Connection) -> bool {
        connection.as_any().is::<FakeConnection>()
    }

    fn delete_query(&self, query: &QueryInfo) -> String {
        format!(
            "DELETE FROM [{}].[{}] {}",
            query.schema, query.table, query.where_sql
        )
    }

    fn update_query(&self, predicate: &QueryInfo, modification: &QueryInfo) -> String {
        let assignment = modification
            .where_sql
            .trim_start_matches("WHERE ")
            .to_string();
        format!(
            "UPDATE [{}].[{}] SET {} {}",
            predicate.schema, predicate.table, assignment, predicate.where_sql
        )
    }

    fn query_info(&self, traced_sql: &str) -> Result<QueryInfo> {
        // The engine synthesizes `SELECT * FROM [schema].[table] AS [Extent1]`.
        let rest = traced_sql
            .strip_prefix("SELECT * FROM [")
            .ok_or_else(|| Error::unsupported(traced_sql.to_string()))?;
        let (schema, rest) = rest
            .split_once("].[")
            .ok_or_else(|| Error::unsupported(traced_sql.to_string()))?;
        let (table, _) = rest
            .split_once(']')
            .ok_or_else(|| Error::unsupported(traced_sql.to_string()))?;

        Ok(QueryInfo {
            schema: schema.to_string(),
            table: table.to_string(),
            alias: "[Extent1]".to_string(),
            where_sql: String::new(),
        })
    }

    async fn insert_items(
        &self,
        reader: &mut dyn RowReader,
        schema: &str,
        table: &str,
        connection: &mut dyn Connection,
        batch_size: Option<usize>,
    ) -> Result<()> {
        if !connection.is_open() {
            connection.open().await?;
        }

        let max = batch_size.unwrap_or_else(|| reader.remaining().max(1));
        let call = Self::drain(reader, schema, table, max);
        self.inserts.lock().unwrap().push(call);
        Ok(())
    }

    async fn update_items(
        &self,
        reader: &mut dyn RowReader,
        schema: &str,
        table: &str,
        connection: &mut dyn Connection,
        batch_size: Option<usize>,
    ) -> Result<u64> {
        if !connection.is_open() {
            connection.open().await?;
        }

        let max = batch_size.unwrap_or_else(|| reader.remaining().max(1));
        let call = Self::drain(reader, schema, table, max);
        let total = call.batch_sizes.iter().sum::<usize>() as u64;
        self.updates.lock().unwrap().push(call);
        Ok(total)
    }
}

#[derive(Debug)]
pub struct Contact {
    pub id: i32,
    pub first_name: String,
    pub age: i32,
}

impl Contact {
    pub fn named(id: i32, first_name: &str, age: i32) -> Self {
        Self {
            id,
            first_name: first_name.to_string(),
            age,
        }
    }
}

impl Entity for Contact {
    fn type_name() -> &'static str {
        "Contact"
    }

    fn accessors() -> &'static [FieldAccessor] {
        static ACCESSORS: &[FieldAccessor] = &[
            FieldAccessor {
                path: "Id",
                get: |item| item.downcast_ref::<Contact>().unwrap().id.into(),
            },
            FieldAccessor {
                path: "FirstName",
                get: |item| item.downcast_ref::<Contact>().unwrap().first_name.as_str().into(),
            },
            FieldAccessor {
                path: "Age",
                get: |item| item.downcast_ref::<Contact>().unwrap().age.into(),
            },
        ];
        ACCESSORS
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A subtype of `Contact` in a table-per-hierarchy mapping.
#[derive(Debug)]
pub struct Employee {
    pub id: i32,
    pub first_name: String,
    pub age: i32,
    pub salary: i64,
}

impl Entity for Employee {
    fn type_name() -> &'static str {
        "Employee"
    }

    fn base_types() -> Vec<TypeKey> {
        vec![TypeKey::of::<Contact>("Contact")]
    }

    fn accessors() -> &'static [FieldAccessor] {
        static ACCESSORS: &[FieldAccessor] = &[
            FieldAccessor {
                path: "Id",
                get: |item| item.downcast_ref::<Employee>().unwrap().id.into(),
            },
            FieldAccessor {
                path: "FirstName",
                get: |item| item.downcast_ref::<Employee>().unwrap().first_name.as_str().into(),
            },
            FieldAccessor {
                path: "Age",
                get: |item| item.downcast_ref::<Employee>().unwrap().age.into(),
            },
            FieldAccessor {
                path: "Salary",
                get: |item| item.downcast_ref::<Employee>().unwrap().salary.into(),
            },
        ];
        ACCESSORS
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Derives from `Contact` but carries no discriminator condition in the
/// hierarchy source.
#[derive(Debug)]
pub struct Intern {
    pub id: i32,
    pub first_name: String,
    pub age: i32,
}

impl Entity for Intern {
    fn type_name() -> &'static str {
        "Intern"
    }

    fn base_types() -> Vec<TypeKey> {
        vec![TypeKey::of::<Contact>("Contact")]
    }

    fn accessors() -> &'static [FieldAccessor] {
        static ACCESSORS: &[FieldAccessor] = &[
            FieldAccessor {
                path: "Id",
                get: |item| item.downcast_ref::<Intern>().unwrap().id.into(),
            },
            FieldAccessor {
                path: "FirstName",
                get: |item| item.downcast_ref::<Intern>().unwrap().first_name.as_str().into(),
            },
            FieldAccessor {
                path: "Age",
                get: |item| item.downcast_ref::<Intern>().unwrap().age.into(),
            },
        ];
        ACCESSORS
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A flat `Contacts` set: `Id` (key), `FirstName`, `Age`.
pub struct ContactSource;

impl MappingSource for ContactSource {
    fn entity_sets(&self) -> Vec<EntitySetDef> {
        vec![EntitySetDef {
            name: "Contacts".to_string(),
            entity: TypeKey::of::<Contact>("Contact"),
            key_properties: vec!["Id".to_string()],
            fragments: vec![FragmentDef {
                schema: "dbo".to_string(),
                table: "Contacts".to_string(),
                declared_by: TypeKey::of::<Contact>("Contact"),
                depth: 0,
                is_hierarchy: false,
                condition: None,
                properties: vec![
                    PropertyDef::scalar("Id", "Id", DbType::named("int")),
                    PropertyDef::scalar(
                        "FirstName",
                        "FirstName",
                        DbType::with_max_length("nvarchar", 50),
                    ),
                    PropertyDef::scalar("Age", "Age", DbType::named("int")),
                ],
            }],
        }]
    }
}

/// The same set mapped table-per-hierarchy: `Employee` derives from
/// `Contact` and adds `Salary`, discriminated by a `Discriminator` column.
pub struct HierarchySource;

impl MappingSource for HierarchySource {
    fn entity_sets(&self) -> Vec<EntitySetDef> {
        let contact = TypeKey::of::<Contact>("Contact");
        let employee = TypeKey::of::<Employee>("Employee");

        let shared = vec![
            PropertyDef::scalar("Id", "Id", DbType::named("int")),
            PropertyDef::scalar(
                "FirstName",
                "FirstName",
                DbType::with_max_length("nvarchar", 50),
            ),
            PropertyDef::scalar("Age", "Age", DbType::named("int")),
        ];

        let mut hierarchy = shared.clone();
        hierarchy.push(PropertyDef::scalar("Salary", "Salary", DbType::named("bigint")));

        vec![EntitySetDef {
            name: "Contacts".to_string(),
            entity: contact,
            key_properties: vec!["Id".to_string()],
            fragments: vec![
                FragmentDef {
                    schema: "dbo".to_string(),
                    table: "Contacts".to_string(),
                    declared_by: contact,
                    depth: 0,
                    is_hierarchy: true,
                    condition: None,
                    properties: hierarchy,
                },
                FragmentDef {
                    schema: "dbo".to_string(),
                    table: "Contacts".to_string(),
                    declared_by: contact,
                    depth: 0,
                    is_hierarchy: false,
                    condition: Some(DiscriminatorCondition {
                        column: "Discriminator".to_string(),
                        value: "Contact".to_string(),
                    }),
                    properties: shared,
                },
                FragmentDef {
                    schema: "dbo".to_string(),
                    table: "Contacts".to_string(),
                    declared_by: employee,
                    depth: 1,
                    is_hierarchy: false,
                    condition: Some(DiscriminatorCondition {
                        column: "Discriminator".to_string(),
                        value: "Employee".to_string(),
                    }),
                    // Condition fragments re-declare the shared key, as
                    // hierarchy mappings do.
                    properties: vec![
                        PropertyDef::scalar("Id", "Id", DbType::named("int")),
                        PropertyDef::scalar("Salary", "Salary", DbType::named("bigint")),
                    ],
                },
            ],
        }]
    }
}

/// A host context whose fallback operations just count invocations.
pub struct FakeContext<S> {
    pub connection: FakeConnection,
    pub catalog: MappingCatalog,
    pub source: S,
    pub inserted_one: usize,
    pub updated_one: usize,
    pub deleted_filtered: usize,
    pub updated_filtered: usize,
}

impl<S: MappingSource> FakeContext<S> {
    pub fn new(source: S) -> Self {
        Self {
            connection: FakeConnection::default(),
            catalog: MappingCatalog::new(),
            source,
            inserted_one: 0,
            updated_one: 0,
            deleted_filtered: 0,
            updated_filtered: 0,
        }
    }
}

#[async_trait::async_trait]
impl<S: MappingSource + 'static> HostContext for FakeContext<S> {
    fn context_key(&self) -> TypeKey {
        TypeKey::of::<Self>("FakeContext")
    }

    fn catalog(&self) -> &MappingCatalog {
        &self.catalog
    }

    fn mapping_source(&self) -> &dyn MappingSource {
        &self.source
    }

    fn connection(&mut self) -> &mut dyn Connection {
        &mut self.connection
    }

    async fn insert_one(&mut self, _item: &dyn Entity) -> Result<()> {
        self.inserted_one += 1;
        Ok(())
    }

    async fn update_one(&mut self, _item: &dyn Entity) -> Result<()> {
        self.updated_one += 1;
        Ok(())
    }

    async fn delete_filtered(&mut self, _entity: TypeKey, _predicate: &Expr) -> Result<u64> {
        self.deleted_filtered += 1;
        Ok(2)
    }

    async fn update_filtered(
        &mut self,
        _entity: TypeKey,
        _predicate: &Expr,
        _property: &str,
        _modifier: &Expr,
    ) -> Result<u64> {
        self.updated_filtered += 1;
        Ok(2)
    }
}
