mod sql;
mod value;

use drover_core::{Capability, Connection, Dialect, Error, Provider, QueryInfo, Result, RowReader};
use tiberius::{Client, Config, TokenRow};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use std::any::Any;
use std::fmt;

/// A SQL Server connection driven by `tiberius` over a plain TCP stream.
///
/// The connection is constructed closed; bulk paths open it on first use and
/// never close it.
pub struct MssqlConnection {
    config: Config,
    client: Option<Client<Compat<TcpStream>>>,
}

impl MssqlConnection {
    /// Builds a closed connection from an ADO.NET-style connection string,
    /// e.g. `server=tcp:localhost,1433;user=sa;password=...;database=app`.
    pub fn new(connection_string: &str) -> Result<Self> {
        let config = Config::from_ado_string(connection_string).map_err(Error::driver)?;
        Ok(Self::from(config))
    }

    fn client(&mut self) -> Result<&mut Client<Compat<TcpStream>>> {
        self.client
            .as_mut()
            .ok_or_else(|| Error::configuration("connection is not open"))
    }
}

impl From<Config> for MssqlConnection {
    fn from(config: Config) -> Self {
        Self {
            config,
            client: None,
        }
    }
}

impl fmt::Debug for MssqlConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MssqlConnection")
            .field("addr", &self.config.get_addr())
            .field("open", &self.client.is_some())
            .finish()
    }
}

#[async_trait::async_trait]
impl Connection for MssqlConnection {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn is_open(&self) -> bool {
        self.client.is_some()
    }

    async fn open(&mut self) -> Result<()> {
        if self.client.is_some() {
            return Ok(());
        }

        let tcp = TcpStream::connect(self.config.get_addr()).await?;
        tcp.set_nodelay(true)?;

        let client = Client::connect(self.config.clone(), tcp.compat_write())
            .await
            .map_err(Error::driver)?;

        self.client = Some(client);
        Ok(())
    }

    async fn execute(&mut self, sql: &str) -> Result<u64> {
        let result = self
            .client()?
            .execute(sql, &[])
            .await
            .map_err(Error::driver)?;
        Ok(result.total())
    }
}

/// The bracket-quoting provider. Inserts stream rows through the native
/// bulk-copy channel; updates run the temp-table merge protocol.
#[derive(Debug, Default)]
pub struct MssqlProvider;

impl MssqlProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Provider for MssqlProvider {
    fn capability(&self) -> &Capability {
        &Capability::SQL_SERVER
    }

    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
    }

    fn can_handle(&self, connection: &dyn Connection) -> bool {
        connection.as_any().is::<MssqlConnection>()
    }

    fn delete_query(&self, query: &QueryInfo) -> String {
        sql::delete_query(query)
    }

    fn update_query(&self, predicate: &QueryInfo, modification: &QueryInfo) -> String {
        sql::update_query(predicate, modification)
    }

    fn query_info(&self, traced_sql: &str) -> Result<QueryInfo> {
        sql::parse_traced_query(traced_sql)
    }

    async fn insert_items(
        &self,
        reader: &mut dyn RowReader,
        schema: &str,
        table: &str,
        connection: &mut dyn Connection,
        batch_size: Option<usize>,
    ) -> Result<()> {
        // The TDS bulk channel always binds every updateable column of its
        // target, while the reader carries a subset in mapping order. Rows
        // are staged into a table shaped exactly like the reader, then cross
        // into the live table with one INSERT .. SELECT bound by name.
        let temp_table = drover_sql::temp_table_name(table);
        let create = sql::create_temp_table(schema, &temp_table, reader.columns());
        let copy = sql::insert_from(schema, table, &temp_table, reader.columns());
        let drop = sql::drop_table(schema, &temp_table);

        let native = native(connection)?;
        if !native.is_open() {
            native.open().await?;
        }

        native.execute(&create).await?;
        bulk_load(native, reader, schema, &temp_table, batch_size).await?;
        native.execute(&copy).await?;
        native.execute(&drop).await?;

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
        if !reader.columns().iter().any(|c| c.is_primary_key) {
            return Err(Error::configuration(format!(
                "bulk update of `{schema}.{table}` requires a primary key column"
            )));
        }

        let temp_table = drover_sql::temp_table_name(table);
        let create = sql::create_temp_table(schema, &temp_table, reader.columns());
        let merge = sql::merge_update(table, &temp_table, reader.columns());
        let drop = sql::drop_table(schema, &temp_table);

        let native = native(connection)?;
        if !native.is_open() {
            native.open().await?;
        }

        // Four separate statements, no transaction wrapper. A failure in the
        // middle leaves the temp table behind.
        native.execute(&create).await?;
        bulk_load(native, reader, schema, &temp_table, batch_size).await?;
        let affected = native.execute(&merge).await?;
        native.execute(&drop).await?;

        Ok(affected)
    }
}

/// Streams the reader through the bulk channel into `table`, whose columns
/// match the reader exactly.
async fn bulk_load(
    connection: &mut MssqlConnection,
    reader: &mut dyn RowReader,
    schema: &str,
    table: &str,
    batch_size: Option<usize>,
) -> Result<()> {
    let max = batch_size.unwrap_or_else(|| reader.remaining().max(1));
    let target = format!("[{schema}].[{table}]");
    let client = connection.client()?;

    loop {
        let rows = reader.read_batch(max);
        if rows.is_empty() {
            break;
        }

        let mut load = client.bulk_insert(&target).await.map_err(Error::driver)?;
        for row in rows {
            let mut token = TokenRow::new();
            for value in &row {
                token.push(value::column_data(value));
            }
            load.send(token).await.map_err(Error::driver)?;
        }
        load.finalize().await.map_err(Error::driver)?;
    }

    Ok(())
}

fn native(connection: &mut dyn Connection) -> Result<&mut MssqlConnection> {
    connection
        .as_any_mut()
        .downcast_mut::<MssqlConnection>()
        .ok_or_else(|| Error::configuration("connection is not a SQL Server connection"))
}
