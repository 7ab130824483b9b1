mod sql;
mod stage;

use bytes::Bytes;
use drover_core::{Capability, Connection, Dialect, Error, Provider, QueryInfo, Result, RowReader};
use futures_util::StreamExt;
use mysql_async::{prelude::Queryable, Conn, Pool};
use url::Url;

use std::any::Any;

/// A MySQL connection backed by a `mysql_async` pool.
///
/// Constructed closed; `open` checks a connection out of the pool and holds
/// it so the temp-table merge protocol stays on one session.
#[derive(Debug)]
pub struct MysqlConnection {
    pool: Pool,
    conn: Option<Conn>,
}

impl MysqlConnection {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url_str = url.into();
        let url = Url::parse(&url_str).map_err(|err| Error::configuration(err.to_string()))?;

        if url.scheme() != "mysql" {
            return Err(Error::configuration(format!(
                "connection url does not have a `mysql` scheme; url={url}"
            )));
        }

        if url.host_str().is_none() {
            return Err(Error::configuration(format!(
                "missing host in connection URL; url={url}"
            )));
        }

        if url.path().is_empty() {
            return Err(Error::configuration(format!(
                "no database specified - missing path in connection URL; url={url}"
            )));
        }

        let opts = mysql_async::Opts::from_url(url.as_ref()).map_err(Error::driver)?;
        let opts = mysql_async::OptsBuilder::from_opts(opts).client_found_rows(true);

        Ok(Self::from(Pool::new(opts)))
    }

    fn conn(&mut self) -> Result<&mut Conn> {
        self.conn
            .as_mut()
            .ok_or_else(|| Error::configuration("connection is not open"))
    }
}

impl From<Pool> for MysqlConnection {
    fn from(pool: Pool) -> Self {
        Self { pool, conn: None }
    }
}

#[async_trait::async_trait]
impl Connection for MysqlConnection {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    async fn open(&mut self) -> Result<()> {
        if self.conn.is_some() {
            return Ok(());
        }

        let conn = self.pool.get_conn().await.map_err(Error::driver)?;
        self.conn = Some(conn);
        Ok(())
    }

    async fn execute(&mut self, sql: &str) -> Result<u64> {
        let conn = self.conn()?;
        Ok(conn
            .query_iter(sql)
            .await
            .map_err(Error::driver)?
            .affected_rows())
    }
}

/// The backtick-quoting provider. Inserts stage each batch as a delimited
/// file handed to the server through `LOAD DATA LOCAL INFILE`; updates run
/// the merge protocol over a session temp table.
#[derive(Debug, Default)]
pub struct MysqlProvider;

impl MysqlProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Provider for MysqlProvider {
    fn capability(&self) -> &Capability {
        &Capability::MYSQL
    }

    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    fn can_handle(&self, connection: &dyn Connection) -> bool {
        connection.as_any().is::<MysqlConnection>()
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
        _schema: &str,
        table: &str,
        connection: &mut dyn Connection,
        batch_size: Option<usize>,
    ) -> Result<()> {
        let native = native(connection)?;
        if !native.is_open() {
            native.open().await?;
        }

        let max = batch_size.unwrap_or_else(|| reader.remaining().max(1));

        loop {
            let rows = reader.read_batch(max);
            if rows.is_empty() {
                break;
            }

            let staged = stage::write(reader.columns(), &rows)?;
            let load = sql::load_statement(staged.path(), table, reader.columns());
            let payload = Bytes::from(std::fs::read(staged.path())?);

            let conn = native.conn()?;
            conn.set_infile_handler(async move {
                Ok(futures_util::stream::once(async move { Ok(payload) }).boxed())
            });
            conn.query_drop(&load).await.map_err(Error::driver)?;
            // `staged` drops here, removing the file.
        }

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
                "bulk update of `{table}` requires a primary key column"
            )));
        }

        let temp_table = drover_sql::temp_table_name(table);
        let create = sql::create_temp_table(&temp_table, reader.columns());
        let merge = sql::merge_update(table, &temp_table, reader.columns());
        let drop = sql::drop_temp_table(&temp_table);

        if !connection.is_open() {
            connection.open().await?;
        }

        // Separate statements, no transaction wrapper. The temp table is
        // session scoped, so an aborted run leaves no durable residue.
        connection.execute(&create).await?;
        self.insert_items(reader, schema, &temp_table, connection, batch_size)
            .await?;
        let affected = connection.execute(&merge).await?;
        connection.execute(&drop).await?;

        Ok(affected)
    }
}

fn native(connection: &mut dyn Connection) -> Result<&mut MysqlConnection> {
    connection
        .as_any_mut()
        .downcast_mut::<MysqlConnection>()
        .ok_or_else(|| Error::configuration("connection is not a MySQL connection"))
}
