//! MySQL and MariaDB backend over `information_schema`.

use async_trait::async_trait;
use sqlx::MySqlPool;
use tokio::sync::OnceCell;

use dbscope_core::{
    Column, Constraint, DriverInfo, Engine, Error, Index, Result, TableInfo, Trigger,
};

use crate::ddl;
use crate::driver::Driver;
use crate::mapper::{like_pattern, map_columns, sort_constraints};
use crate::options::{AutoIncrement, MysqlOptions};

mod mapper;
mod queries;

/// Driver for MySQL-family servers. The schema name is the database name.
#[derive(Debug)]
pub struct MysqlDriver {
    pool: MySqlPool,
    engine: Engine,
    options: MysqlOptions,
    info: OnceCell<DriverInfo>,
}

impl MysqlDriver {
    /// Create a MySQL driver using a pre-configured pool.
    pub fn new(pool: MySqlPool, options: MysqlOptions) -> Self {
        Self::with_engine(pool, Engine::Mysql, options)
    }

    /// Create a MariaDB driver using a pre-configured pool.
    pub fn mariadb(pool: MySqlPool, options: MysqlOptions) -> Self {
        Self::with_engine(pool, Engine::MariaDb, options)
    }

    fn with_engine(pool: MySqlPool, engine: Engine, options: MysqlOptions) -> Self {
        Self {
            pool,
            engine,
            options,
            info: OnceCell::new(),
        }
    }

    pub fn options(&self) -> &MysqlOptions {
        &self.options
    }

    async fn cached_info(&self) -> Result<&DriverInfo> {
        self.info
            .get_or_try_init(|| async {
                let banner = queries::fetch_version(&self.pool).await?;
                let info = mapper::driver_info(self.engine, banner);
                tracing::info!(
                    event = "driver_probed",
                    engine = %info.engine,
                    version = %info.raw_version,
                    generated_columns = info.supports_generated_columns,
                    check_constraints = info.supports_check_constraints
                );
                Ok::<_, Error>(info)
            })
            .await
    }
}

#[async_trait]
impl Driver for MysqlDriver {
    fn engine(&self) -> Engine {
        self.engine
    }

    async fn info(&self) -> Result<DriverInfo> {
        self.cached_info().await.cloned()
    }

    async fn list_tables(&self, schema: &str, pattern: &str) -> Result<Vec<TableInfo>> {
        let raw = queries::list_tables(&self.pool, schema, &like_pattern(pattern)).await?;
        Ok(mapper::map_tables(raw))
    }

    async fn columns(&self, schema: &str, table: &str) -> Result<Vec<Column>> {
        let generated = self.cached_info().await?.supports_generated_columns;
        let raw = queries::list_columns(&self.pool, schema, table, generated).await?;
        Ok(map_columns(raw))
    }

    async fn indexes(&self, schema: &str, table: &str) -> Result<Vec<Index>> {
        let raw = queries::list_indexes(&self.pool, schema, table).await?;
        Ok(mapper::map_indexes(raw))
    }

    async fn constraints(&self, schema: &str, table: &str) -> Result<Vec<Constraint>> {
        let keys = queries::list_key_constraints(&self.pool, schema, table).await?;
        let mut constraints = mapper::map_key_constraints(keys);
        if self.cached_info().await?.supports_check_constraints {
            let checks = queries::list_check_constraints(&self.pool, schema, table).await?;
            constraints.extend(mapper::map_check_constraints(checks));
        }
        sort_constraints(&mut constraints);
        Ok(constraints)
    }

    async fn triggers(&self, schema: &str, table: &str) -> Result<Vec<Trigger>> {
        let raw = queries::list_triggers(&self.pool, schema, table).await?;
        Ok(mapper::map_triggers(table, raw))
    }

    async fn show_create_table(&self, schema: &str, table: &str) -> Result<Option<String>> {
        let def = queries::show_create_table(&self.pool, schema, table).await?;
        Ok(match self.options.auto_increment {
            AutoIncrement::Hide => def.map(|def| ddl::strip_auto_increment(&def)),
            AutoIncrement::Show => def,
        })
    }

    async fn view_body(&self, schema: &str, view: &str) -> Result<Option<String>> {
        queries::view_definition(&self.pool, schema, view).await
    }
}
