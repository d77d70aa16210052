//! PostgreSQL backend over `pg_catalog`.

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::OnceCell;

use dbscope_core::{
    Column, Constraint, DriverInfo, Engine, Error, Index, Result, TableInfo, Trigger,
};

use crate::driver::Driver;
use crate::mapper::{like_pattern, map_columns};

mod mapper;
mod queries;

/// Driver for PostgreSQL databases.
#[derive(Debug)]
pub struct PostgresDriver {
    pool: PgPool,
    info: OnceCell<DriverInfo>,
}

impl PostgresDriver {
    /// Create a new driver using a pre-configured pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            info: OnceCell::new(),
        }
    }

    async fn cached_info(&self) -> Result<&DriverInfo> {
        self.info
            .get_or_try_init(|| async {
                let info = mapper::driver_info(queries::fetch_version(&self.pool).await?);
                tracing::info!(
                    event = "driver_probed",
                    engine = %info.engine,
                    version = %info.version,
                    generated_columns = info.supports_generated_columns
                );
                Ok::<_, Error>(info)
            })
            .await
    }
}

#[async_trait]
impl Driver for PostgresDriver {
    fn engine(&self) -> Engine {
        Engine::Postgres
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
        let raw = queries::list_constraints(&self.pool, schema, table).await?;
        Ok(mapper::map_constraints(raw))
    }

    async fn triggers(&self, schema: &str, table: &str) -> Result<Vec<Trigger>> {
        let raw = queries::list_triggers(&self.pool, schema, table).await?;
        Ok(mapper::map_triggers(raw))
    }

    /// Postgres has no native `CREATE TABLE` output.
    async fn show_create_table(&self, _schema: &str, _table: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn view_body(&self, schema: &str, view: &str) -> Result<Option<String>> {
        queries::view_definition(&self.pool, schema, view).await
    }
}
