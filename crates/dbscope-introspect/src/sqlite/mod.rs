//! SQLite backend over `sqlite_master` and the table-valued pragmas.
//!
//! SQLite has a single namespace per connection, so the schema argument is
//! only used to label errors and events; objects are always read from `main`.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tokio::sync::OnceCell;

use dbscope_core::{
    Column, Constraint, DriverInfo, Engine, Error, Index, Result, TableInfo, Trigger,
};

use crate::ddl;
use crate::driver::Driver;
use crate::mapper::{like_pattern, map_columns};

mod mapper;
mod queries;

/// Driver for SQLite databases.
#[derive(Debug)]
pub struct SqliteDriver {
    pool: SqlitePool,
    info: OnceCell<DriverInfo>,
}

impl SqliteDriver {
    pub fn new(pool: SqlitePool) -> Self {
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
impl Driver for SqliteDriver {
    fn engine(&self) -> Engine {
        Engine::Sqlite
    }

    async fn info(&self) -> Result<DriverInfo> {
        self.cached_info().await.cloned()
    }

    /// SQLite has no comments; the pattern matches names only.
    async fn list_tables(&self, _schema: &str, pattern: &str) -> Result<Vec<TableInfo>> {
        let raw = queries::list_tables(&self.pool, &like_pattern(pattern)).await?;
        Ok(mapper::map_tables(raw))
    }

    async fn columns(&self, _schema: &str, table: &str) -> Result<Vec<Column>> {
        let xinfo = self.cached_info().await?.supports_generated_columns;
        let raw = queries::list_columns(&self.pool, table, xinfo).await?;
        let create_sql = queries::object_sql(&self.pool, "table", table).await?;
        Ok(map_columns(mapper::map_columns(raw, create_sql.as_deref())))
    }

    async fn indexes(&self, _schema: &str, table: &str) -> Result<Vec<Index>> {
        let raw = queries::list_indexes(&self.pool, table).await?;
        Ok(mapper::map_indexes(raw))
    }

    async fn constraints(&self, _schema: &str, table: &str) -> Result<Vec<Constraint>> {
        let mut key_columns: Vec<_> = queries::list_columns(&self.pool, table, false)
            .await?
            .into_iter()
            .filter(|col| col.pk > 0)
            .collect();
        key_columns.sort_by_key(|col| col.pk);
        let primary_key = key_columns.into_iter().map(|col| col.name).collect();

        let foreign_keys = queries::list_foreign_keys(&self.pool, table).await?;
        let indexes = queries::list_indexes(&self.pool, table).await?;
        let create_sql = queries::object_sql(&self.pool, "table", table).await?;

        Ok(mapper::map_constraints(
            table,
            primary_key,
            foreign_keys,
            &indexes,
            create_sql.as_deref(),
        ))
    }

    async fn triggers(&self, _schema: &str, table: &str) -> Result<Vec<Trigger>> {
        let raw = queries::list_triggers(&self.pool, table).await?;
        Ok(mapper::map_triggers(raw))
    }

    async fn show_create_table(&self, _schema: &str, table: &str) -> Result<Option<String>> {
        queries::object_sql(&self.pool, "table", table).await
    }

    async fn view_body(&self, _schema: &str, view: &str) -> Result<Option<String>> {
        let statement = queries::object_sql(&self.pool, "view", view).await?;
        Ok(statement.as_deref().and_then(ddl::view_body_from_statement))
    }
}
