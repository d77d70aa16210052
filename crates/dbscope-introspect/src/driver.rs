use async_trait::async_trait;

use dbscope_core::{Column, Constraint, DriverInfo, Engine, Index, Result, Schema, TableInfo, Trigger};

use crate::inspector::Inspector;

/// Catalog dialect of one engine family.
///
/// Implementations issue the engine-specific catalog queries and map rows to
/// the shared model. Every method is a read-only query; failures are returned
/// wrapped with the operation and table that were in flight.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Engine family this driver was created for.
    fn engine(&self) -> Engine;

    /// Engine identity and capabilities. Probed once and cached.
    async fn info(&self) -> Result<DriverInfo>;

    /// Tables and views whose name or comment contains `pattern`, in catalog order.
    /// `def` is left empty.
    async fn list_tables(&self, schema: &str, pattern: &str) -> Result<Vec<TableInfo>>;

    /// Columns ordered by ordinal position.
    async fn columns(&self, schema: &str, table: &str) -> Result<Vec<Column>>;

    async fn indexes(&self, schema: &str, table: &str) -> Result<Vec<Index>>;

    async fn constraints(&self, schema: &str, table: &str) -> Result<Vec<Constraint>>;

    async fn triggers(&self, schema: &str, table: &str) -> Result<Vec<Trigger>>;

    /// Native `CREATE TABLE` text, `None` when the engine has no such facility
    /// or returned no row.
    async fn show_create_table(&self, schema: &str, table: &str) -> Result<Option<String>>;

    /// Raw view body (the query after `AS`), `None` when no definition row exists.
    async fn view_body(&self, schema: &str, view: &str) -> Result<Option<String>>;

    /// Populate `schema` (only its name needs to be set) with default options.
    ///
    /// On error the schema is left untouched.
    async fn analyze(&self, schema: &mut Schema) -> Result<()> {
        let name = schema.name().to_string();
        Inspector::new(self, name).analyze(schema).await
    }
}
