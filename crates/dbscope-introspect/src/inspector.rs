use std::collections::BTreeSet;
use std::future::Future;

use futures::{StreamExt, TryStreamExt, stream};

use dbscope_core::{
    Constraint, Error, Result, Schema, Table, TableInfo, TableReference, relations_from_tables,
};

use crate::ddl;
use crate::driver::Driver;
use crate::options::InspectOptions;

/// Assembles the schema model by driving one backend.
///
/// Tables are built in a fixed order: definition, then columns, indexes,
/// constraints and triggers (fetched concurrently), then foreign-key
/// references once constraints are known.
pub struct Inspector<'a, D: ?Sized> {
    driver: &'a D,
    schema: String,
    options: InspectOptions,
}

impl<'a, D> Inspector<'a, D>
where
    D: Driver + ?Sized,
{
    pub fn new(driver: &'a D, schema: impl Into<String>) -> Self {
        Self {
            driver,
            schema: schema.into(),
            options: InspectOptions::default(),
        }
    }

    pub fn with_options(mut self, options: InspectOptions) -> Self {
        self.options = options;
        self
    }

    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    /// Tables and views matching `pattern` (substring of name or comment),
    /// each with its definition text, in catalog order.
    pub async fn tables(&self, pattern: &str) -> Result<Vec<TableInfo>> {
        let listed = self.list(pattern).await?;

        stream::iter(listed)
            .map(|info| async move {
                let name = info.name.clone();
                self.guarded(&name, self.with_definition(info)).await
            })
            .buffered(self.options.effective_concurrency())
            .try_collect()
            .await
    }

    /// Assemble one table by exact name.
    pub async fn table(&self, name: &str) -> Result<Table> {
        let listed = self.list("").await?;
        let known = table_names(&listed);
        let info = listed
            .into_iter()
            .find(|info| info.name == name)
            .ok_or_else(|| Error::table_not_found(&self.schema, name))?;

        self.guarded(name, self.assemble(info, &known)).await
    }

    /// Populate `schema` with every table, its references and the relation list.
    ///
    /// The schema is only written once every table has been assembled.
    pub async fn analyze(&self, schema: &mut Schema) -> Result<()> {
        let driver_info = self
            .bounded(format!("probing {}", self.schema), self.driver.info())
            .await?;
        tracing::info!(
            event = "analysis_started",
            schema = %self.schema,
            engine = %driver_info.engine,
            version = %driver_info.version
        );

        let listed = self.list("").await?;
        let known = table_names(&listed);

        let tables: Vec<Table> = stream::iter(listed)
            .map(|info| {
                let name = info.name.clone();
                let known = &known;
                async move { self.guarded(&name, self.assemble(info, known)).await }
            })
            .buffered(self.options.effective_concurrency())
            .try_collect()
            .await?;

        let relations = relations_from_tables(&tables);
        tracing::info!(
            event = "analysis_finished",
            schema = %self.schema,
            tables = tables.len(),
            relations = relations.len()
        );

        schema.driver = Some(driver_info);
        schema.tables = tables;
        schema.relations = relations;
        Ok(())
    }

    async fn list(&self, pattern: &str) -> Result<Vec<TableInfo>> {
        let listed = self
            .bounded(
                format!("listing {}", self.schema),
                self.driver.list_tables(&self.schema, pattern),
            )
            .await?;
        tracing::debug!(
            event = "tables_listed",
            schema = %self.schema,
            pattern = %pattern,
            count = listed.len()
        );
        Ok(listed)
    }

    async fn with_definition(&self, mut info: TableInfo) -> Result<TableInfo> {
        info.def = ddl::reconstruct(self.driver, &self.schema, &info).await?;
        Ok(info)
    }

    async fn assemble(&self, info: TableInfo, known: &BTreeSet<String>) -> Result<Table> {
        let info = self.with_definition(info).await?;
        let name = info.name.as_str();

        let (columns, indexes, constraints, triggers) = tokio::try_join!(
            self.driver.columns(&self.schema, name),
            self.driver.indexes(&self.schema, name),
            self.driver.constraints(&self.schema, name),
            self.driver.triggers(&self.schema, name),
        )?;

        let references = resolve_references(&self.schema, name, &constraints, known);

        tracing::debug!(
            event = "table_assembled",
            schema = %self.schema,
            table = %name,
            columns = columns.len(),
            indexes = indexes.len(),
            constraints = constraints.len(),
            triggers = triggers.len()
        );

        Ok(Table {
            info,
            columns,
            indexes,
            constraints,
            triggers,
            references,
        })
    }

    /// Run one table's work under the caller's cancellation token and deadline.
    async fn guarded<T>(&self, table: &str, work: impl Future<Output = Result<T>>) -> Result<T> {
        self.bounded(format!("assembling {}.{}", self.schema, table), work).await
    }

    /// Run `work` under the cancellation token and deadline, naming `scope`
    /// in the resulting error.
    async fn bounded<T>(
        &self,
        scope: String,
        work: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let bounded = async {
            match self.options.table_timeout {
                Some(limit) => tokio::time::timeout(limit, work)
                    .await
                    .map_err(|_| Error::Timeout(scope.clone()))?,
                None => work.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.options.cancellation.cancelled() => Err(Error::Cancelled(scope.clone())),
            result = bounded => result,
        }
    }
}

fn table_names(listed: &[TableInfo]) -> BTreeSet<String> {
    listed.iter().map(|info| info.name.clone()).collect()
}

/// Attach the identity of each foreign key's target table.
///
/// Targets are resolved by name only; a target missing from `known` stays
/// `None` so the caller can detect it.
fn resolve_references(
    schema: &str,
    table: &str,
    constraints: &[Constraint],
    known: &BTreeSet<String>,
) -> Vec<TableReference> {
    constraints
        .iter()
        .filter_map(|constraint| {
            let target = constraint.foreign_key.as_ref()?;
            let resolved = known.get(&target.table).cloned();
            if resolved.is_none() {
                tracing::warn!(
                    event = "foreign_key_unresolved",
                    schema = %schema,
                    table = %table,
                    constraint = %constraint.name,
                    referenced_table = %target.table
                );
            }
            Some(TableReference {
                constraint: constraint.name.clone(),
                referenced_table: target.table.clone(),
                resolved,
            })
        })
        .collect()
}
