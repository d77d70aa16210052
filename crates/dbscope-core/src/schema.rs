use chrono::NaiveDateTime;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constraints::{Constraint, Index, Trigger};
use crate::types::{DriverInfo, TableKind};

/// Snapshot of one analyzed schema (a database for MySQL-family engines).
///
/// The name is fixed at construction; everything else is filled in by the
/// inspector and handed to the caller as an immutable snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Schema {
    name: String,
    /// Engine identity captured during analysis.
    pub driver: Option<DriverInfo>,
    /// Tables and views in catalog order.
    pub tables: Vec<Table>,
    /// Foreign-key edges between tables of this schema.
    pub relations: Vec<Relation>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: None,
            tables: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a table by exact name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|table| table.info.name == name)
    }
}

/// Catalog-level description of a table or view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TableInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TableKind,
    pub comment: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    /// `CREATE TABLE` / `CREATE VIEW` text. Empty when the engine cannot provide it.
    pub def: String,
}

impl TableInfo {
    pub fn new(name: impl Into<String>, kind: TableKind) -> Self {
        Self {
            name: name.into(),
            kind,
            comment: None,
            created_at: None,
            def: String::new(),
        }
    }
}

/// Fully assembled table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Table {
    #[serde(flatten)]
    pub info: TableInfo,
    /// Columns in catalog ordinal order.
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
    pub constraints: Vec<Constraint>,
    pub triggers: Vec<Trigger>,
    /// One entry per foreign key, in constraint order.
    pub references: Vec<TableReference>,
}

impl Table {
    pub fn new(info: TableInfo) -> Self {
        Self {
            info,
            columns: Vec::new(),
            indexes: Vec::new(),
            constraints: Vec::new(),
            triggers: Vec::new(),
            references: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Foreign keys whose target table was not found in the scan.
    pub fn unresolved_references(&self) -> impl Iterator<Item = &TableReference> {
        self.references
            .iter()
            .filter(|reference| reference.resolved.is_none())
    }
}

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Column {
    pub name: String,
    pub ordinal_position: i64,
    /// Raw engine type string (e.g. `varchar(255)`, `character varying(255)`).
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub comment: Option<String>,
    /// Auto-increment marker or generated-column expression.
    pub extra_def: Option<String>,
}

/// Identity of a table referenced by one foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TableReference {
    /// Name of the foreign-key constraint.
    pub constraint: String,
    /// Target table name as reported by the catalog.
    pub referenced_table: String,
    /// Target table name when it exists in the same scan, `None` otherwise.
    pub resolved: Option<String>,
}

/// Foreign-key edge from a child table to its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Relation {
    pub table: String,
    pub columns: Vec<String>,
    pub parent_table: String,
    pub parent_columns: Vec<String>,
    pub constraint: String,
    pub definition: String,
}
