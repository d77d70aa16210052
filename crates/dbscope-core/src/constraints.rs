use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Foreign key action semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FkAction {
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
    Unknown,
}

impl FkAction {
    /// Parse a referential rule as spelled by information_schema or SQLite pragmas.
    pub fn from_rule(rule: &str) -> Self {
        match rule.trim().to_ascii_uppercase().as_str() {
            "NO ACTION" => FkAction::NoAction,
            "RESTRICT" => FkAction::Restrict,
            "CASCADE" => FkAction::Cascade,
            "SET NULL" => FkAction::SetNull,
            "SET DEFAULT" => FkAction::SetDefault,
            _ => FkAction::Unknown,
        }
    }

    /// Parse a Postgres `confupdtype` / `confdeltype` code.
    pub fn from_pg_code(code: &str) -> Self {
        match code {
            "a" => FkAction::NoAction,
            "r" => FkAction::Restrict,
            "c" => FkAction::Cascade,
            "n" => FkAction::SetNull,
            "d" => FkAction::SetDefault,
            _ => FkAction::Unknown,
        }
    }

    /// SQL spelling, `None` for unknown rules.
    pub fn as_sql(self) -> Option<&'static str> {
        match self {
            FkAction::NoAction => Some("NO ACTION"),
            FkAction::Restrict => Some("RESTRICT"),
            FkAction::Cascade => Some("CASCADE"),
            FkAction::SetNull => Some("SET NULL"),
            FkAction::SetDefault => Some("SET DEFAULT"),
            FkAction::Unknown => None,
        }
    }
}

/// Kind of table constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    PrimaryKey,
    ForeignKey,
    Unique,
    Check,
    Other(String),
}

impl ConstraintKind {
    /// Map an information_schema `constraint_type` value.
    pub fn from_catalog(value: &str) -> Self {
        match value {
            "PRIMARY KEY" => ConstraintKind::PrimaryKey,
            "FOREIGN KEY" => ConstraintKind::ForeignKey,
            "UNIQUE" => ConstraintKind::Unique,
            "CHECK" => ConstraintKind::Check,
            other => ConstraintKind::Other(other.to_string()),
        }
    }
}

/// Target of a foreign key, as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKeyTarget {
    pub table: String,
    pub columns: Vec<String>,
    pub on_update: FkAction,
    pub on_delete: FkAction,
}

/// Table-level constraint definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Constraint {
    pub name: String,
    pub kind: ConstraintKind,
    /// Engine-rendered or reconstructed definition text.
    pub definition: String,
    /// Constrained columns in key order. Empty for expression-only checks.
    pub columns: Vec<String>,
    /// Set for foreign keys only.
    pub foreign_key: Option<ForeignKeyTarget>,
}

impl Constraint {
    pub fn is_foreign_key(&self) -> bool {
        self.kind == ConstraintKind::ForeignKey
    }
}

/// Index definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    pub is_unique: bool,
    pub is_primary: bool,
    /// Access method (`BTREE`, `btree`, `HASH`, ...) when the engine reports one.
    pub method: Option<String>,
    pub definition: String,
}

/// Trigger definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Trigger {
    pub name: String,
    /// `BEFORE`, `AFTER` or `INSTEAD OF`.
    pub timing: String,
    /// `INSERT`, `UPDATE`, `DELETE`, or several joined with ` OR `.
    pub event: String,
    pub statement: String,
    pub definition: String,
}
