use std::fmt;

use schemars::JsonSchema;
use schemars::r#gen::SchemaGenerator;
use serde::{Deserialize, Serialize};

/// Kind of table-like object as reported by the catalog.
///
/// Only `BASE TABLE` and `VIEW` have reconstruction rules; anything else is
/// kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TableKind {
    BaseTable,
    View,
    Other(String),
}

impl TableKind {
    /// Map a catalog `table_type` value to a kind. Unknown values pass through.
    pub fn from_catalog(value: &str) -> Self {
        match value {
            "BASE TABLE" => TableKind::BaseTable,
            "VIEW" => TableKind::View,
            other => TableKind::Other(other.to_string()),
        }
    }

    /// The catalog spelling of this kind.
    pub fn as_catalog_str(&self) -> &str {
        match self {
            TableKind::BaseTable => "BASE TABLE",
            TableKind::View => "VIEW",
            TableKind::Other(value) => value,
        }
    }
}

impl From<String> for TableKind {
    fn from(value: String) -> Self {
        TableKind::from_catalog(&value)
    }
}

impl From<TableKind> for String {
    fn from(value: TableKind) -> Self {
        value.as_catalog_str().to_string()
    }
}

impl JsonSchema for TableKind {
    fn schema_name() -> String {
        "TableKind".to_string()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> schemars::schema::Schema {
        String::json_schema(generator)
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_catalog_str())
    }
}

/// Database engine family behind a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Engine {
    Mysql,
    MariaDb,
    Postgres,
    Sqlite,
}

impl Engine {
    /// Engine identifier (e.g. `postgres`).
    pub fn name(self) -> &'static str {
        match self {
            Engine::Mysql => "mysql",
            Engine::MariaDb => "mariadb",
            Engine::Postgres => "postgres",
            Engine::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Numeric server version used for capability checks.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ServerVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse the first dotted number found in a version banner.
    ///
    /// Accepts `8.0.36`, `10.6.12-MariaDB-1:10.6.12+maria~ubu2004`,
    /// `PostgreSQL 15.4 on x86_64` and `3.45.1`. Missing parts default to 0.
    pub fn parse(banner: &str) -> Option<Self> {
        let start = banner.find(|ch: char| ch.is_ascii_digit())?;
        let mut parts = banner[start..]
            .split(|ch: char| !ch.is_ascii_digit() && ch != '.')
            .next()
            .unwrap_or("")
            .split('.')
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<u32>().ok());

        let major = parts.next().flatten()?;
        let minor = parts.next().flatten().unwrap_or(0);
        let patch = parts.next().flatten().unwrap_or(0);
        Some(Self::new(major, minor, patch))
    }

    /// Convert a Postgres `server_version_num` (e.g. `150004`).
    pub fn from_postgres_num(num: i32) -> Self {
        let num = num.max(0) as u32;
        if num >= 100_000 {
            Self::new(num / 10_000, 0, num % 10_000)
        } else {
            Self::new(num / 10_000, (num / 100) % 100, num % 100)
        }
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Engine identity and the capabilities derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DriverInfo {
    pub engine: Engine,
    pub version: ServerVersion,
    /// Version banner exactly as the server reported it.
    pub raw_version: String,
    /// Whether generation expressions can be read from the catalog.
    pub supports_generated_columns: bool,
    /// Whether `CHECK` constraints are exposed by the catalog.
    pub supports_check_constraints: bool,
}
