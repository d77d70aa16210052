use thiserror::Error;

/// Boxed driver error carried as the source of a failed catalog query.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Core error type shared across dbscope crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A catalog query failed. `context` names the operation and the table in flight.
    #[error("query failed while {context}: {source}")]
    Query {
        context: String,
        #[source]
        source: BoxError,
    },
    /// The requested table does not appear in the catalog listing.
    #[error("table not found: {schema}.{table}")]
    TableNotFound { schema: String, table: String },
    /// The caller cancelled the analysis.
    #[error("analysis cancelled while {0}")]
    Cancelled(String),
    /// The per-table deadline elapsed.
    #[error("analysis timed out while {0}")]
    Timeout(String),
    /// The schema violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// A requested feature is not supported by the engine.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl Error {
    /// Wrap a driver error with the operation that was in flight.
    pub fn query(source: impl Into<BoxError>, context: impl Into<String>) -> Self {
        Error::Query {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Create a not-found error for `schema.table`.
    pub fn table_not_found(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Error::TableNotFound {
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Returns true for the not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::TableNotFound { .. })
    }
}

/// Convenience alias for results returned by dbscope crates.
pub type Result<T> = std::result::Result<T, Error>;
