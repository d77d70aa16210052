use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Options that control how the inspector drives a backend.
#[derive(Debug, Clone)]
pub struct InspectOptions {
    /// Maximum number of tables assembled or enriched at the same time.
    pub concurrency: usize,
    /// Deadline for assembling one table, including its definition. The
    /// table listing and the server probe get the same deadline.
    pub table_timeout: Option<Duration>,
    /// Cancels the in-flight catalog query and aborts the analysis.
    pub cancellation: CancellationToken,
}

impl InspectOptions {
    pub(crate) fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            table_timeout: None,
            cancellation: CancellationToken::new(),
        }
    }
}

/// Whether `SHOW CREATE TABLE` output keeps its `AUTO_INCREMENT=<n>` table option.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AutoIncrement {
    #[default]
    Hide,
    Show,
}

/// MySQL and MariaDB backend options, fixed at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MysqlOptions {
    pub auto_increment: AutoIncrement,
}

/// Backend options applied by `open_driver`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverOptions {
    pub mysql: MysqlOptions,
}
