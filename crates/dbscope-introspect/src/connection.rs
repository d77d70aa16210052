use sqlx::{MySqlPool, PgPool, SqlitePool};

use crate::driver::Driver;
use crate::mysql::MysqlDriver;
use crate::options::DriverOptions;
use crate::postgres::PostgresDriver;
use crate::sqlite::SqliteDriver;

/// An open pool tagged with the engine family it talks to.
///
/// The caller opens and closes the pool; drivers only borrow it for queries.
#[derive(Debug, Clone)]
pub enum Connection {
    MySql(MySqlPool),
    MariaDb(MySqlPool),
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

/// Resolve the backend for `connection` once; keep the driver for the session.
pub fn open_driver(connection: Connection, options: DriverOptions) -> Box<dyn Driver> {
    match connection {
        Connection::MySql(pool) => Box::new(MysqlDriver::new(pool, options.mysql)),
        Connection::MariaDb(pool) => Box::new(MysqlDriver::mariadb(pool, options.mysql)),
        Connection::Postgres(pool) => Box::new(PostgresDriver::new(pool)),
        Connection::Sqlite(pool) => Box::new(SqliteDriver::new(pool)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbscope_core::Engine;

    #[tokio::test]
    async fn dispatches_on_connection_variant() {
        let pool = SqlitePool::connect("sqlite::memory:").await.expect("pool");
        let driver = open_driver(Connection::Sqlite(pool), DriverOptions::default());
        assert_eq!(driver.engine(), Engine::Sqlite);
    }

    #[tokio::test]
    async fn mariadb_variant_reports_mariadb_before_probing() {
        let pool = MySqlPool::connect_lazy("mysql://root@127.0.0.1:1/none").expect("lazy pool");
        let driver = open_driver(Connection::MariaDb(pool), DriverOptions::default());
        assert_eq!(driver.engine(), Engine::MariaDb);
    }
}
