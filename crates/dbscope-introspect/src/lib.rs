//! Catalog introspection for MySQL, MariaDB, PostgreSQL and SQLite.
//!
//! A [`Driver`] encodes one engine's catalog dialect. The [`Inspector`]
//! drives it to list tables, assemble individual tables and populate a whole
//! [`Schema`]; [`ddl`] fills in definition text.

pub mod connection;
pub mod ddl;
pub mod driver;
pub mod inspector;
pub mod mapper;
pub mod mysql;
pub mod options;
pub mod postgres;
pub mod sqlite;

pub use connection::{Connection, open_driver};
pub use driver::Driver;
pub use inspector::Inspector;
pub use mysql::MysqlDriver;
pub use options::{AutoIncrement, DriverOptions, InspectOptions, MysqlOptions};
pub use postgres::PostgresDriver;
pub use sqlite::SqliteDriver;

pub use dbscope_core::{DriverInfo, Engine, Error, Result, Schema, Table, TableInfo};
