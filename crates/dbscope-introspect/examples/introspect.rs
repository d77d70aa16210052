use std::time::Duration;

use anyhow::{Context, Result, bail};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::EnvFilter;

use dbscope_introspect::{Connection, DriverOptions, InspectOptions, Inspector, Schema, open_driver};

async fn connect(url: &str) -> Result<(Connection, String)> {
    let default_schema = |fallback: &str| {
        std::env::var("DBSCOPE_SCHEMA").unwrap_or_else(|_| fallback.to_string())
    };

    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await
            .context("failed to connect to Postgres")?;
        Ok((Connection::Postgres(pool), default_schema("public")))
    } else if url.starts_with("mysql://") || url.starts_with("mariadb://") {
        let url = url.replacen("mariadb://", "mysql://", 1);
        let pool = MySqlPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&url)
            .await
            .context("failed to connect to MySQL")?;
        let database: String = sqlx::query_scalar("select cast(database() as char)")
            .fetch_one(&pool)
            .await
            .context("reading current database")?;
        Ok((Connection::MySql(pool), default_schema(&database)))
    } else if url.starts_with("sqlite:") {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .context("failed to open SQLite database")?;
        Ok((Connection::Sqlite(pool), default_schema("main")))
    } else {
        bail!("unsupported DATABASE_URL scheme: {url}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let db_url = std::env::var("DATABASE_URL").context("set DATABASE_URL")?;
    let (connection, schema_name) = connect(&db_url).await?;

    let driver = open_driver(connection, DriverOptions::default());
    let options = InspectOptions {
        table_timeout: Some(Duration::from_secs(30)),
        ..InspectOptions::default()
    };

    let mut schema = Schema::new(schema_name.as_str());
    Inspector::new(driver.as_ref(), schema_name)
        .with_options(options)
        .analyze(&mut schema)
        .await?;

    println!("{}", serde_json::to_string_pretty(&schema)?);

    Ok(())
}
