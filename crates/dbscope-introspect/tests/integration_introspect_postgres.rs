use std::path::Path;
use std::{env, fs, time::Duration};

use anyhow::{Context, Result, anyhow};
use dbscope_core::{ConstraintKind, FkAction, Schema, TableKind};
use dbscope_introspect::{Driver, Inspector, PostgresDriver};
use sqlx::{PgPool, postgres::PgPoolOptions};

const SCHEMA: &str = "dbscope_test";

fn database_url() -> Option<String> {
    env::var("TEST_POSTGRES_URL").ok()
}

async fn reset_fixtures(pool: &PgPool) -> Result<()> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/postgres/schema.sql");
    let script = fs::read_to_string(&path)
        .with_context(|| format!("reading fixture {}", path.display()))?;
    sqlx::raw_sql(&script)
        .execute(pool)
        .await
        .context("executing Postgres fixture")?;
    Ok(())
}

async fn connect(url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect(url)
        .await
        .context("connecting to Postgres")
}

#[tokio::test]
async fn introspects_schema_with_constraints_and_views() -> Result<()> {
    let Some(url) = database_url() else {
        eprintln!("TEST_POSTGRES_URL not set; skipping");
        return Ok(());
    };
    let pool = connect(&url).await?;
    reset_fixtures(&pool).await?;

    let driver = PostgresDriver::new(pool);
    let inspector = Inspector::new(&driver, SCHEMA);

    let tables = inspector.tables("").await?;
    let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["users", "posts", "active_users"]);

    let users = &tables[0];
    assert_eq!(users.kind, TableKind::BaseTable);
    assert_eq!(users.comment.as_deref(), Some("registered users"));
    assert!(users.def.is_empty(), "Postgres has no native table DDL");

    let view = &tables[2];
    assert_eq!(view.kind, TableKind::View);
    assert!(
        view.def.starts_with("CREATE VIEW active_users AS (SELECT id,"),
        "unexpected view definition: {}",
        view.def
    );
    assert!(view.def.ends_with(')'));

    let by_comment = inspector.tables("registered").await?;
    assert_eq!(by_comment.len(), 1);
    assert!(inspector.tables("xyz_no_such_substr").await?.is_empty());

    let posts = inspector.table("posts").await?;
    let names: Vec<&str> = posts.constraints.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["posts_pkey", "posts_title_check", "posts_user_id_fk"]);

    let fk = &posts.constraints[2];
    assert_eq!(fk.kind, ConstraintKind::ForeignKey);
    let target = fk
        .foreign_key
        .as_ref()
        .ok_or_else(|| anyhow!("foreign key target missing"))?;
    assert_eq!(target.table, "users");
    assert_eq!(target.on_delete, FkAction::Cascade);
    assert_eq!(target.on_update, FkAction::NoAction);
    assert_eq!(posts.references[0].resolved.as_deref(), Some("users"));

    let generated = posts
        .column("title_length")
        .ok_or_else(|| anyhow!("title_length missing"))?;
    let extra = generated.extra_def.as_deref().unwrap_or_default();
    assert!(extra.starts_with("GENERATED ALWAYS AS "), "{extra}");
    assert!(extra.ends_with(" STORED"), "{extra}");

    let index_names: Vec<&str> = posts.indexes.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(index_names, vec!["posts_pkey", "posts_user_id_idx"]);
    assert_eq!(posts.indexes[1].columns, vec!["user_id"]);

    assert_eq!(posts.triggers.len(), 1);
    assert_eq!(posts.triggers[0].timing, "BEFORE");
    assert_eq!(posts.triggers[0].event, "UPDATE");
    assert!(posts.triggers[0].statement.starts_with("EXECUTE FUNCTION"));

    let users = inspector.table("users").await?;
    let id = users.column("id").ok_or_else(|| anyhow!("id missing"))?;
    assert!(!id.nullable);
    assert_eq!(id.extra_def.as_deref(), Some("GENERATED ALWAYS AS IDENTITY"));

    Ok(())
}

#[tokio::test]
async fn analyze_populates_driver_info() -> Result<()> {
    let Some(url) = database_url() else {
        eprintln!("TEST_POSTGRES_URL not set; skipping");
        return Ok(());
    };
    let pool = connect(&url).await?;
    reset_fixtures(&pool).await?;

    let driver = PostgresDriver::new(pool);
    let mut schema = Schema::new(SCHEMA);
    driver.analyze(&mut schema).await?;

    let info = schema.driver.as_ref().ok_or_else(|| anyhow!("driver info missing"))?;
    assert!(info.version.major >= 10);
    assert_eq!(schema.tables.len(), 3);
    assert_eq!(schema.relations.len(), 1);
    assert_eq!(schema.relations[0].parent_table, "users");

    Ok(())
}
