use chrono::NaiveDateTime;
use sqlx::mysql::{MySqlPool, MySqlRow};
use sqlx::Row;

use dbscope_core::{Error, Result};

use crate::mapper::RawColumn;

// information_schema string columns are cast to CHAR so collation and
// BLOB-typed aggregates decode as text on every server version.

const TABLES_SQL: &str = r#"
    select
      cast(table_name as char) as table_name,
      cast(table_type as char) as table_type,
      cast(table_comment as char) as table_comment,
      create_time as create_time
    from information_schema.tables
    where table_schema = ?
      and (table_name like ? or table_comment like ?)
"#;

const GENERATED_COLUMNS_SQL: &str = r#"
    select
      cast(column_name as char) as column_name,
      cast(ordinal_position as signed) as ordinal_position,
      cast(column_default as char) as column_default,
      cast(is_nullable as char) as is_nullable,
      cast(column_type as char) as column_type,
      cast(column_comment as char) as column_comment,
      cast(extra as char) as extra,
      cast(generation_expression as char) as generation_expression
    from information_schema.columns
    where table_schema = ? and table_name = ?
    order by ordinal_position
"#;

const COLUMNS_SQL: &str = r#"
    select
      cast(column_name as char) as column_name,
      cast(ordinal_position as signed) as ordinal_position,
      cast(column_default as char) as column_default,
      cast(is_nullable as char) as is_nullable,
      cast(column_type as char) as column_type,
      cast(column_comment as char) as column_comment,
      cast(extra as char) as extra,
      cast(null as char) as generation_expression
    from information_schema.columns
    where table_schema = ? and table_name = ?
    order by ordinal_position
"#;

const INDEXES_SQL: &str = r#"
    select
      cast(index_name as char) as index_name,
      cast(non_unique as signed) as non_unique,
      cast(index_type as char) as index_type,
      cast(group_concat(column_name order by seq_in_index separator ', ') as char) as column_names
    from information_schema.statistics
    where table_schema = ? and table_name = ?
    group by index_name, non_unique, index_type
    order by index_name
"#;

const KEY_CONSTRAINTS_SQL: &str = r#"
    select
      cast(kcu.constraint_name as char) as constraint_name,
      cast(tc.constraint_type as char) as constraint_type,
      cast(group_concat(kcu.column_name order by kcu.ordinal_position separator ', ') as char) as column_names,
      cast(kcu.referenced_table_name as char) as referenced_table_name,
      cast(group_concat(kcu.referenced_column_name order by kcu.ordinal_position separator ', ') as char) as referenced_column_names,
      cast(rc.update_rule as char) as update_rule,
      cast(rc.delete_rule as char) as delete_rule
    from information_schema.key_column_usage as kcu
    join information_schema.table_constraints as tc
      on tc.constraint_schema = kcu.constraint_schema
     and tc.table_name = kcu.table_name
     and tc.constraint_name = kcu.constraint_name
    left join information_schema.referential_constraints as rc
      on rc.constraint_schema = kcu.constraint_schema
     and rc.table_name = kcu.table_name
     and rc.constraint_name = kcu.constraint_name
    where kcu.table_schema = ? and kcu.table_name = ?
    group by kcu.constraint_name, tc.constraint_type, kcu.referenced_table_name, rc.update_rule, rc.delete_rule
    order by kcu.constraint_name
"#;

const CHECK_CONSTRAINTS_SQL: &str = r#"
    select
      cast(tc.constraint_name as char) as constraint_name,
      cast(cc.check_clause as char) as check_clause
    from information_schema.table_constraints as tc
    join information_schema.check_constraints as cc
      on cc.constraint_schema = tc.constraint_schema
     and cc.constraint_name = tc.constraint_name
    where tc.table_schema = ? and tc.table_name = ? and tc.constraint_type = 'CHECK'
    order by tc.constraint_name
"#;

const TRIGGERS_SQL: &str = r#"
    select
      cast(trigger_name as char) as trigger_name,
      cast(action_timing as char) as action_timing,
      cast(event_manipulation as char) as event_manipulation,
      cast(action_statement as char) as action_statement
    from information_schema.triggers
    where event_object_schema = ? and event_object_table = ?
    order by trigger_name
"#;

const VIEW_SQL: &str = r#"
    select cast(view_definition as char) as view_definition
    from information_schema.views
    where table_schema = ? and table_name = ?
"#;

fn col<T>(row: &MySqlRow, name: &str, context: &str) -> Result<T>
where
    T: for<'r> sqlx::Decode<'r, sqlx::MySql> + sqlx::Type<sqlx::MySql>,
{
    row.try_get(name)
        .map_err(|err| Error::query(err, context.to_string()))
}

pub async fn fetch_version(pool: &MySqlPool) -> Result<String> {
    sqlx::query_scalar::<_, String>("select cast(version() as char)")
        .fetch_one(pool)
        .await
        .map_err(|err| Error::query(err, "probing server version"))
}

pub struct RawTable {
    pub name: String,
    pub table_type: String,
    pub comment: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

pub async fn list_tables(pool: &MySqlPool, schema: &str, like: &str) -> Result<Vec<RawTable>> {
    let context = format!("listing tables of {schema}");
    let rows = sqlx::query(TABLES_SQL)
        .bind(schema)
        .bind(like)
        .bind(like)
        .fetch_all(pool)
        .await
        .map_err(|err| Error::query(err, context.clone()))?;

    rows.iter()
        .map(|row| {
            Ok(RawTable {
                name: col(row, "table_name", &context)?,
                table_type: col(row, "table_type", &context)?,
                comment: col(row, "table_comment", &context)?,
                created_at: col(row, "create_time", &context)?,
            })
        })
        .collect()
}

pub async fn list_columns(
    pool: &MySqlPool,
    schema: &str,
    table: &str,
    with_generation_expression: bool,
) -> Result<Vec<RawColumn>> {
    let context = format!("listing columns of {schema}.{table}");
    let sql = if with_generation_expression {
        GENERATED_COLUMNS_SQL
    } else {
        COLUMNS_SQL
    };
    let rows = sqlx::query(sql)
        .bind(schema)
        .bind(table)
        .fetch_all(pool)
        .await
        .map_err(|err| Error::query(err, context.clone()))?;

    rows.iter()
        .map(|row| {
            Ok(RawColumn {
                name: col(row, "column_name", &context)?,
                ordinal_position: col(row, "ordinal_position", &context)?,
                data_type: col(row, "column_type", &context)?,
                is_nullable: col(row, "is_nullable", &context)?,
                default: col(row, "column_default", &context)?,
                comment: col(row, "column_comment", &context)?,
                extra: col(row, "extra", &context)?,
                generation_expression: col(row, "generation_expression", &context)?,
            })
        })
        .collect()
}

pub struct RawIndex {
    pub name: String,
    pub non_unique: i64,
    pub index_type: Option<String>,
    pub columns: Option<String>,
}

pub async fn list_indexes(pool: &MySqlPool, schema: &str, table: &str) -> Result<Vec<RawIndex>> {
    let context = format!("listing indexes of {schema}.{table}");
    let rows = sqlx::query(INDEXES_SQL)
        .bind(schema)
        .bind(table)
        .fetch_all(pool)
        .await
        .map_err(|err| Error::query(err, context.clone()))?;

    rows.iter()
        .map(|row| {
            Ok(RawIndex {
                name: col(row, "index_name", &context)?,
                non_unique: col(row, "non_unique", &context)?,
                index_type: col(row, "index_type", &context)?,
                columns: col(row, "column_names", &context)?,
            })
        })
        .collect()
}

pub struct RawKeyConstraint {
    pub name: String,
    pub constraint_type: String,
    pub columns: Option<String>,
    pub referenced_table: Option<String>,
    pub referenced_columns: Option<String>,
    pub update_rule: Option<String>,
    pub delete_rule: Option<String>,
}

pub async fn list_key_constraints(
    pool: &MySqlPool,
    schema: &str,
    table: &str,
) -> Result<Vec<RawKeyConstraint>> {
    let context = format!("listing constraints of {schema}.{table}");
    let rows = sqlx::query(KEY_CONSTRAINTS_SQL)
        .bind(schema)
        .bind(table)
        .fetch_all(pool)
        .await
        .map_err(|err| Error::query(err, context.clone()))?;

    rows.iter()
        .map(|row| {
            Ok(RawKeyConstraint {
                name: col(row, "constraint_name", &context)?,
                constraint_type: col(row, "constraint_type", &context)?,
                columns: col(row, "column_names", &context)?,
                referenced_table: col(row, "referenced_table_name", &context)?,
                referenced_columns: col(row, "referenced_column_names", &context)?,
                update_rule: col(row, "update_rule", &context)?,
                delete_rule: col(row, "delete_rule", &context)?,
            })
        })
        .collect()
}

pub struct RawCheckConstraint {
    pub name: String,
    pub clause: String,
}

pub async fn list_check_constraints(
    pool: &MySqlPool,
    schema: &str,
    table: &str,
) -> Result<Vec<RawCheckConstraint>> {
    let context = format!("listing check constraints of {schema}.{table}");
    let rows = sqlx::query(CHECK_CONSTRAINTS_SQL)
        .bind(schema)
        .bind(table)
        .fetch_all(pool)
        .await
        .map_err(|err| Error::query(err, context.clone()))?;

    rows.iter()
        .map(|row| {
            Ok(RawCheckConstraint {
                name: col(row, "constraint_name", &context)?,
                clause: col(row, "check_clause", &context)?,
            })
        })
        .collect()
}

pub struct RawTrigger {
    pub name: String,
    pub timing: String,
    pub event: String,
    pub statement: String,
}

pub async fn list_triggers(pool: &MySqlPool, schema: &str, table: &str) -> Result<Vec<RawTrigger>> {
    let context = format!("listing triggers of {schema}.{table}");
    let rows = sqlx::query(TRIGGERS_SQL)
        .bind(schema)
        .bind(table)
        .fetch_all(pool)
        .await
        .map_err(|err| Error::query(err, context.clone()))?;

    rows.iter()
        .map(|row| {
            Ok(RawTrigger {
                name: col(row, "trigger_name", &context)?,
                timing: col(row, "action_timing", &context)?,
                event: col(row, "event_manipulation", &context)?,
                statement: col(row, "action_statement", &context)?,
            })
        })
        .collect()
}

pub async fn show_create_table(
    pool: &MySqlPool,
    schema: &str,
    table: &str,
) -> Result<Option<String>> {
    let context = format!("reading definition of {schema}.{table}");
    let sql = format!(
        "SHOW CREATE TABLE {}.{}",
        quote_identifier(schema),
        quote_identifier(table)
    );
    let row = sqlx::query(&sql)
        .fetch_optional(pool)
        .await
        .map_err(|err| Error::query(err, context.clone()))?;

    match row {
        Some(row) => row
            .try_get::<String, _>(1)
            .map(Some)
            .map_err(|err| Error::query(err, context)),
        None => Ok(None),
    }
}

pub async fn view_definition(pool: &MySqlPool, schema: &str, view: &str) -> Result<Option<String>> {
    let context = format!("reading view definition of {schema}.{view}");
    let row = sqlx::query(VIEW_SQL)
        .bind(schema)
        .bind(view)
        .fetch_optional(pool)
        .await
        .map_err(|err| Error::query(err, context.clone()))?;

    match row {
        Some(row) => col(&row, "view_definition", &context),
        None => Ok(None),
    }
}

/// Backtick-quote an identifier for statements that cannot take bind parameters.
pub fn quote_identifier(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}
