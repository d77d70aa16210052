use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use dbscope_core::{Error, Result};

const TABLES_SQL: &str = r#"
    select
      name as table_name,
      case type
        when 'table' then 'BASE TABLE'
        when 'view' then 'VIEW'
        else upper(type)
      end as table_type
    from sqlite_master
    where type in ('table', 'view')
      and name not like 'sqlite\_%' escape '\'
      and name like ?
"#;

const XINFO_COLUMNS_SQL: &str = r#"
    select cid, name, type, "notnull", dflt_value, pk, hidden
    from pragma_table_xinfo(?)
    order by cid
"#;

const COLUMNS_SQL: &str = r#"
    select cid, name, type, "notnull", dflt_value, pk, 0 as hidden
    from pragma_table_info(?)
    order by cid
"#;

const INDEX_LIST_SQL: &str = r#"
    select il.name as index_name, il."unique" as is_unique, il.origin as origin, m.sql as sql
    from pragma_index_list(?) as il
    left join sqlite_master as m on m.type = 'index' and m.name = il.name
    order by il.name
"#;

const INDEX_COLUMNS_SQL: &str = r#"
    select name from pragma_index_info(?) order by seqno
"#;

const FOREIGN_KEYS_SQL: &str = r#"
    select id, seq, "table" as referenced_table, "from" as column_name, "to" as referenced_column,
           on_update, on_delete
    from pragma_foreign_key_list(?)
    order by id, seq
"#;

const TRIGGERS_SQL: &str = r#"
    select name, sql
    from sqlite_master
    where type = 'trigger' and tbl_name = ?
    order by name
"#;

const OBJECT_SQL: &str = r#"
    select sql from sqlite_master where type = ? and name = ?
"#;

fn col<T>(row: &SqliteRow, name: &str, context: &str) -> Result<T>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name)
        .map_err(|err| Error::query(err, context.to_string()))
}

pub async fn fetch_version(pool: &SqlitePool) -> Result<String> {
    sqlx::query_scalar::<_, String>("select sqlite_version()")
        .fetch_one(pool)
        .await
        .map_err(|err| Error::query(err, "probing server version"))
}

pub struct RawTable {
    pub name: String,
    pub table_type: String,
}

pub async fn list_tables(pool: &SqlitePool, like: &str) -> Result<Vec<RawTable>> {
    let context = "listing tables of main";
    let rows = sqlx::query(TABLES_SQL)
        .bind(like)
        .fetch_all(pool)
        .await
        .map_err(|err| Error::query(err, context))?;

    rows.iter()
        .map(|row| {
            Ok(RawTable {
                name: col(row, "table_name", context)?,
                table_type: col(row, "table_type", context)?,
            })
        })
        .collect()
}

pub struct RawColumn {
    pub cid: i64,
    pub name: String,
    pub data_type: String,
    pub not_null: bool,
    pub default: Option<String>,
    pub pk: i64,
    pub hidden: i64,
}

pub async fn list_columns(pool: &SqlitePool, table: &str, xinfo: bool) -> Result<Vec<RawColumn>> {
    let context = format!("listing columns of main.{table}");
    let sql = if xinfo { XINFO_COLUMNS_SQL } else { COLUMNS_SQL };
    let rows = sqlx::query(sql)
        .bind(table)
        .fetch_all(pool)
        .await
        .map_err(|err| Error::query(err, context.clone()))?;

    rows.iter()
        .map(|row| {
            Ok(RawColumn {
                cid: col(row, "cid", &context)?,
                name: col(row, "name", &context)?,
                data_type: col(row, "type", &context)?,
                not_null: col::<i64>(row, "notnull", &context)? != 0,
                default: col(row, "dflt_value", &context)?,
                pk: col(row, "pk", &context)?,
                hidden: col(row, "hidden", &context)?,
            })
        })
        .collect()
}

pub struct RawIndex {
    pub name: String,
    pub is_unique: bool,
    pub origin: String,
    pub sql: Option<String>,
    pub columns: Vec<String>,
}

pub async fn list_indexes(pool: &SqlitePool, table: &str) -> Result<Vec<RawIndex>> {
    let context = format!("listing indexes of main.{table}");
    let rows = sqlx::query(INDEX_LIST_SQL)
        .bind(table)
        .fetch_all(pool)
        .await
        .map_err(|err| Error::query(err, context.clone()))?;

    let mut indexes = Vec::with_capacity(rows.len());
    for row in &rows {
        let name: String = col(row, "index_name", &context)?;
        let columns = sqlx::query_scalar::<_, Option<String>>(INDEX_COLUMNS_SQL)
            .bind(&name)
            .fetch_all(pool)
            .await
            .map_err(|err| Error::query(err, context.clone()))?
            .into_iter()
            .flatten()
            .collect();

        indexes.push(RawIndex {
            is_unique: col::<i64>(row, "is_unique", &context)? != 0,
            origin: col(row, "origin", &context)?,
            sql: col(row, "sql", &context)?,
            name,
            columns,
        });
    }
    Ok(indexes)
}

pub struct RawForeignKey {
    pub id: i64,
    pub referenced_table: String,
    pub column: String,
    pub referenced_column: Option<String>,
    pub on_update: String,
    pub on_delete: String,
}

pub async fn list_foreign_keys(pool: &SqlitePool, table: &str) -> Result<Vec<RawForeignKey>> {
    let context = format!("listing foreign keys of main.{table}");
    let rows = sqlx::query(FOREIGN_KEYS_SQL)
        .bind(table)
        .fetch_all(pool)
        .await
        .map_err(|err| Error::query(err, context.clone()))?;

    rows.iter()
        .map(|row| {
            Ok(RawForeignKey {
                id: col(row, "id", &context)?,
                referenced_table: col(row, "referenced_table", &context)?,
                column: col(row, "column_name", &context)?,
                referenced_column: col(row, "referenced_column", &context)?,
                on_update: col(row, "on_update", &context)?,
                on_delete: col(row, "on_delete", &context)?,
            })
        })
        .collect()
}

pub struct RawTrigger {
    pub name: String,
    pub sql: Option<String>,
}

pub async fn list_triggers(pool: &SqlitePool, table: &str) -> Result<Vec<RawTrigger>> {
    let context = format!("listing triggers of main.{table}");
    let rows = sqlx::query(TRIGGERS_SQL)
        .bind(table)
        .fetch_all(pool)
        .await
        .map_err(|err| Error::query(err, context.clone()))?;

    rows.iter()
        .map(|row| {
            Ok(RawTrigger {
                name: col(row, "name", &context)?,
                sql: col(row, "sql", &context)?,
            })
        })
        .collect()
}

/// Stored `CREATE` statement of a table or view (`kind` is `table` or `view`).
pub async fn object_sql(pool: &SqlitePool, kind: &str, name: &str) -> Result<Option<String>> {
    let context = format!("reading definition of main.{name}");
    let sql = sqlx::query_scalar::<_, Option<String>>(OBJECT_SQL)
        .bind(kind)
        .bind(name)
        .fetch_optional(pool)
        .await
        .map_err(|err| Error::query(err, context))?;
    Ok(sql.flatten())
}
