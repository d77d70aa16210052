use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use dbscope_core::{Error, Result};

use crate::mapper::RawColumn;

// Catalog names and "char" codes are cast to text so they decode as String.

const TABLES_SQL: &str = r#"
    select
      c.relname::text as table_name,
      case c.relkind
        when 'r' then 'BASE TABLE'
        when 'p' then 'BASE TABLE'
        when 'v' then 'VIEW'
        when 'm' then 'MATERIALIZED VIEW'
        when 'f' then 'FOREIGN TABLE'
        else c.relkind::text
      end as table_type,
      pg_catalog.obj_description(c.oid, 'pg_class') as table_comment
    from pg_class c
    join pg_namespace n on n.oid = c.relnamespace
    where n.nspname = $1
      and c.relkind in ('r', 'p', 'v', 'm', 'f')
      and (
        c.relname like $2
        or coalesce(pg_catalog.obj_description(c.oid, 'pg_class'), '') like $2
      )
    order by c.oid
"#;

const GENERATED_COLUMNS_SQL: &str = r#"
    select
      a.attname::text as column_name,
      a.attnum::int8 as ordinal_position,
      pg_catalog.format_type(a.atttypid, a.atttypmod) as column_type,
      case when a.attnotnull then 'NO' else 'YES' end as is_nullable,
      case when a.attgenerated = '' then pg_get_expr(ad.adbin, ad.adrelid) end as column_default,
      pg_catalog.col_description(a.attrelid, a.attnum) as column_comment,
      case
        when a.attgenerated = 's' then 'STORED GENERATED'
        when a.attidentity = 'a' then 'GENERATED ALWAYS AS IDENTITY'
        when a.attidentity = 'd' then 'GENERATED BY DEFAULT AS IDENTITY'
      end as extra,
      case when a.attgenerated <> '' then pg_get_expr(ad.adbin, ad.adrelid) end as generation_expression
    from pg_attribute a
    join pg_class c on c.oid = a.attrelid
    join pg_namespace n on n.oid = c.relnamespace
    left join pg_attrdef ad on ad.adrelid = a.attrelid and ad.adnum = a.attnum
    where n.nspname = $1
      and c.relname = $2
      and a.attnum > 0
      and not a.attisdropped
    order by a.attnum
"#;

const COLUMNS_SQL: &str = r#"
    select
      a.attname::text as column_name,
      a.attnum::int8 as ordinal_position,
      pg_catalog.format_type(a.atttypid, a.atttypmod) as column_type,
      case when a.attnotnull then 'NO' else 'YES' end as is_nullable,
      pg_get_expr(ad.adbin, ad.adrelid) as column_default,
      pg_catalog.col_description(a.attrelid, a.attnum) as column_comment,
      null::text as extra,
      null::text as generation_expression
    from pg_attribute a
    join pg_class c on c.oid = a.attrelid
    join pg_namespace n on n.oid = c.relnamespace
    left join pg_attrdef ad on ad.adrelid = a.attrelid and ad.adnum = a.attnum
    where n.nspname = $1
      and c.relname = $2
      and a.attnum > 0
      and not a.attisdropped
    order by a.attnum
"#;

const INDEXES_SQL: &str = r#"
    select
      idx.relname::text as index_name,
      i.indisunique as is_unique,
      i.indisprimary as is_primary,
      am.amname::text as method,
      pg_get_indexdef(i.indexrelid) as definition,
      array(
        select a.attname::text
        from unnest(i.indkey::int2[]) with ordinality as k(attnum, ord)
        join pg_attribute a on a.attrelid = i.indrelid and a.attnum = k.attnum
        order by k.ord
      ) as column_names
    from pg_index i
    join pg_class tbl on tbl.oid = i.indrelid
    join pg_namespace nsp on nsp.oid = tbl.relnamespace
    join pg_class idx on idx.oid = i.indexrelid
    join pg_am am on am.oid = idx.relam
    where nsp.nspname = $1
      and tbl.relname = $2
    order by idx.relname
"#;

const CONSTRAINTS_SQL: &str = r#"
    select
      con.conname::text as constraint_name,
      con.contype::text as constraint_type,
      pg_get_constraintdef(con.oid) as definition,
      array(
        select a.attname::text
        from unnest(con.conkey) with ordinality as k(attnum, ord)
        join pg_attribute a on a.attrelid = con.conrelid and a.attnum = k.attnum
        order by k.ord
      ) as column_names,
      ref.relname::text as referenced_table,
      array(
        select a.attname::text
        from unnest(con.confkey) with ordinality as k(attnum, ord)
        join pg_attribute a on a.attrelid = con.confrelid and a.attnum = k.attnum
        order by k.ord
      ) as referenced_columns,
      con.confupdtype::text as update_code,
      con.confdeltype::text as delete_code
    from pg_constraint con
    join pg_class c on c.oid = con.conrelid
    join pg_namespace n on n.oid = c.relnamespace
    left join pg_class ref on ref.oid = con.confrelid
    where n.nspname = $1
      and c.relname = $2
      and con.contype in ('p', 'f', 'u', 'c', 'x')
    order by con.conname
"#;

const TRIGGERS_SQL: &str = r#"
    select
      t.tgname::text as trigger_name,
      pg_get_triggerdef(t.oid) as definition
    from pg_trigger t
    join pg_class c on c.oid = t.tgrelid
    join pg_namespace n on n.oid = c.relnamespace
    where n.nspname = $1
      and c.relname = $2
      and not t.tgisinternal
    order by t.tgname
"#;

const VIEW_SQL: &str = r#"
    select pg_get_viewdef(c.oid, true) as view_definition
    from pg_class c
    join pg_namespace n on n.oid = c.relnamespace
    where n.nspname = $1
      and c.relname = $2
      and c.relkind in ('v', 'm')
"#;

fn col<T>(row: &PgRow, name: &str, context: &str) -> Result<T>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|err| Error::query(err, context.to_string()))
}

pub struct RawVersion {
    pub number: i32,
    pub banner: String,
}

pub async fn fetch_version(pool: &PgPool) -> Result<RawVersion> {
    let context = "probing server version";
    let row = sqlx::query(
        "select current_setting('server_version_num')::int4 as version_num, version() as banner",
    )
    .fetch_one(pool)
    .await
    .map_err(|err| Error::query(err, context))?;

    Ok(RawVersion {
        number: col(&row, "version_num", context)?,
        banner: col(&row, "banner", context)?,
    })
}

pub struct RawTable {
    pub name: String,
    pub table_type: String,
    pub comment: Option<String>,
}

pub async fn list_tables(pool: &PgPool, schema: &str, like: &str) -> Result<Vec<RawTable>> {
    let context = format!("listing tables of {schema}");
    let rows = sqlx::query(TABLES_SQL)
        .bind(schema)
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
            })
        })
        .collect()
}

pub async fn list_columns(
    pool: &PgPool,
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
    pub is_unique: bool,
    pub is_primary: bool,
    pub method: String,
    pub definition: String,
    pub columns: Vec<String>,
}

pub async fn list_indexes(pool: &PgPool, schema: &str, table: &str) -> Result<Vec<RawIndex>> {
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
                is_unique: col(row, "is_unique", &context)?,
                is_primary: col(row, "is_primary", &context)?,
                method: col(row, "method", &context)?,
                definition: col(row, "definition", &context)?,
                columns: col(row, "column_names", &context)?,
            })
        })
        .collect()
}

pub struct RawConstraint {
    pub name: String,
    pub type_code: String,
    pub definition: String,
    pub columns: Vec<String>,
    pub referenced_table: Option<String>,
    pub referenced_columns: Vec<String>,
    pub update_code: String,
    pub delete_code: String,
}

pub async fn list_constraints(
    pool: &PgPool,
    schema: &str,
    table: &str,
) -> Result<Vec<RawConstraint>> {
    let context = format!("listing constraints of {schema}.{table}");
    let rows = sqlx::query(CONSTRAINTS_SQL)
        .bind(schema)
        .bind(table)
        .fetch_all(pool)
        .await
        .map_err(|err| Error::query(err, context.clone()))?;

    rows.iter()
        .map(|row| {
            Ok(RawConstraint {
                name: col(row, "constraint_name", &context)?,
                type_code: col(row, "constraint_type", &context)?,
                definition: col(row, "definition", &context)?,
                columns: col(row, "column_names", &context)?,
                referenced_table: col(row, "referenced_table", &context)?,
                referenced_columns: col(row, "referenced_columns", &context)?,
                update_code: col(row, "update_code", &context)?,
                delete_code: col(row, "delete_code", &context)?,
            })
        })
        .collect()
}

pub struct RawTrigger {
    pub name: String,
    pub definition: String,
}

pub async fn list_triggers(pool: &PgPool, schema: &str, table: &str) -> Result<Vec<RawTrigger>> {
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
                definition: col(row, "definition", &context)?,
            })
        })
        .collect()
}

pub async fn view_definition(pool: &PgPool, schema: &str, view: &str) -> Result<Option<String>> {
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
