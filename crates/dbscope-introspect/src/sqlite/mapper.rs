use std::sync::LazyLock;

use regex::Regex;

use dbscope_core::{
    Constraint, ConstraintKind, DriverInfo, Engine, FkAction, ForeignKeyTarget, Index,
    ServerVersion, TableInfo, TableKind, Trigger,
};

use crate::ddl;
use crate::mapper::{self as shared, check_definition, foreign_key_definition, sort_constraints};

use super::queries::{RawColumn, RawForeignKey, RawIndex, RawTable, RawTrigger};

const TABLE_XINFO: ServerVersion = ServerVersion::new(3, 31, 0);

static AUTOINCREMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bAUTOINCREMENT\b").expect("valid regex"));

pub fn driver_info(banner: String) -> DriverInfo {
    let version = ServerVersion::parse(&banner).unwrap_or_default();
    DriverInfo {
        engine: Engine::Sqlite,
        version,
        raw_version: banner,
        supports_generated_columns: version >= TABLE_XINFO,
        supports_check_constraints: true,
    }
}

pub fn map_tables(raw: Vec<RawTable>) -> Vec<TableInfo> {
    raw.into_iter()
        .map(|table| TableInfo::new(table.name, TableKind::from_catalog(&table.table_type)))
        .collect()
}

/// Map pragma rows, recovering generation expressions and `AUTOINCREMENT` from the table DDL.
///
/// Hidden columns of virtual tables are skipped.
pub fn map_columns(raw: Vec<RawColumn>, create_sql: Option<&str>) -> Vec<shared::RawColumn> {
    let create_sql = create_sql.unwrap_or_default();
    let pk_columns = raw.iter().filter(|col| col.pk > 0).count();
    let autoincrement = AUTOINCREMENT.is_match(create_sql);

    raw.into_iter()
        .filter(|col| col.hidden != 1)
        .map(|col| {
            let (extra, generation_expression) = match col.hidden {
                2 => (
                    Some("VIRTUAL GENERATED".to_string()),
                    ddl::generated_expression(create_sql, &col.name),
                ),
                3 => (
                    Some("STORED GENERATED".to_string()),
                    ddl::generated_expression(create_sql, &col.name),
                ),
                _ if col.pk > 0 && pk_columns == 1 && autoincrement => {
                    (Some("AUTOINCREMENT".to_string()), None)
                }
                _ => (None, None),
            };

            shared::RawColumn {
                ordinal_position: col.cid + 1,
                is_nullable: Some(if col.not_null { "NO" } else { "YES" }.to_string()),
                name: col.name,
                data_type: col.data_type,
                default: col.default,
                comment: None,
                extra,
                generation_expression,
            }
        })
        .collect()
}

pub fn map_indexes(raw: Vec<RawIndex>) -> Vec<Index> {
    raw.into_iter()
        .map(|idx| {
            let is_primary = idx.origin == "pk";
            let definition = match idx.sql {
                Some(sql) => sql,
                None if is_primary => format!("PRIMARY KEY ({})", idx.columns.join(", ")),
                None => format!("UNIQUE ({})", idx.columns.join(", ")),
            };
            Index {
                name: idx.name,
                columns: idx.columns,
                is_unique: idx.is_unique,
                is_primary,
                method: None,
                definition,
            }
        })
        .collect()
}

/// Build the constraint list from pragma rows and the stored DDL.
///
/// SQLite keeps no constraint names except for `CHECK`: the primary key is
/// `PRIMARY`, foreign keys are `<table>_<columns>_fk`, unique constraints take
/// their auto-index name and unnamed checks are `<table>_check_<n>`.
pub fn map_constraints(
    table: &str,
    primary_key: Vec<String>,
    foreign_keys: Vec<RawForeignKey>,
    indexes: &[RawIndex],
    create_sql: Option<&str>,
) -> Vec<Constraint> {
    let mut constraints = Vec::new();

    if !primary_key.is_empty() {
        constraints.push(Constraint {
            name: "PRIMARY".to_string(),
            kind: ConstraintKind::PrimaryKey,
            definition: format!("PRIMARY KEY ({})", primary_key.join(", ")),
            columns: primary_key,
            foreign_key: None,
        });
    }

    constraints.extend(group_foreign_keys(foreign_keys).into_iter().map(|fk| {
        let name = format!("{table}_{}_fk", fk.columns.join("_"));
        let target = ForeignKeyTarget {
            table: fk.referenced_table,
            columns: fk.referenced_columns,
            on_update: FkAction::from_rule(&fk.on_update),
            on_delete: FkAction::from_rule(&fk.on_delete),
        };
        Constraint {
            definition: foreign_key_definition(
                &fk.columns,
                &target.table,
                &target.columns,
                target.on_update,
                target.on_delete,
            ),
            name,
            kind: ConstraintKind::ForeignKey,
            columns: fk.columns,
            foreign_key: Some(target),
        }
    }));

    constraints.extend(
        indexes
            .iter()
            .filter(|idx| idx.origin == "u")
            .map(|idx| Constraint {
                name: idx.name.clone(),
                kind: ConstraintKind::Unique,
                definition: format!("UNIQUE ({})", idx.columns.join(", ")),
                columns: idx.columns.clone(),
                foreign_key: None,
            }),
    );

    let checks = create_sql.map(ddl::check_clauses).unwrap_or_default();
    constraints.extend(
        checks
            .into_iter()
            .enumerate()
            .map(|(position, (name, expression))| Constraint {
                name: name.unwrap_or_else(|| format!("{table}_check_{}", position + 1)),
                kind: ConstraintKind::Check,
                definition: check_definition(&expression),
                columns: Vec::new(),
                foreign_key: None,
            }),
    );

    sort_constraints(&mut constraints);
    constraints
}

struct ForeignKeyGroup {
    columns: Vec<String>,
    referenced_table: String,
    referenced_columns: Vec<String>,
    on_update: String,
    on_delete: String,
}

/// Fold per-column pragma rows (ordered by id, seq) into one entry per key.
fn group_foreign_keys(rows: Vec<RawForeignKey>) -> Vec<ForeignKeyGroup> {
    let mut groups: Vec<(i64, ForeignKeyGroup)> = Vec::new();
    for row in rows {
        match groups.last_mut() {
            Some((id, group)) if *id == row.id => {
                group.columns.push(row.column);
                group.referenced_columns.extend(row.referenced_column);
            }
            _ => groups.push((
                row.id,
                ForeignKeyGroup {
                    columns: vec![row.column],
                    referenced_table: row.referenced_table,
                    referenced_columns: row.referenced_column.into_iter().collect(),
                    on_update: row.on_update,
                    on_delete: row.on_delete,
                },
            )),
        }
    }
    groups.into_iter().map(|(_, group)| group).collect()
}

pub fn map_triggers(raw: Vec<RawTrigger>) -> Vec<Trigger> {
    raw.into_iter()
        .map(|trg| {
            let definition = trg.sql.unwrap_or_default();
            let (timing, event) = ddl::trigger_header(&definition).unwrap_or_default();
            Trigger {
                statement: ddl::trigger_statement(&definition),
                name: trg.name,
                timing,
                event,
                definition,
            }
        })
        .collect()
}
