use dbscope_core::{
    Constraint, ConstraintKind, DriverInfo, Engine, FkAction, ForeignKeyTarget, Index,
    ServerVersion, TableInfo, TableKind, Trigger,
};

use crate::ddl;
use crate::mapper::non_empty;

use super::queries::{RawConstraint, RawIndex, RawTable, RawTrigger, RawVersion};

const GENERATED_COLUMNS: ServerVersion = ServerVersion::new(12, 0, 0);

pub fn driver_info(raw: RawVersion) -> DriverInfo {
    let version = ServerVersion::from_postgres_num(raw.number);
    DriverInfo {
        engine: Engine::Postgres,
        version,
        raw_version: raw.banner,
        supports_generated_columns: version >= GENERATED_COLUMNS,
        supports_check_constraints: true,
    }
}

pub fn map_tables(raw: Vec<RawTable>) -> Vec<TableInfo> {
    raw.into_iter()
        .map(|table| TableInfo {
            kind: TableKind::from_catalog(&table.table_type),
            name: table.name,
            comment: non_empty(table.comment),
            created_at: None,
            def: String::new(),
        })
        .collect()
}

pub fn map_indexes(raw: Vec<RawIndex>) -> Vec<Index> {
    raw.into_iter()
        .map(|idx| Index {
            name: idx.name,
            columns: idx.columns,
            is_unique: idx.is_unique,
            is_primary: idx.is_primary,
            method: Some(idx.method),
            definition: idx.definition,
        })
        .collect()
}

fn constraint_kind_from_code(code: &str) -> ConstraintKind {
    match code {
        "p" => ConstraintKind::PrimaryKey,
        "f" => ConstraintKind::ForeignKey,
        "u" => ConstraintKind::Unique,
        "c" => ConstraintKind::Check,
        "x" => ConstraintKind::Other("EXCLUDE".to_string()),
        other => ConstraintKind::Other(other.to_string()),
    }
}

pub fn map_constraints(raw: Vec<RawConstraint>) -> Vec<Constraint> {
    raw.into_iter()
        .map(|con| {
            let kind = constraint_kind_from_code(&con.type_code);
            let foreign_key = match (&kind, con.referenced_table) {
                (ConstraintKind::ForeignKey, Some(table)) => Some(ForeignKeyTarget {
                    table,
                    columns: con.referenced_columns,
                    on_update: FkAction::from_pg_code(&con.update_code),
                    on_delete: FkAction::from_pg_code(&con.delete_code),
                }),
                _ => None,
            };

            Constraint {
                name: con.name,
                kind,
                definition: con.definition,
                columns: con.columns,
                foreign_key,
            }
        })
        .collect()
}

/// Split `pg_get_triggerdef` output into timing, event and the executed statement.
pub fn map_triggers(raw: Vec<RawTrigger>) -> Vec<Trigger> {
    raw.into_iter()
        .map(|trg| {
            let (timing, event) = ddl::trigger_header(&trg.definition).unwrap_or_default();
            Trigger {
                statement: ddl::trigger_statement(&trg.definition),
                name: trg.name,
                timing,
                event,
                definition: trg.definition,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_columns_from_version_12() {
        let old = driver_info(RawVersion {
            number: 110_022,
            banner: "PostgreSQL 11.22".into(),
        });
        assert_eq!(old.version, ServerVersion::new(11, 0, 22));
        assert!(!old.supports_generated_columns);

        let new = driver_info(RawVersion {
            number: 150_004,
            banner: "PostgreSQL 15.4 on x86_64-pc-linux-gnu".into(),
        });
        assert!(new.supports_generated_columns);
        assert_eq!(new.engine, Engine::Postgres);
    }

    #[test]
    fn materialized_views_pass_through() {
        let tables = map_tables(vec![RawTable {
            name: "daily_totals".into(),
            table_type: "MATERIALIZED VIEW".into(),
            comment: None,
        }]);
        assert_eq!(tables[0].kind, TableKind::Other("MATERIALIZED VIEW".into()));
    }

    #[test]
    fn maps_foreign_key_codes() {
        let constraints = map_constraints(vec![
            RawConstraint {
                name: "posts_user_id_fk".into(),
                type_code: "f".into(),
                definition: "FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE".into(),
                columns: vec!["user_id".into()],
                referenced_table: Some("users".into()),
                referenced_columns: vec!["id".into()],
                update_code: "a".into(),
                delete_code: "c".into(),
            },
            RawConstraint {
                name: "posts_pkey".into(),
                type_code: "p".into(),
                definition: "PRIMARY KEY (id)".into(),
                columns: vec!["id".into()],
                referenced_table: None,
                referenced_columns: Vec::new(),
                update_code: " ".into(),
                delete_code: " ".into(),
            },
        ]);

        let target = constraints[0].foreign_key.as_ref().expect("target");
        assert_eq!(target.table, "users");
        assert_eq!(target.on_update, FkAction::NoAction);
        assert_eq!(target.on_delete, FkAction::Cascade);
        assert_eq!(constraints[1].kind, ConstraintKind::PrimaryKey);
        assert!(constraints[1].foreign_key.is_none());
    }

    #[test]
    fn splits_trigger_definitions() {
        let triggers = map_triggers(vec![RawTrigger {
            name: "update_posts_updated".into(),
            definition: "CREATE TRIGGER update_posts_updated AFTER UPDATE ON public.posts FOR EACH ROW EXECUTE FUNCTION update_updated()".into(),
        }]);
        assert_eq!(triggers[0].timing, "AFTER");
        assert_eq!(triggers[0].event, "UPDATE");
        assert_eq!(triggers[0].statement, "EXECUTE FUNCTION update_updated()");
    }
}
