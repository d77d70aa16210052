use dbscope_core::{
    Constraint, ConstraintKind, DriverInfo, Engine, FkAction, ForeignKeyTarget, Index,
    ServerVersion, TableInfo, TableKind, Trigger,
};

use crate::mapper::{check_definition, foreign_key_definition, non_empty, split_list};

use super::queries::{RawCheckConstraint, RawIndex, RawKeyConstraint, RawTable, RawTrigger};

const MYSQL_GENERATED_COLUMNS: ServerVersion = ServerVersion::new(5, 7, 6);
const MYSQL_CHECK_CONSTRAINTS: ServerVersion = ServerVersion::new(8, 0, 16);
const MARIADB_GENERATED_COLUMNS: ServerVersion = ServerVersion::new(10, 2, 5);
const MARIADB_CHECK_CONSTRAINTS: ServerVersion = ServerVersion::new(10, 2, 1);

/// Resolve the engine family from the `VERSION()` banner and derive capabilities.
///
/// A banner mentioning MariaDB wins over the engine the driver was created for.
pub fn driver_info(requested: Engine, banner: String) -> DriverInfo {
    let engine = if banner.to_ascii_lowercase().contains("mariadb") {
        Engine::MariaDb
    } else {
        requested
    };
    let version = ServerVersion::parse(&banner).unwrap_or_default();
    let (generated, checks) = match engine {
        Engine::MariaDb => (MARIADB_GENERATED_COLUMNS, MARIADB_CHECK_CONSTRAINTS),
        _ => (MYSQL_GENERATED_COLUMNS, MYSQL_CHECK_CONSTRAINTS),
    };

    DriverInfo {
        engine,
        version,
        raw_version: banner,
        supports_generated_columns: version >= generated,
        supports_check_constraints: version >= checks,
    }
}

pub fn map_tables(raw: Vec<RawTable>) -> Vec<TableInfo> {
    raw.into_iter()
        .map(|table| TableInfo {
            kind: TableKind::from_catalog(&table.table_type),
            name: table.name,
            comment: non_empty(table.comment),
            created_at: table.created_at,
            def: String::new(),
        })
        .collect()
}

pub fn map_indexes(raw: Vec<RawIndex>) -> Vec<Index> {
    raw.into_iter()
        .map(|index| {
            let columns = split_list(index.columns.as_deref());
            let is_primary = index.name == "PRIMARY";
            let is_unique = index.non_unique == 0;
            let method = non_empty(index.index_type);
            let head = if is_primary {
                "PRIMARY KEY".to_string()
            } else if is_unique {
                format!("UNIQUE KEY {}", index.name)
            } else {
                format!("KEY {}", index.name)
            };
            let mut definition = format!("{head} ({})", columns.join(", "));
            if let Some(method) = &method {
                definition.push_str(" USING ");
                definition.push_str(method);
            }

            Index {
                name: index.name,
                columns,
                is_unique,
                is_primary,
                method,
                definition,
            }
        })
        .collect()
}

pub fn map_key_constraints(raw: Vec<RawKeyConstraint>) -> Vec<Constraint> {
    raw.into_iter()
        .map(|row| {
            let kind = ConstraintKind::from_catalog(&row.constraint_type);
            let columns = split_list(row.columns.as_deref());

            let (definition, foreign_key) = match (&kind, row.referenced_table) {
                (ConstraintKind::ForeignKey, Some(table)) => {
                    let target = ForeignKeyTarget {
                        columns: split_list(row.referenced_columns.as_deref()),
                        on_update: row
                            .update_rule
                            .as_deref()
                            .map_or(FkAction::Unknown, FkAction::from_rule),
                        on_delete: row
                            .delete_rule
                            .as_deref()
                            .map_or(FkAction::Unknown, FkAction::from_rule),
                        table,
                    };
                    let definition = foreign_key_definition(
                        &columns,
                        &target.table,
                        &target.columns,
                        target.on_update,
                        target.on_delete,
                    );
                    (definition, Some(target))
                }
                (ConstraintKind::PrimaryKey, _) => {
                    (format!("PRIMARY KEY ({})", columns.join(", ")), None)
                }
                (ConstraintKind::Unique, _) => (
                    format!("UNIQUE KEY {} ({})", row.name, columns.join(", ")),
                    None,
                ),
                _ => (String::new(), None),
            };

            Constraint {
                name: row.name,
                kind,
                definition,
                columns,
                foreign_key,
            }
        })
        .collect()
}

pub fn map_check_constraints(raw: Vec<RawCheckConstraint>) -> Vec<Constraint> {
    raw.into_iter()
        .map(|row| Constraint {
            definition: check_definition(&row.clause),
            name: row.name,
            kind: ConstraintKind::Check,
            columns: Vec::new(),
            foreign_key: None,
        })
        .collect()
}

pub fn map_triggers(table: &str, raw: Vec<RawTrigger>) -> Vec<Trigger> {
    raw.into_iter()
        .map(|row| Trigger {
            definition: format!(
                "CREATE TRIGGER {} {} {} ON {} FOR EACH ROW {}",
                row.name, row.timing, row.event, table, row.statement
            ),
            name: row.name,
            timing: row.timing,
            event: row.event,
            statement: row.statement,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_mariadb_from_banner() {
        let info = driver_info(Engine::Mysql, "10.6.12-MariaDB-1:10.6.12+maria~ubu2004".into());
        assert_eq!(info.engine, Engine::MariaDb);
        assert_eq!(info.version, ServerVersion::new(10, 6, 12));
        assert!(info.supports_generated_columns);
        assert!(info.supports_check_constraints);
    }

    #[test]
    fn capability_thresholds_follow_mysql_versions() {
        let old = driver_info(Engine::Mysql, "5.6.51".into());
        assert!(!old.supports_generated_columns);
        assert!(!old.supports_check_constraints);

        let mid = driver_info(Engine::Mysql, "5.7.6-log".into());
        assert!(mid.supports_generated_columns);
        assert!(!mid.supports_check_constraints);

        let new = driver_info(Engine::Mysql, "8.0.36".into());
        assert_eq!(new.engine, Engine::Mysql);
        assert!(new.supports_check_constraints);
    }

    #[test]
    fn unknown_table_type_passes_through() {
        let tables = map_tables(vec![RawTable {
            name: "tmp".into(),
            table_type: "SYSTEM VIEW".into(),
            comment: Some(String::new()),
            created_at: None,
        }]);
        assert_eq!(tables[0].kind, TableKind::Other("SYSTEM VIEW".into()));
        assert_eq!(tables[0].comment, None);
        assert!(tables[0].def.is_empty());
    }

    #[test]
    fn index_definitions_use_key_forms() {
        let indexes = map_indexes(vec![
            RawIndex {
                name: "PRIMARY".into(),
                non_unique: 0,
                index_type: Some("BTREE".into()),
                columns: Some("id".into()),
            },
            RawIndex {
                name: "posts_user_id_title_idx".into(),
                non_unique: 1,
                index_type: Some("BTREE".into()),
                columns: Some("user_id, title".into()),
            },
            RawIndex {
                name: "slug".into(),
                non_unique: 0,
                index_type: None,
                columns: Some("slug".into()),
            },
        ]);

        assert!(indexes[0].is_primary);
        assert_eq!(indexes[0].definition, "PRIMARY KEY (id) USING BTREE");
        assert_eq!(
            indexes[1].definition,
            "KEY posts_user_id_title_idx (user_id, title) USING BTREE"
        );
        assert_eq!(indexes[1].columns, vec!["user_id", "title"]);
        assert!(indexes[2].is_unique);
        assert_eq!(indexes[2].definition, "UNIQUE KEY slug (slug)");
    }

    #[test]
    fn maps_foreign_key_rows() {
        let constraints = map_key_constraints(vec![RawKeyConstraint {
            name: "posts_user_id_fk".into(),
            constraint_type: "FOREIGN KEY".into(),
            columns: Some("user_id".into()),
            referenced_table: Some("users".into()),
            referenced_columns: Some("id".into()),
            update_rule: Some("NO ACTION".into()),
            delete_rule: Some("CASCADE".into()),
        }]);

        let fk = &constraints[0];
        assert!(fk.is_foreign_key());
        assert_eq!(
            fk.definition,
            "FOREIGN KEY (user_id) REFERENCES users (id) ON UPDATE NO ACTION ON DELETE CASCADE"
        );
        let target = fk.foreign_key.as_ref().expect("target");
        assert_eq!(target.table, "users");
        assert_eq!(target.on_delete, FkAction::Cascade);
    }

    #[test]
    fn trigger_definition_includes_table() {
        let triggers = map_triggers(
            "posts",
            vec![RawTrigger {
                name: "update_posts_updated".into(),
                timing: "BEFORE".into(),
                event: "UPDATE".into(),
                statement: "SET NEW.updated = CURRENT_TIMESTAMP()".into(),
            }],
        );
        assert_eq!(
            triggers[0].definition,
            "CREATE TRIGGER update_posts_updated BEFORE UPDATE ON posts FOR EACH ROW SET NEW.updated = CURRENT_TIMESTAMP()"
        );
    }
}
