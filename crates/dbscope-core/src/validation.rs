use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::types::TableKind;

/// Foreign key whose target table is missing from the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub table: String,
    pub constraint: String,
    pub referenced_table: String,
}

/// Validate internal consistency of an analyzed schema.
///
/// This checks:
/// - duplicate table names
/// - duplicate column names within a table
/// - constraint columns exist on their base table
pub fn validate_schema(schema: &Schema) -> Result<()> {
    let mut catalog: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for table in &schema.tables {
        let mut columns = BTreeSet::new();
        for column in &table.columns {
            if !columns.insert(column.name.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate column name: {}.{}.{}",
                    schema.name(),
                    table.name(),
                    column.name
                )));
            }
        }

        if catalog.insert(table.name(), columns).is_some() {
            return Err(Error::InvalidSchema(format!(
                "duplicate table name: {}.{}",
                schema.name(),
                table.name()
            )));
        }
    }

    for table in &schema.tables {
        if table.info.kind != TableKind::BaseTable {
            continue;
        }
        let Some(columns) = catalog.get(table.name()) else {
            continue;
        };

        for constraint in &table.constraints {
            if let Some(missing) = constraint
                .columns
                .iter()
                .find(|column| !columns.contains(column.as_str()))
            {
                return Err(Error::InvalidSchema(format!(
                    "constraint {} references unknown column {}.{}.{}",
                    constraint.name,
                    schema.name(),
                    table.name(),
                    missing
                )));
            }
        }
    }

    Ok(())
}

/// List every foreign key that points outside the analyzed schema.
pub fn unresolved_references(schema: &Schema) -> Vec<UnresolvedReference> {
    schema
        .tables
        .iter()
        .flat_map(|table| {
            table
                .unresolved_references()
                .map(move |reference| UnresolvedReference {
                    table: table.name().to_string(),
                    constraint: reference.constraint.clone(),
                    referenced_table: reference.referenced_table.clone(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{Constraint, ConstraintKind};
    use crate::schema::{Column, Table, TableInfo, TableReference};

    fn column(name: &str, position: i64) -> Column {
        Column {
            name: name.to_string(),
            ordinal_position: position,
            data_type: "int".to_string(),
            nullable: false,
            default: None,
            comment: None,
            extra_def: None,
        }
    }

    fn table(name: &str, columns: &[&str]) -> Table {
        let mut table = Table::new(TableInfo::new(name, TableKind::BaseTable));
        table.columns = columns
            .iter()
            .enumerate()
            .map(|(idx, name)| column(name, idx as i64 + 1))
            .collect();
        table
    }

    #[test]
    fn rejects_duplicate_columns() {
        let mut schema = Schema::new("app");
        schema.tables.push(table("users", &["id", "id"]));

        let err = validate_schema(&schema).unwrap_err();
        assert!(err.to_string().contains("duplicate column name: app.users.id"));
    }

    #[test]
    fn rejects_constraint_on_missing_column() {
        let mut users = table("users", &["id"]);
        users.constraints.push(Constraint {
            name: "PRIMARY".to_string(),
            kind: ConstraintKind::PrimaryKey,
            definition: "PRIMARY KEY (uid)".to_string(),
            columns: vec!["uid".to_string()],
            foreign_key: None,
        });
        let mut schema = Schema::new("app");
        schema.tables.push(users);

        assert!(validate_schema(&schema).is_err());
    }

    #[test]
    fn reports_unresolved_references() {
        let mut posts = table("posts", &["id", "user_id"]);
        posts.references.push(TableReference {
            constraint: "posts_user_id_fk".to_string(),
            referenced_table: "users".to_string(),
            resolved: None,
        });
        let mut schema = Schema::new("app");
        schema.tables.push(posts);

        assert!(validate_schema(&schema).is_ok());
        let unresolved = unresolved_references(&schema);
        assert_eq!(
            unresolved,
            vec![UnresolvedReference {
                table: "posts".to_string(),
                constraint: "posts_user_id_fk".to_string(),
                referenced_table: "users".to_string(),
            }]
        );
    }
}
