use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::schema::{Relation, Schema, Table};

/// Summary of the relation graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationGraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Parent-before-child ordering of a schema's tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationGraphReport {
    pub summary: RelationGraphSummary,
    pub load_order: Option<Vec<String>>,
    pub cycle: Option<Vec<String>>,
}

/// Collect foreign-key edges from assembled tables, in table then constraint order.
pub fn relations_from_tables(tables: &[Table]) -> Vec<Relation> {
    tables
        .iter()
        .flat_map(|table| {
            table.constraints.iter().filter_map(move |constraint| {
                let target = constraint.foreign_key.as_ref()?;
                Some(Relation {
                    table: table.name().to_string(),
                    columns: constraint.columns.clone(),
                    parent_table: target.table.clone(),
                    parent_columns: target.columns.clone(),
                    constraint: constraint.name.clone(),
                    definition: constraint.definition.clone(),
                })
            })
        })
        .collect()
}

/// Build a deterministic dependency report from `schema.relations`.
///
/// Parents that are not part of the schema still appear as nodes. Self
/// references do not constrain the order.
pub fn build_relation_graph(schema: &Schema) -> RelationGraphReport {
    let mut children: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for table in &schema.tables {
        children.entry(table.name()).or_default();
    }
    for relation in &schema.relations {
        children.entry(relation.table.as_str()).or_default();
        let edges = children.entry(relation.parent_table.as_str()).or_default();
        if relation.parent_table != relation.table {
            edges.insert(relation.table.as_str());
        }
    }

    let summary = RelationGraphSummary {
        nodes: children.len(),
        edges: children.values().map(BTreeSet::len).sum(),
    };

    let mut pending: BTreeMap<&str, usize> = children.keys().map(|node| (*node, 0)).collect();
    for targets in children.values() {
        for target in targets {
            *pending.entry(*target).or_insert(0) += 1;
        }
    }

    let mut queue: VecDeque<&str> = pending
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(node, _)| *node)
        .collect();
    let mut order = Vec::with_capacity(children.len());

    while let Some(node) = queue.pop_front() {
        order.push(node.to_string());
        for child in &children[node] {
            let count = pending.entry(*child).or_insert(0);
            *count -= 1;
            if *count == 0 {
                queue.push_back(*child);
            }
        }
    }

    if order.len() == children.len() {
        return RelationGraphReport {
            summary,
            load_order: Some(order),
            cycle: None,
        };
    }

    let cycle = pending
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(node, _)| node.to_string())
        .collect();
    RelationGraphReport {
        summary,
        load_order: None,
        cycle: Some(cycle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{Constraint, ConstraintKind, FkAction, ForeignKeyTarget};
    use crate::schema::TableInfo;
    use crate::types::TableKind;

    fn fk_table(name: &str, parent: &str) -> Table {
        let mut table = Table::new(TableInfo::new(name, TableKind::BaseTable));
        table.constraints.push(Constraint {
            name: format!("{name}_{parent}_fk"),
            kind: ConstraintKind::ForeignKey,
            definition: format!("FOREIGN KEY (parent_id) REFERENCES {parent} (id)"),
            columns: vec!["parent_id".to_string()],
            foreign_key: Some(ForeignKeyTarget {
                table: parent.to_string(),
                columns: vec!["id".to_string()],
                on_update: FkAction::NoAction,
                on_delete: FkAction::Cascade,
            }),
        });
        table
    }

    fn schema_of(tables: Vec<Table>) -> Schema {
        let mut schema = Schema::new("app");
        schema.relations = relations_from_tables(&tables);
        schema.tables = tables;
        schema
    }

    #[test]
    fn orders_parents_before_children() {
        let schema = schema_of(vec![
            fk_table("comments", "posts"),
            fk_table("posts", "users"),
            Table::new(TableInfo::new("users", TableKind::BaseTable)),
        ]);

        let report = build_relation_graph(&schema);
        assert_eq!(report.summary, RelationGraphSummary { nodes: 3, edges: 2 });
        assert_eq!(
            report.load_order,
            Some(vec![
                "users".to_string(),
                "posts".to_string(),
                "comments".to_string()
            ])
        );
        assert!(report.cycle.is_none());
    }

    #[test]
    fn reports_cycle_and_ignores_self_reference() {
        let schema = schema_of(vec![
            fk_table("a", "b"),
            fk_table("b", "a"),
            fk_table("tree", "tree"),
        ]);

        let report = build_relation_graph(&schema);
        assert!(report.load_order.is_none());
        assert_eq!(report.cycle, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn relations_follow_foreign_keys() {
        let relations = relations_from_tables(&[fk_table("posts", "users")]);
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].table, "posts");
        assert_eq!(relations[0].parent_table, "users");
        assert_eq!(relations[0].parent_columns, vec!["id".to_string()]);
    }
}
