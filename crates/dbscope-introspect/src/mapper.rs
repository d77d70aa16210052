//! Row-to-model rules shared by every backend.

use dbscope_core::{Column, Constraint, FkAction};

use crate::ddl::is_parenthesized;

/// Column row in the shape every backend's catalog query produces.
pub struct RawColumn {
    pub name: String,
    pub ordinal_position: i64,
    pub data_type: String,
    pub is_nullable: Option<String>,
    pub default: Option<String>,
    pub comment: Option<String>,
    pub extra: Option<String>,
    pub generation_expression: Option<String>,
}

/// A column is nullable unless the catalog flag is exactly `NO`.
pub fn nullable_from_flag(flag: Option<&str>) -> bool {
    flag != Some("NO")
}

/// Merge the catalog "extra" attribute with a generation expression.
///
/// Without an expression the extra value is returned unchanged.
pub fn merge_extra_def(extra: Option<String>, generation_expression: Option<&str>) -> Option<String> {
    let expression = match generation_expression {
        Some(expression) if !expression.is_empty() => expression,
        _ => return extra,
    };

    let kind = extra.unwrap_or_default();
    Some(match kind.as_str() {
        "VIRTUAL GENERATED" => format!("GENERATED ALWAYS AS {expression} VIRTUAL"),
        "STORED GENERATED" => format!("GENERATED ALWAYS AS {expression} STORED"),
        other => format!("{other}:{expression}"),
    })
}

pub fn map_columns(raw: Vec<RawColumn>) -> Vec<Column> {
    raw.into_iter()
        .map(|col| Column {
            nullable: nullable_from_flag(col.is_nullable.as_deref()),
            extra_def: merge_extra_def(col.extra, col.generation_expression.as_deref()),
            name: col.name,
            ordinal_position: col.ordinal_position,
            data_type: col.data_type,
            default: col.default,
            comment: non_empty(col.comment),
        })
        .collect()
}

/// `LIKE` operand for a substring match. An empty pattern matches everything.
pub fn like_pattern(pattern: &str) -> String {
    format!("%{pattern}%")
}

/// Catalogs report "no comment" as an empty string; the model uses `None`.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

/// Split a `GROUP_CONCAT`-style column list (`a, b`).
pub fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// `FOREIGN KEY (a) REFERENCES t (b) ON UPDATE x ON DELETE y`.
pub fn foreign_key_definition(
    columns: &[String],
    table: &str,
    referenced_columns: &[String],
    on_update: FkAction,
    on_delete: FkAction,
) -> String {
    let mut def = format!(
        "FOREIGN KEY ({}) REFERENCES {} ({})",
        columns.join(", "),
        table,
        referenced_columns.join(", ")
    );
    if let Some(rule) = on_update.as_sql() {
        def.push_str(" ON UPDATE ");
        def.push_str(rule);
    }
    if let Some(rule) = on_delete.as_sql() {
        def.push_str(" ON DELETE ");
        def.push_str(rule);
    }
    def
}

/// `CHECK (expr)`, without doubling parentheses the catalog already added.
pub fn check_definition(clause: &str) -> String {
    let clause = clause.trim();
    if is_parenthesized(clause) {
        format!("CHECK {clause}")
    } else {
        format!("CHECK ({clause})")
    }
}

/// Order constraints by name the way case-insensitive catalog collations do.
pub fn sort_constraints(constraints: &mut [Constraint]) {
    constraints.sort_by_cached_key(|constraint| constraint.name.to_lowercase());
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbscope_core::ConstraintKind;

    #[test]
    fn nullable_only_false_for_exact_no() {
        assert!(!nullable_from_flag(Some("NO")));
        assert!(nullable_from_flag(Some("YES")));
        assert!(nullable_from_flag(Some("no")));
        assert!(nullable_from_flag(Some("")));
        assert!(nullable_from_flag(None));
    }

    #[test]
    fn merges_generated_column_kinds() {
        assert_eq!(
            merge_extra_def(Some("VIRTUAL GENERATED".into()), Some("(`a` + `b`)")).as_deref(),
            Some("GENERATED ALWAYS AS (`a` + `b`) VIRTUAL")
        );
        assert_eq!(
            merge_extra_def(Some("STORED GENERATED".into()), Some("concat(`x`)")).as_deref(),
            Some("GENERATED ALWAYS AS concat(`x`) STORED")
        );
        assert_eq!(
            merge_extra_def(Some("DEFAULT_GENERATED".into()), Some("now()")).as_deref(),
            Some("DEFAULT_GENERATED:now()")
        );
        assert_eq!(
            merge_extra_def(None, Some("now()")).as_deref(),
            Some(":now()")
        );
    }

    #[test]
    fn extra_passes_through_without_expression() {
        assert_eq!(
            merge_extra_def(Some("auto_increment".into()), None).as_deref(),
            Some("auto_increment")
        );
        assert_eq!(
            merge_extra_def(Some("on update CURRENT_TIMESTAMP".into()), Some("")).as_deref(),
            Some("on update CURRENT_TIMESTAMP")
        );
        assert_eq!(merge_extra_def(Some(String::new()), None).as_deref(), Some(""));
        assert_eq!(merge_extra_def(None, None), None);
    }

    #[test]
    fn maps_columns_in_given_order() {
        let raw = vec![
            RawColumn {
                name: "id".into(),
                ordinal_position: 1,
                data_type: "bigint".into(),
                is_nullable: Some("NO".into()),
                default: None,
                comment: Some(String::new()),
                extra: Some("auto_increment".into()),
                generation_expression: None,
            },
            RawColumn {
                name: "title".into(),
                ordinal_position: 2,
                data_type: "varchar(255)".into(),
                is_nullable: Some("YES".into()),
                default: Some("Untitled".into()),
                comment: Some("post title".into()),
                extra: Some(String::new()),
                generation_expression: None,
            },
        ];

        let columns = map_columns(raw);
        assert_eq!(columns[0].name, "id");
        assert!(!columns[0].nullable);
        assert_eq!(columns[0].comment, None);
        assert_eq!(columns[1].name, "title");
        assert!(columns[1].nullable);
        assert_eq!(columns[1].default.as_deref(), Some("Untitled"));
        assert_eq!(columns[1].comment.as_deref(), Some("post title"));
    }

    #[test]
    fn builds_constraint_definitions() {
        let def = foreign_key_definition(
            &["user_id".to_string()],
            "users",
            &["id".to_string()],
            FkAction::NoAction,
            FkAction::Cascade,
        );
        assert_eq!(
            def,
            "FOREIGN KEY (user_id) REFERENCES users (id) ON UPDATE NO ACTION ON DELETE CASCADE"
        );
        assert_eq!(check_definition("(`age` >= 0)"), "CHECK (`age` >= 0)");
        assert_eq!(check_definition("age >= 0"), "CHECK (age >= 0)");
        assert_eq!(split_list(Some("user_id, title")), vec!["user_id", "title"]);
        assert!(split_list(None).is_empty());
    }

    #[test]
    fn sorts_constraint_names_case_insensitively() {
        let named = |name: &str| Constraint {
            name: name.to_string(),
            kind: ConstraintKind::Unique,
            definition: String::new(),
            columns: Vec::new(),
            foreign_key: None,
        };
        let mut constraints = vec![named("user_id"), named("PRIMARY"), named("posts_user_id_fk")];
        sort_constraints(&mut constraints);
        let names: Vec<&str> = constraints.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["posts_user_id_fk", "PRIMARY", "user_id"]);
    }
}
