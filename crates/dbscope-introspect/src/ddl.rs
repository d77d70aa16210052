//! Definition text for tables and views.
//!
//! Base tables use the engine's native "show create" facility; views are
//! rebuilt as `CREATE VIEW <name> AS (<body>)` from the catalog's view body.
//! Nothing is synthesized from column metadata: a missing native definition
//! yields an empty string.

use std::sync::LazyLock;

use regex::Regex;

use dbscope_core::{Result, TableInfo, TableKind};

use crate::driver::Driver;

static AUTO_INCREMENT_OPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" AUTO_INCREMENT=\d+").expect("valid regex"));

static VIEW_STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*CREATE\s+(?:TEMP(?:ORARY)?\s+)?VIEW\s+(?:IF\s+NOT\s+EXISTS\s+)?.+?\s+AS\s+(.*)$")
        .expect("valid regex")
});

static GENERATED_AS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bAS\s*\(").expect("valid regex"));

static CHECK_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:\bCONSTRAINT\s+("[^"]+"|`[^`]+`|\[[^\]]+\]|\w+)\s+)?\bCHECK\s*\("#)
        .expect("valid regex")
});

static TRIGGER_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)\bTRIGGER\s+(?:IF\s+NOT\s+EXISTS\s+)?\S+\s+(?:(BEFORE|AFTER|INSTEAD\s+OF)\s+)?(INSERT|UPDATE|DELETE|TRUNCATE)\b(.*?)\s+ON\s",
    )
    .expect("valid regex")
});

static TRIGGER_BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bBEGIN\b|\bEXECUTE\s+(?:FUNCTION|PROCEDURE)\b").expect("valid regex")
});

/// Definition text for one listed table or view.
///
/// Kinds other than `BASE TABLE` and `VIEW` are skipped and yield an empty string.
pub async fn reconstruct<D>(driver: &D, schema: &str, info: &TableInfo) -> Result<String>
where
    D: Driver + ?Sized,
{
    let def = match &info.kind {
        TableKind::BaseTable => driver
            .show_create_table(schema, &info.name)
            .await?
            .filter(|def| !def.trim().is_empty())
            .unwrap_or_default(),
        TableKind::View => driver
            .view_body(schema, &info.name)
            .await?
            .map(|body| view_definition(&info.name, &body))
            .unwrap_or_default(),
        TableKind::Other(_) => return Ok(String::new()),
    };

    if def.is_empty() {
        tracing::debug!(
            event = "definition_missing",
            schema = %schema,
            table = %info.name,
            kind = %info.kind
        );
    }
    Ok(def)
}

/// `CREATE VIEW <name> AS (<body>)`, or empty when the body is blank.
pub fn view_definition(name: &str, body: &str) -> String {
    let body = body.trim().trim_end_matches(';').trim_end();
    if body.is_empty() {
        return String::new();
    }
    format!("CREATE VIEW {name} AS ({body})")
}

/// Drop the ` AUTO_INCREMENT=<n>` table option from `SHOW CREATE TABLE` text.
pub fn strip_auto_increment(def: &str) -> String {
    AUTO_INCREMENT_OPTION.replace_all(def, "").into_owned()
}

/// Body of a stored `CREATE VIEW ... AS <body>` statement.
pub fn view_body_from_statement(statement: &str) -> Option<String> {
    let masked = mask_quoted(statement);
    VIEW_STATEMENT
        .captures(&masked)
        .and_then(|caps| caps.get(1))
        .map(|body| statement[body.range()].trim().to_string())
        .filter(|body| !body.is_empty())
}

/// `sql` with the contents of quoted strings and identifiers blanked out.
///
/// Byte offsets are preserved, so matches found in the copy index the original.
fn mask_quoted(sql: &str) -> String {
    let mut masked = String::with_capacity(sql.len());
    let mut quote: Option<char> = None;

    for ch in sql.chars() {
        match quote {
            Some(closing) if ch == closing => {
                quote = None;
                masked.push(ch);
            }
            Some(_) => masked.extend(std::iter::repeat_n(' ', ch.len_utf8())),
            None => {
                match ch {
                    '\'' | '"' | '`' => quote = Some(ch),
                    '[' => quote = Some(']'),
                    _ => {}
                }
                masked.push(ch);
            }
        }
    }
    masked
}

/// Byte index of the parenthesis closing the one at `open`.
///
/// Quoted strings and identifiers (`'`, `"`, `` ` ``, `[]`) are skipped.
pub fn closing_paren(sql: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for (idx, ch) in sql[open..].char_indices() {
        if let Some(closing) = quote {
            if ch == closing {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' | '`' => quote = Some(ch),
            '[' => quote = Some(']'),
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// True when the whole text is one parenthesized group.
pub fn is_parenthesized(sql: &str) -> bool {
    let sql = sql.trim();
    sql.starts_with('(') && closing_paren(sql, 0) == Some(sql.len() - 1)
}

/// Top-level column and constraint definitions of a `CREATE TABLE` statement.
pub fn table_elements(create_sql: &str) -> Vec<&str> {
    let Some(open) = mask_quoted(create_sql).find('(') else {
        return Vec::new();
    };
    let Some(close) = closing_paren(create_sql, open) else {
        return Vec::new();
    };
    let body = &create_sql[open + 1..close];

    let mut elements = Vec::new();
    let mut start = 0;
    let mut cursor = 0;
    while cursor < body.len() {
        let ch = body[cursor..].chars().next().unwrap_or(',');
        match ch {
            '(' => cursor = closing_paren(body, cursor).unwrap_or(body.len() - 1),
            '\'' | '"' | '`' | '[' => {
                let closing = if ch == '[' { ']' } else { ch };
                cursor = body[cursor + 1..]
                    .find(closing)
                    .map(|offset| cursor + 1 + offset)
                    .unwrap_or(body.len() - 1);
            }
            ',' => {
                elements.push(body[start..cursor].trim());
                start = cursor + 1;
            }
            _ => {}
        }
        cursor += ch.len_utf8();
    }
    elements.push(body[start..].trim());
    elements.retain(|element| !element.is_empty());
    elements
}

/// Leading identifier of a table element, unquoted.
fn element_name(element: &str) -> &str {
    let element = element.trim_start();
    for (open, close) in [('"', '"'), ('`', '`'), ('[', ']')] {
        if let Some(rest) = element.strip_prefix(open) {
            return rest.split(close).next().unwrap_or(rest);
        }
    }
    element.split_whitespace().next().unwrap_or("")
}

/// Parenthesized generation expression of `column` in a `CREATE TABLE` statement.
pub fn generated_expression(create_sql: &str, column: &str) -> Option<String> {
    let element = table_elements(create_sql)
        .into_iter()
        .find(|element| element_name(element).eq_ignore_ascii_case(column))?;
    let masked = mask_quoted(element);
    let found = GENERATED_AS.find(&masked)?;
    let open = found.end() - 1;
    let close = closing_paren(element, open)?;
    Some(element[open..=close].to_string())
}

/// `CHECK` clauses of a `CREATE TABLE` statement as `(name, expression)`.
pub fn check_clauses(create_sql: &str) -> Vec<(Option<String>, String)> {
    let masked = mask_quoted(create_sql);
    let mut clauses = Vec::new();
    for caps in CHECK_CLAUSE.captures_iter(&masked) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let open = whole.end() - 1;
        let Some(close) = closing_paren(create_sql, open) else {
            continue;
        };
        let name = caps
            .get(1)
            .map(|name| unquote_identifier(&create_sql[name.range()]).to_string());
        clauses.push((name, create_sql[open + 1..close].trim().to_string()));
    }
    clauses
}

fn unquote_identifier(ident: &str) -> &str {
    let ident = ident.trim();
    for (open, close) in [('"', '"'), ('`', '`'), ('[', ']')] {
        if let Some(inner) = ident.strip_prefix(open).and_then(|rest| rest.strip_suffix(close)) {
            return inner;
        }
    }
    ident
}

/// Timing and event of a `CREATE TRIGGER` statement.
///
/// SQLite allows omitting the timing; it defaults to `BEFORE`.
pub fn trigger_header(definition: &str) -> Option<(String, String)> {
    let caps = TRIGGER_HEADER.captures(definition)?;
    let timing = caps
        .get(1)
        .map(|timing| collapse_whitespace(timing.as_str()).to_uppercase())
        .unwrap_or_else(|| "BEFORE".to_string());
    let mut event = caps.get(2)?.as_str().to_uppercase();
    let tail = collapse_whitespace(caps.get(3).map(|m| m.as_str()).unwrap_or_default());
    if !tail.is_empty() {
        event.push(' ');
        event.push_str(&tail);
    }
    Some((timing, event))
}

/// Action part of a `CREATE TRIGGER` statement (`BEGIN ... END` or `EXECUTE FUNCTION ...`).
pub fn trigger_statement(definition: &str) -> String {
    TRIGGER_BODY
        .find(definition)
        .map(|found| definition[found.start()..].trim().to_string())
        .unwrap_or_default()
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_view_body() {
        assert_eq!(
            view_definition("active_users", "SELECT * FROM users WHERE active=1"),
            "CREATE VIEW active_users AS (SELECT * FROM users WHERE active=1)"
        );
        assert_eq!(
            view_definition("v", " SELECT users.id\n   FROM users;"),
            "CREATE VIEW v AS (SELECT users.id\n   FROM users)"
        );
        assert_eq!(view_definition("v", "  "), "");
    }

    #[test]
    fn strips_auto_increment_option() {
        let def = "CREATE TABLE `posts` (\n  `id` bigint NOT NULL AUTO_INCREMENT\n) ENGINE=InnoDB AUTO_INCREMENT=42 DEFAULT CHARSET=utf8mb4";
        assert_eq!(
            strip_auto_increment(def),
            "CREATE TABLE `posts` (\n  `id` bigint NOT NULL AUTO_INCREMENT\n) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4"
        );
    }

    #[test]
    fn extracts_view_body_from_statement() {
        assert_eq!(
            view_body_from_statement(
                "CREATE VIEW active_users AS SELECT * FROM users WHERE active=1"
            )
            .as_deref(),
            Some("SELECT * FROM users WHERE active=1")
        );
        assert_eq!(
            view_body_from_statement("create temp view if not exists v (a, b) as\n select 1, 2")
                .as_deref(),
            Some("select 1, 2")
        );
        assert_eq!(
            view_body_from_statement("CREATE VIEW \"cats AS dogs\" AS SELECT 1 AS one")
                .as_deref(),
            Some("SELECT 1 AS one")
        );
        assert_eq!(view_body_from_statement("CREATE TABLE t (id int)"), None);
    }

    #[test]
    fn matches_parentheses_outside_quotes() {
        let sql = "(a + ')' + (b))";
        assert_eq!(closing_paren(sql, 0), Some(sql.len() - 1));
        assert!(is_parenthesized("(`age` >= 0)"));
        assert!(!is_parenthesized("(a > 0) AND (b > 0)"));
    }

    #[test]
    fn splits_table_elements() {
        let sql = "CREATE TABLE t (id INTEGER PRIMARY KEY, price NUMERIC(10, 2), note TEXT DEFAULT 'a,b', CHECK (price > 0))";
        assert_eq!(
            table_elements(sql),
            vec![
                "id INTEGER PRIMARY KEY",
                "price NUMERIC(10, 2)",
                "note TEXT DEFAULT 'a,b'",
                "CHECK (price > 0)"
            ]
        );

        let quoted = "CREATE TABLE \"odd(name\" (a INTEGER, b TEXT)";
        assert_eq!(table_elements(quoted), vec!["a INTEGER", "b TEXT"]);
    }

    #[test]
    fn finds_generated_expression() {
        let sql = "CREATE TABLE items (price REAL, qty INTEGER, \"total\" REAL GENERATED ALWAYS AS (price * (qty + 0)) STORED, half REAL AS (price / 2))";
        assert_eq!(
            generated_expression(sql, "total").as_deref(),
            Some("(price * (qty + 0))")
        );
        assert_eq!(generated_expression(sql, "half").as_deref(), Some("(price / 2)"));
        assert_eq!(generated_expression(sql, "price"), None);

        let literal = "CREATE TABLE t (label TEXT DEFAULT 'known AS (alias)')";
        assert_eq!(generated_expression(literal, "label"), None);
    }

    #[test]
    fn collects_check_clauses() {
        let sql = "CREATE TABLE users (age INTEGER CHECK (age >= 0), name TEXT, CONSTRAINT \"name_len\" CHECK (length(name) > (1)))";
        assert_eq!(
            check_clauses(sql),
            vec![
                (None, "age >= 0".to_string()),
                (Some("name_len".to_string()), "length(name) > (1)".to_string())
            ]
        );
    }

    #[test]
    fn ignores_check_inside_literals() {
        let sql = "CREATE TABLE notes (id INTEGER, body TEXT DEFAULT 'see CHECK (x) later')";
        assert!(check_clauses(sql).is_empty());

        let mixed = "CREATE TABLE notes (body TEXT DEFAULT 'CHECK (y)' CHECK (body <> ''), \"CHECK (z)\" INTEGER)";
        assert_eq!(check_clauses(mixed), vec![(None, "body <> ''".to_string())]);
    }

    #[test]
    fn parses_trigger_headers() {
        let sqlite = "CREATE TRIGGER update_posts_updated AFTER UPDATE OF title ON posts FOR EACH ROW BEGIN UPDATE posts SET updated = CURRENT_TIMESTAMP WHERE id = old.id; END";
        assert_eq!(
            trigger_header(sqlite),
            Some(("AFTER".to_string(), "UPDATE OF title".to_string()))
        );
        assert!(trigger_statement(sqlite).starts_with("BEGIN UPDATE posts"));

        let pg = "CREATE TRIGGER audit BEFORE INSERT OR UPDATE ON app.users FOR EACH ROW EXECUTE FUNCTION app.audit()";
        assert_eq!(
            trigger_header(pg),
            Some(("BEFORE".to_string(), "INSERT OR UPDATE".to_string()))
        );
        assert_eq!(trigger_statement(pg), "EXECUTE FUNCTION app.audit()");

        let bare = "CREATE TRIGGER t1 DELETE ON logs BEGIN SELECT 1; END";
        assert_eq!(
            trigger_header(bare),
            Some(("BEFORE".to_string(), "DELETE".to_string()))
        );
    }
}
