//! SQL statements issued by [`PgSession`](super::PgSession).
//!
//! Rows travel as a single JSONB parameter and are spread into columns with
//! `jsonb_populate_record`, so one statement shape serves every table.

use serde_json::Value;

use super::Row;
use crate::table::{Column, ID_COLUMN, TableDef};

/// Quote an identifier for Postgres.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `$1` = id. Returns the whole row as JSONB in column `data`.
pub fn select_by_id(table: &TableDef) -> String {
    format!(
        "SELECT to_jsonb(t) AS data FROM {} AS t WHERE t.{} = $1",
        quote_ident(table.name),
        quote_ident(ID_COLUMN),
    )
}

/// `$1` = id.
pub fn delete_by_id(table: &TableDef) -> String {
    format!(
        "DELETE FROM {} WHERE {} = $1",
        quote_ident(table.name),
        quote_ident(ID_COLUMN),
    )
}

/// `$1` = row as JSONB.
///
/// Insert path: storage-managed columns the row leaves null are omitted so
/// their server defaults apply; on-update columns always start null.
/// Conflict path: writable columns are overwritten, on-insert columns are
/// kept and on-update columns are set to `now()`, but only when some
/// writable column actually differs.
pub fn upsert(table: &TableDef, row: &Row) -> String {
    let t = quote_ident(table.name);

    let insert_cols: Vec<String> = table
        .columns
        .iter()
        .filter(|c| c.on_update.is_none())
        .filter(|c| c.on_insert.is_none() || !is_null(row, c))
        .map(|c| quote_ident(c.name))
        .collect();
    let insert_list = insert_cols.join(", ");

    let writable: Vec<&Column> = table
        .columns
        .iter()
        .filter(|c| c.is_writable() && c.name != ID_COLUMN)
        .collect();

    let mut sql = format!(
        "INSERT INTO {t} ({insert_list}) SELECT {insert_list} FROM jsonb_populate_record(NULL::{t}, $1::jsonb) ON CONFLICT ({})",
        quote_ident(ID_COLUMN),
    );

    if writable.is_empty() {
        sql.push_str(" DO NOTHING");
        return sql;
    }

    let mut assignments: Vec<String> = writable
        .iter()
        .map(|c| {
            let col = quote_ident(c.name);
            format!("{col} = EXCLUDED.{col}")
        })
        .collect();
    assignments.extend(
        table
            .columns
            .iter()
            .filter(|c| c.on_update.is_some())
            .map(|c| format!("{} = now()", quote_ident(c.name))),
    );

    let current = writable
        .iter()
        .map(|c| format!("{t}.{}", quote_ident(c.name)))
        .collect::<Vec<_>>()
        .join(", ");
    let excluded = writable
        .iter()
        .map(|c| format!("EXCLUDED.{}", quote_ident(c.name)))
        .collect::<Vec<_>>()
        .join(", ");

    sql.push_str(&format!(
        " DO UPDATE SET {} WHERE ({current}) IS DISTINCT FROM ({excluded})",
        assignments.join(", ")
    ));
    sql
}

fn is_null(row: &Row, col: &Column) -> bool {
    row.get(col.name).is_none_or(Value::is_null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOTES: TableDef = TableDef::new("notes", crate::table_columns![Column::new("body"); tracked]);

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_ident("notes"), "\"notes\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn select_and_delete_target_the_primary_key() {
        assert_eq!(
            select_by_id(&NOTES),
            "SELECT to_jsonb(t) AS data FROM \"notes\" AS t WHERE t.\"id\" = $1"
        );
        assert_eq!(delete_by_id(&NOTES), "DELETE FROM \"notes\" WHERE \"id\" = $1");
    }

    #[test]
    fn new_row_leaves_audit_columns_to_the_server() {
        let row = json!({ "id": "a", "body": "x", "create_date": null, "update_date": null, "delete_date": null });
        let sql = upsert(&NOTES, row.as_object().unwrap());

        assert!(sql.starts_with(
            "INSERT INTO \"notes\" (\"id\", \"body\", \"delete_date\") SELECT \"id\", \"body\", \"delete_date\" FROM jsonb_populate_record(NULL::\"notes\", $1::jsonb)"
        ));
        assert!(sql.contains(
            "DO UPDATE SET \"body\" = EXCLUDED.\"body\", \"delete_date\" = EXCLUDED.\"delete_date\", \"update_date\" = now()"
        ));
        assert!(sql.ends_with(
            "WHERE (\"notes\".\"body\", \"notes\".\"delete_date\") IS DISTINCT FROM (EXCLUDED.\"body\", EXCLUDED.\"delete_date\")"
        ));
    }

    #[test]
    fn loaded_row_keeps_its_create_date_on_insert() {
        let row = json!({ "id": "a", "body": "x", "create_date": "2024-01-01T00:00:00Z" });
        let sql = upsert(&NOTES, row.as_object().unwrap());
        assert!(sql.starts_with("INSERT INTO \"notes\" (\"id\", \"body\", \"create_date\", \"delete_date\")"));
        assert!(!sql.contains("\"create_date\" = EXCLUDED"));
    }

    #[test]
    fn id_only_table_does_nothing_on_conflict() {
        const TAGS: TableDef = TableDef::new("tags", crate::table_columns![]);
        let row = json!({ "id": "a" });
        let sql = upsert(&TAGS, row.as_object().unwrap());
        assert!(sql.ends_with("ON CONFLICT (\"id\") DO NOTHING"));
    }
}
