//! SQLite schema for the session table
//!
//! One row per item: the partition key `id` plus the item's JSON document.
//! Other entity kinds may share the table; `__typename` inside the document
//! tells them apart.

use crate::error::{CoreError, Result};
use rusqlite::Connection;

/// Create the item table if it does not exist yet
pub fn init_db(conn: &Connection, table: &str) -> Result<()> {
    let table = quote_table(table)?;

    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id TEXT PRIMARY KEY NOT NULL,
                item TEXT NOT NULL CHECK (json_valid(item))
            )"
        ),
        [],
    )?;

    Ok(())
}

/// Validate a table name and return it quoted for use in SQL.
///
/// Names come from configuration, not from requests, but they are spliced
/// into statements, so only `[A-Za-z0-9_.-]` is accepted.
pub fn quote_table(table: &str) -> Result<String> {
    let valid = !table.is_empty()
        && table.len() <= 255
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if !valid {
        return Err(CoreError::Validation(format!(
            "invalid table name: {:?}",
            table
        )));
    }

    Ok(format!("\"{}\"", table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_table() {
        assert_eq!(quote_table("Session-dev").unwrap(), "\"Session-dev\"");
        assert!(quote_table("").is_err());
        assert!(quote_table("a\"b").is_err());
        assert!(quote_table("a b").is_err());
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn, "Session-dev").unwrap();
        init_db(&conn, "Session-dev").unwrap();

        // Non-JSON documents are refused
        let err = conn.execute(
            "INSERT INTO \"Session-dev\" (id, item) VALUES ('a', 'not json')",
            [],
        );
        assert!(err.is_err());
    }
}
