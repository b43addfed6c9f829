//! SQLite operations behind `SessionStore::Db`.
//!
//! Attribute updates use `json_set` so the existing document keeps its
//! other fields (`createdAt`, `__typename`) and the write stays a single
//! statement. Reads and updates only match items whose `__typename` is
//! `Session` or absent (partial items from an upsert).

use super::SessionUpdate;
use crate::db::schema::quote_table;
use crate::db::Database;
use crate::error::Result;
use crate::session::Session;
use rusqlite::{params, OptionalExtension};

/// Matches session items and partial items; other entity kinds never match
const SESSION_KIND: &str = "COALESCE(json_extract(item, '$.__typename'), 'Session') = 'Session'";

pub(super) async fn put_item(db: &Database, table: &str, session: &Session) -> Result<()> {
    let sql = format!(
        "INSERT INTO {} (id, item) VALUES (?1, ?2)
         ON CONFLICT(id) DO UPDATE SET item = excluded.item",
        quote_table(table)?
    );
    let id = session.id.clone();
    let item = serde_json::to_string(session)?;

    db.with_conn(move |conn| conn.execute(&sql, params![id, item]))
        .await?;
    Ok(())
}

pub(super) async fn get_item(db: &Database, table: &str, id: &str) -> Result<Option<Session>> {
    let sql = format!(
        "SELECT item FROM {} WHERE id = ?1 AND {}",
        quote_table(table)?,
        SESSION_KIND
    );
    let id = id.to_string();

    let item: Option<String> = db
        .with_conn(move |conn| {
            conn.query_row(&sql, [&id], |row| row.get::<_, String>(0))
                .optional()
        })
        .await?;

    match item {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

pub(super) async fn upsert_attributes(
    db: &Database,
    table: &str,
    id: &str,
    update: &SessionUpdate,
) -> Result<bool> {
    let sql = format!(
        "INSERT INTO {} (id, item)
         VALUES (?1, json_object('id', ?1, 'userId', ?2, 'updatedAt', ?3))
         ON CONFLICT(id) DO UPDATE
         SET item = json_set(item, '$.userId', ?2, '$.updatedAt', ?3)
         WHERE {}",
        quote_table(table)?,
        SESSION_KIND
    );
    let id = id.to_string();
    let user_id = update.user_id.clone();
    let updated_at = update.updated_at.clone();

    let changed = db
        .with_conn(move |conn| conn.execute(&sql, params![id, user_id, updated_at]))
        .await?;
    Ok(changed > 0)
}

pub(super) async fn update_attributes(
    db: &Database,
    table: &str,
    id: &str,
    update: &SessionUpdate,
) -> Result<bool> {
    let sql = format!(
        "UPDATE {} SET item = json_set(item, '$.userId', ?2, '$.updatedAt', ?3)
         WHERE id = ?1 AND {}",
        quote_table(table)?,
        SESSION_KIND
    );
    let id = id.to_string();
    let user_id = update.user_id.clone();
    let updated_at = update.updated_at.clone();

    let changed = db
        .with_conn(move |conn| conn.execute(&sql, params![id, user_id, updated_at]))
        .await?;
    Ok(changed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const TABLE: &str = "Session-test";

    async fn raw_item(db: &Database, id: &str) -> Option<String> {
        let sql = format!("SELECT item FROM {} WHERE id = ?1", quote_table(TABLE).unwrap());
        let id = id.to_string();
        db.with_conn(move |conn| {
            conn.query_row(&sql, [&id], |row| row.get::<_, String>(0))
                .optional()
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_foreign_item_is_not_rewritten() {
        let db = Database::open_in_memory(TABLE).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut cart = Session::new("c1".to_string(), Some("u1".to_string()), now);
        cart.typename = Some("Cart".to_string());
        put_item(&db, TABLE, &cart).await.unwrap();
        let before = raw_item(&db, "c1").await;

        let update = SessionUpdate {
            user_id: Some("u2".to_string()),
            updated_at: "2024-05-01T12:00:09.000Z".to_string(),
        };
        assert!(!upsert_attributes(&db, TABLE, "c1", &update).await.unwrap());
        assert!(!update_attributes(&db, TABLE, "c1", &update).await.unwrap());

        assert_eq!(raw_item(&db, "c1").await, before);
        assert_eq!(get_item(&db, TABLE, "c1").await.unwrap(), None);
    }
}
