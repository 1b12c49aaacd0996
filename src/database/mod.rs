//! SQLite-backed reminder store
//!
//! Single database file, one `reminders` table. Thread-safe via an
//! internal `Mutex<Connection>`; the guard is never held across an
//! await point. Timestamps are stored as `%Y-%m-%d %H:%M:%S` UTC
//! strings, so SQL string comparison orders them chronologically.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, info};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::features::reminders::store::{
    NewReminder, Reminder, ReminderStatus, ReminderStore, TIMESTAMP_FORMAT,
};

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS reminders (
    id          TEXT PRIMARY KEY,
    owner       TEXT NOT NULL,
    text        TEXT NOT NULL,
    person      TEXT,
    due_at      TEXT NOT NULL,
    status      TEXT NOT NULL DEFAULT 'pending',
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_reminders_status_due ON reminders(status, due_at);
CREATE INDEX IF NOT EXISTS idx_reminders_owner ON reminders(owner);
";

/// Reminder persistence on SQLite.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file and apply the schema.
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        info!("Database ready at {path}");
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| anyhow!("database lock poisoned: {e}"))
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)?;
    Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
}

fn str_to_status(s: &str) -> ReminderStatus {
    match s {
        "resolved" => ReminderStatus::Resolved,
        _ => ReminderStatus::Pending,
    }
}

fn row_to_reminder(row: &rusqlite::Row<'_>) -> rusqlite::Result<Reminder> {
    let due_raw: String = row.get(4)?;
    let due_at = parse_timestamp(&due_raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, e.into())
    })?;
    let status_raw: String = row.get(5)?;
    Ok(Reminder {
        id: row.get(0)?,
        owner: row.get(1)?,
        text: row.get(2)?,
        person: row.get(3)?,
        due_at,
        status: str_to_status(&status_raw),
    })
}

const SELECT_COLUMNS: &str = "id, owner, text, person, due_at, status";

fn collect_reminders<I>(rows: I) -> Result<Vec<Reminder>>
where
    I: Iterator<Item = rusqlite::Result<Reminder>>,
{
    let mut reminders = Vec::new();
    for row in rows {
        reminders.push(row?);
    }
    Ok(reminders)
}

#[async_trait]
impl ReminderStore for Database {
    async fn create(&self, reminder: NewReminder) -> Result<Reminder> {
        let id = Uuid::new_v4().to_string();
        let now = format_timestamp(Utc::now());
        let due = format_timestamp(reminder.due_at);

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO reminders (id, owner, text, person, due_at, status, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6)",
            params![id, reminder.owner, reminder.text, reminder.person, due, now],
        )?;
        drop(conn);

        debug!("Created reminder {id} due at {due}");
        Ok(Reminder {
            id,
            owner: reminder.owner,
            text: reminder.text,
            person: reminder.person,
            // Seconds precision matches what was persisted.
            due_at: parse_timestamp(&due)?,
            status: ReminderStatus::Pending,
        })
    }

    async fn get(&self, id: &str) -> Result<Option<Reminder>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM reminders WHERE id = ?1"
        ))?;
        let mut found = collect_reminders(stmt.query_map(params![id], row_to_reminder)?)?;
        Ok(found.pop())
    }

    async fn resolve(&self, id: &str) -> Result<()> {
        let conn = self.lock()?;
        let rows = conn.execute(
            "UPDATE reminders SET status = 'resolved' WHERE id = ?1 AND status = 'pending'",
            params![id],
        )?;
        // Zero rows means already resolved or unknown; both are fine.
        if rows == 0 {
            debug!("Resolve of {id} was a no-op");
        }
        Ok(())
    }

    async fn query_due(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>> {
        let cutoff = format_timestamp(now);
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM reminders \
             WHERE status = 'pending' AND due_at <= ?1"
        ))?;
        let rows = collect_reminders(stmt.query_map(params![cutoff], row_to_reminder)?);
        rows
    }

    async fn query_active(&self, owner: &str, now: DateTime<Utc>) -> Result<Vec<Reminder>> {
        let cutoff = format_timestamp(now);
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM reminders \
             WHERE owner = ?1 AND status = 'pending' AND due_at > ?2 \
             ORDER BY due_at ASC"
        ))?;
        let rows = collect_reminders(stmt.query_map(params![owner, cutoff], row_to_reminder)?);
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::TempDir::new().expect("create temp dir");
        let path = dir.path().join("jarvis.db");
        let db = Database::new(path.to_str().expect("utf8 path")).expect("open database");
        (dir, db)
    }

    fn new_reminder(owner: &str, text: &str, due_at: DateTime<Utc>) -> NewReminder {
        NewReminder {
            owner: owner.to_string(),
            text: text.to_string(),
            person: None,
            due_at,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_roundtrip() {
        let (_dir, db) = test_db();
        let due = Utc::now() + Duration::minutes(10);

        let created = db
            .create(NewReminder {
                owner: "42".to_string(),
                text: "call Alex".to_string(),
                person: Some("Alex".to_string()),
                due_at: due,
            })
            .await
            .expect("create");

        let fetched = db.get(&created.id).await.expect("get").expect("found");
        assert_eq!(fetched.owner, "42");
        assert_eq!(fetched.text, "call Alex");
        assert_eq!(fetched.person.as_deref(), Some("Alex"));
        assert_eq!(fetched.status, ReminderStatus::Pending);
        // Stored at seconds precision.
        assert_eq!(fetched.due_at.timestamp(), due.timestamp());
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_none() {
        let (_dir, db) = test_db();
        assert!(db.get("missing").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn test_query_due_only_returns_past_pending() {
        let (_dir, db) = test_db();
        let now = Utc::now();

        let past = db
            .create(new_reminder("1", "overdue", now - Duration::minutes(5)))
            .await
            .unwrap();
        db.create(new_reminder("1", "future", now + Duration::minutes(5)))
            .await
            .unwrap();
        let resolved = db
            .create(new_reminder("1", "done already", now - Duration::minutes(5)))
            .await
            .unwrap();
        db.resolve(&resolved.id).await.unwrap();

        let due = db.query_due(now).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, past.id);
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let (_dir, db) = test_db();
        let reminder = db
            .create(new_reminder("1", "x", Utc::now()))
            .await
            .unwrap();

        db.resolve(&reminder.id).await.expect("first resolve");
        db.resolve(&reminder.id).await.expect("second resolve");
        db.resolve("never-existed").await.expect("unknown resolve");

        let row = db.get(&reminder.id).await.unwrap().unwrap();
        assert_eq!(row.status, ReminderStatus::Resolved);
    }

    #[tokio::test]
    async fn test_query_active_sorted_and_filtered() {
        let (_dir, db) = test_db();
        let now = Utc::now();

        let later = db
            .create(new_reminder("me", "later", now + Duration::hours(2)))
            .await
            .unwrap();
        let soon = db
            .create(new_reminder("me", "soon", now + Duration::minutes(10)))
            .await
            .unwrap();
        // Excluded: due in the past, someone else's, resolved.
        db.create(new_reminder("me", "past", now - Duration::minutes(1)))
            .await
            .unwrap();
        db.create(new_reminder("other", "not mine", now + Duration::hours(1)))
            .await
            .unwrap();
        let resolved = db
            .create(new_reminder("me", "resolved", now + Duration::hours(1)))
            .await
            .unwrap();
        db.resolve(&resolved.id).await.unwrap();

        let active = db.query_active("me", now).await.unwrap();
        let ids: Vec<&str> = active.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![soon.id.as_str(), later.id.as_str()]);
    }

    #[tokio::test]
    async fn test_query_active_empty_is_ok() {
        let (_dir, db) = test_db();
        let active = db.query_active("nobody", Utc::now()).await.unwrap();
        assert!(active.is_empty());
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("jarvis.db");
        let path_str = path.to_str().unwrap();

        let id = {
            let db = Database::new(path_str).unwrap();
            db.create(new_reminder("7", "persisted", Utc::now() + Duration::hours(1)))
                .await
                .unwrap()
                .id
        };

        let db = Database::new(path_str).unwrap();
        let row = db.get(&id).await.unwrap().expect("row survives reopen");
        assert_eq!(row.text, "persisted");
        assert_eq!(row.status, ReminderStatus::Pending);
    }
}
