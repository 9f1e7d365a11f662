//! Append-only audit log.
//!
//! Background jobs write here; admin dashboards read. Entries are never
//! updated or deleted.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{LogEntry, NewLogEntry};

/// Append an entry to the log and return its generated id.
pub async fn append(pool: &SqlitePool, entry: &NewLogEntry) -> Result<String> {
    let id = Uuid::new_v4().to_string();
    let details = entry.details.as_ref().map(|d| d.to_string());

    sqlx::query(
        r#"
        INSERT INTO logs (id, kind, action, level, source, description, username, details)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&entry.kind)
    .bind(&entry.action)
    .bind(&entry.level)
    .bind(&entry.source)
    .bind(&entry.description)
    .bind(&entry.username)
    .bind(&details)
    .execute(pool)
    .await?;

    Ok(id)
}

/// Append a simple system event.
pub async fn event(
    pool: &SqlitePool,
    action: &str,
    level: &str,
    description: &str,
) -> Result<String> {
    append(
        pool,
        &NewLogEntry::new("system", action)
            .level(level)
            .source("whatsapp")
            .description(description),
    )
    .await
}

/// Append an error event with a structured payload.
pub async fn error(
    pool: &SqlitePool,
    action: &str,
    description: &str,
    details: serde_json::Value,
) -> Result<String> {
    append(
        pool,
        &NewLogEntry::new("system", action)
            .level("error")
            .source("whatsapp")
            .description(description)
            .details(details),
    )
    .await
}

/// Find entries by action, most recent first.
pub async fn find_by_action(pool: &SqlitePool, action: &str) -> Result<Vec<LogEntry>> {
    let entries = sqlx::query_as::<_, LogEntry>(
        r#"
        SELECT id, kind, action, level, source, description, username, details, created_at
        FROM logs
        WHERE action = ?
        ORDER BY created_at DESC, id
        "#,
    )
    .bind(action)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

/// List the most recent entries.
pub async fn list_recent(pool: &SqlitePool, limit: i64) -> Result<Vec<LogEntry>> {
    let entries = sqlx::query_as::<_, LogEntry>(
        r#"
        SELECT id, kind, action, level, source, description, username, details, created_at
        FROM logs
        ORDER BY created_at DESC, id
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}
