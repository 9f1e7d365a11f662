//! Message status tracking.
//!
//! One record per dispatched WhatsApp message. Records are created as
//! `queued`, transitioned forward by the notifier, and never deleted —
//! the table doubles as the dispatch history.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{MessageState, MessageStatus, NewMessageStatus};

const STATUS_COLUMNS: &str = "message_id, recipient_id, recipient_kind, phone, body, status, \
     transport_id, created_at, sent_at, delivered_at, read_at";

/// Create a new tracking record with status `queued`.
pub async fn create(pool: &SqlitePool, new: &NewMessageStatus) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO message_status (message_id, recipient_id, recipient_kind, phone, body)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&new.message_id)
    .bind(&new.recipient_id)
    .bind(&new.recipient_kind)
    .bind(&new.phone)
    .bind(&new.body)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "MessageStatus",
                    id: new.message_id.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Get a tracking record by message id.
pub async fn get(pool: &SqlitePool, message_id: &str) -> Result<MessageStatus> {
    sqlx::query_as::<_, MessageStatus>(&format!(
        "SELECT {STATUS_COLUMNS} FROM message_status WHERE message_id = ?"
    ))
    .bind(message_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "MessageStatus",
        id: message_id.to_string(),
    })
}

/// Transition a record to a new state, stamping the matching timestamp
/// column.
pub async fn update_status(
    pool: &SqlitePool,
    message_id: &str,
    state: MessageState,
) -> Result<()> {
    let timestamp_column = match state {
        MessageState::Sent => Some("sent_at"),
        MessageState::Delivered => Some("delivered_at"),
        MessageState::Read => Some("read_at"),
        MessageState::Queued | MessageState::Failed => None,
    };

    let sql = match timestamp_column {
        Some(column) => format!(
            "UPDATE message_status SET status = ?, {column} = datetime('now') WHERE message_id = ?"
        ),
        None => "UPDATE message_status SET status = ? WHERE message_id = ?".to_string(),
    };

    let result = sqlx::query(&sql)
        .bind(state.as_str())
        .bind(message_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "MessageStatus",
            id: message_id.to_string(),
        });
    }

    Ok(())
}

/// Mark a record as sent and remember the gateway message id so delivery
/// receipts can find it later.
pub async fn mark_sent(
    pool: &SqlitePool,
    message_id: &str,
    transport_id: Option<&str>,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE message_status
        SET status = 'sent', sent_at = datetime('now'), transport_id = ?
        WHERE message_id = ?
        "#,
    )
    .bind(transport_id)
    .bind(message_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "MessageStatus",
            id: message_id.to_string(),
        });
    }

    Ok(())
}

/// Apply a delivery receipt by gateway message id.
///
/// Receipts for unknown ids are ignored: the record may predate the
/// transport-id column or belong to a message sent outside this system.
pub async fn record_ack(
    pool: &SqlitePool,
    transport_id: &str,
    state: MessageState,
) -> Result<bool> {
    let timestamp_column = match state {
        MessageState::Delivered => "delivered_at",
        MessageState::Read => "read_at",
        // Only receipt-driven states are applied through this path.
        _ => return Ok(false),
    };

    let sql = format!(
        "UPDATE message_status SET status = ?, {timestamp_column} = datetime('now') \
         WHERE transport_id = ?"
    );

    let result = sqlx::query(&sql)
        .bind(state.as_str())
        .bind(transport_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Find up to `limit` records still awaiting delivery (queued or failed),
/// oldest first.
pub async fn find_pending(pool: &SqlitePool, limit: i64) -> Result<Vec<MessageStatus>> {
    let records = sqlx::query_as::<_, MessageStatus>(&format!(
        r#"
        SELECT {STATUS_COLUMNS}
        FROM message_status
        WHERE status IN ('queued', 'failed')
        ORDER BY created_at, message_id
        LIMIT ?
        "#
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// Count records grouped by status, for dashboards.
pub async fn count_by_status(pool: &SqlitePool) -> Result<Vec<(String, i64)>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT status, COUNT(*) as count
        FROM message_status
        GROUP BY status
        ORDER BY count DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
