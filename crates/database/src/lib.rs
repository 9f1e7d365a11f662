//! SQLite persistence layer for Rebanho.
//!
//! This crate provides async database operations for members, contacts,
//! message tracking, and the audit log using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{member, models::NewMember, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:rebanho.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Create a member
//!     let maria = member::create_member(
//!         db.pool(),
//!         &NewMember::new("Maria Souza", "+55 (11) 91234-5678"),
//!     )
//!     .await?;
//!     println!("created {}", maria.id);
//!
//!     Ok(())
//! }
//! ```

pub mod contact;
pub mod error;
pub mod log;
pub mod member;
pub mod message_status;
pub mod models;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use models::{
    AttendanceRecord, Contact, LogEntry, Member, MessageState, MessageStatus, NewContact,
    NewLogEntry, NewMember, NewMessageStatus,
};
pub use validation::ValidationError;

// Re-exported so dependents can hold pool references without a direct
// sqlx dependency.
pub use sqlx::SqlitePool;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist,
    /// or `sqlite::memory:` for tests.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to database: {} (pool size: {})", url, pool_size);

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is
    /// up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use models::member_status;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    async fn add_member(db: &Database, name: &str, phone: &str) -> Member {
        member::create_member(db.pool(), &NewMember::new(name, phone))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_member_crud() {
        let db = test_db().await;

        // Create: phone is cleaned to the national number
        let created = add_member(&db, "Maria Souza", "+55 (11) 91234-5678").await;
        assert_eq!(created.phone, "11912345678");
        assert_eq!(created.status, member_status::ACTIVE);
        assert!(created.notify_whatsapp);

        // Read
        let fetched = member::get_member(db.pool(), &created.id).await.unwrap();
        assert_eq!(fetched.name, "Maria Souza");

        // Duplicate phone is rejected
        let dup = member::create_member(db.pool(), &NewMember::new("Outra", "11912345678")).await;
        assert!(matches!(dup, Err(DatabaseError::AlreadyExists { .. })));

        // Update
        let updated = Member {
            notify_whatsapp: false,
            ..fetched.clone()
        };
        member::update_member(db.pool(), &updated).await.unwrap();
        let fetched = member::get_member(db.pool(), &created.id).await.unwrap();
        assert!(!fetched.notify_whatsapp);

        // List
        let members = member::list_members(db.pool()).await.unwrap();
        assert_eq!(members.len(), 1);

        // Delete
        member::delete_member(db.pool(), &created.id).await.unwrap();
        let result = member::get_member(db.pool(), &created.id).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_attendance_updates_member() {
        let db = test_db().await;
        let m = add_member(&db, "João Lima", "11988887777").await;
        assert!(m.last_attendance.is_none());

        member::record_attendance(db.pool(), &m.id, None, true, Some("secretaria"))
            .await
            .unwrap();
        let m = member::get_member(db.pool(), &m.id).await.unwrap();
        assert!(m.last_attendance.is_some());
        assert_eq!(m.consecutive_absences, 0);

        member::record_attendance(db.pool(), &m.id, None, false, None)
            .await
            .unwrap();
        let m = member::get_member(db.pool(), &m.id).await.unwrap();
        assert_eq!(m.consecutive_absences, 1);

        let history = member::list_attendance(db.pool(), &m.id).await.unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_absent_queries() {
        let db = test_db().await;

        // Seen 18 days ago: absent
        let stale = add_member(&db, "Ausente", "11911111111").await;
        member::record_attendance(
            db.pool(),
            &stale.id,
            Some(Utc::now() - Duration::days(18)),
            true,
            None,
        )
        .await
        .unwrap();

        // Seen 10 days ago: not absent
        let recent = add_member(&db, "Presente", "11922222222").await;
        member::record_attendance(
            db.pool(),
            &recent.id,
            Some(Utc::now() - Duration::days(10)),
            true,
            None,
        )
        .await
        .unwrap();

        // Never seen: absent on the dashboard, not notifiable
        let never = add_member(&db, "Visitou Nunca", "11933333333").await;

        let absent = member::find_absent(db.pool(), 14).await.unwrap();
        let ids: Vec<_> = absent.iter().map(|m| m.id.as_str()).collect();
        assert!(ids.contains(&stale.id.as_str()));
        assert!(ids.contains(&never.id.as_str()));
        assert!(!ids.contains(&recent.id.as_str()));

        let notifiable = member::find_absent_notifiable(db.pool(), 14).await.unwrap();
        let ids: Vec<_> = notifiable.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec![stale.id.as_str()]);
    }

    #[tokio::test]
    async fn test_notifiable_respects_opt_out_and_status() {
        let db = test_db().await;
        let eighteen_days_ago = Some(Utc::now() - Duration::days(18));

        let opted_out = add_member(&db, "Sem WhatsApp", "11911111111").await;
        member::record_attendance(db.pool(), &opted_out.id, eighteen_days_ago, true, None)
            .await
            .unwrap();
        let mut m = member::get_member(db.pool(), &opted_out.id).await.unwrap();
        m.notify_whatsapp = false;
        member::update_member(db.pool(), &m).await.unwrap();

        let inactive = add_member(&db, "Inativo", "11922222222").await;
        member::record_attendance(db.pool(), &inactive.id, eighteen_days_ago, true, None)
            .await
            .unwrap();
        let mut m = member::get_member(db.pool(), &inactive.id).await.unwrap();
        m.status = member_status::INACTIVE.to_string();
        member::update_member(db.pool(), &m).await.unwrap();

        let notifiable = member::find_absent_notifiable(db.pool(), 14).await.unwrap();
        assert!(notifiable.is_empty());
    }

    #[tokio::test]
    async fn test_contact_crud() {
        let db = test_db().await;

        let contact = contact::create_contact(
            db.pool(),
            &NewContact {
                name: "Pedro Visita".to_string(),
                phone: "(11) 95555-4444".to_string(),
                owner: Some("ana".to_string()),
                birthday: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(contact.status, contact::STATUS_NEW);
        assert_eq!(contact.phone, "11955554444");
        assert!(!contact.received_message);

        contact::mark_received(db.pool(), &contact.id).await.unwrap();
        contact::update_contact_status(db.pool(), &contact.id, "acompanhamento")
            .await
            .unwrap();

        let fetched = contact::get_contact(db.pool(), &contact.id).await.unwrap();
        assert!(fetched.received_message);
        assert_eq!(fetched.status, "acompanhamento");

        contact::delete_contact(db.pool(), &contact.id).await.unwrap();
        assert!(contact::list_contacts(db.pool()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_message_status_lifecycle() {
        let db = test_db().await;

        let new = NewMessageStatus {
            message_id: "log-1".to_string(),
            recipient_id: "member-1".to_string(),
            recipient_kind: "member".to_string(),
            phone: "5511912345678".to_string(),
            body: "Olá!".to_string(),
        };
        message_status::create(db.pool(), &new).await.unwrap();

        let record = message_status::get(db.pool(), "log-1").await.unwrap();
        assert_eq!(record.state(), Some(MessageState::Queued));
        assert!(record.sent_at.is_none());

        message_status::mark_sent(db.pool(), "log-1", Some("wa-msg-9"))
            .await
            .unwrap();
        let record = message_status::get(db.pool(), "log-1").await.unwrap();
        assert_eq!(record.state(), Some(MessageState::Sent));
        assert!(record.sent_at.is_some());
        assert_eq!(record.transport_id.as_deref(), Some("wa-msg-9"));

        // Receipt path resolves by transport id
        let applied = message_status::record_ack(db.pool(), "wa-msg-9", MessageState::Read)
            .await
            .unwrap();
        assert!(applied);
        let record = message_status::get(db.pool(), "log-1").await.unwrap();
        assert_eq!(record.state(), Some(MessageState::Read));
        assert!(record.read_at.is_some());

        // Unknown receipts are ignored
        let applied = message_status::record_ack(db.pool(), "wa-msg-0", MessageState::Delivered)
            .await
            .unwrap();
        assert!(!applied);
    }

    #[tokio::test]
    async fn test_find_pending_limits_and_excludes_terminal() {
        let db = test_db().await;

        for i in 0..12 {
            message_status::create(
                db.pool(),
                &NewMessageStatus {
                    message_id: format!("log-{:02}", i),
                    recipient_id: "member-1".to_string(),
                    recipient_kind: "member".to_string(),
                    phone: "5511912345678".to_string(),
                    body: "Olá!".to_string(),
                },
            )
            .await
            .unwrap();
        }
        message_status::mark_sent(db.pool(), "log-00", None).await.unwrap();

        let pending = message_status::find_pending(db.pool(), 10).await.unwrap();
        assert_eq!(pending.len(), 10);
        assert!(pending.iter().all(|r| r.status == "queued"));
        // Oldest first, deterministic tie-break on id
        assert_eq!(pending[0].message_id, "log-01");
    }

    #[tokio::test]
    async fn test_failed_records_stay_pending() {
        let db = test_db().await;

        message_status::create(
            db.pool(),
            &NewMessageStatus {
                message_id: "log-1".to_string(),
                recipient_id: "member-1".to_string(),
                recipient_kind: "member".to_string(),
                phone: "5511912345678".to_string(),
                body: "Olá!".to_string(),
            },
        )
        .await
        .unwrap();

        message_status::update_status(db.pool(), "log-1", MessageState::Failed)
            .await
            .unwrap();
        let record = message_status::get(db.pool(), "log-1").await.unwrap();
        assert_eq!(record.state(), Some(MessageState::Failed));
        // Failed is not terminal for the retry query
        let pending = message_status::find_pending(db.pool(), 10).await.unwrap();
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn test_log_append_and_query() {
        let db = test_db().await;

        let id = log::append(
            db.pool(),
            &NewLogEntry::new("message", "send_whatsapp")
                .source("whatsapp")
                .description("Sending message to Maria")
                .details(serde_json::json!({ "messageLength": 42 })),
        )
        .await
        .unwrap();
        assert!(!id.is_empty());

        log::event(db.pool(), "message_sent", "info", "Message sent to Maria")
            .await
            .unwrap();

        let entries = log::find_by_action(db.pool(), "send_whatsapp").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].username, "system");
        assert!(entries[0].details.as_deref().unwrap().contains("messageLength"));

        let recent = log::list_recent(db.pool(), 10).await.unwrap();
        assert_eq!(recent.len(), 2);
    }
}
