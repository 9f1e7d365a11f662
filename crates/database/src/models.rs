//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Member status values. Kept in Portuguese as the rest of the system
/// presents them.
pub mod member_status {
    pub const ACTIVE: &str = "ativo";
    pub const INACTIVE: &str = "inativo";
    pub const VISITOR: &str = "visitante";
}

/// A church member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Member {
    /// Generated UUID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// National phone number, digits only.
    pub phone: String,
    /// Birthday as "YYYY-MM-DD", if known.
    pub birthday: Option<String>,
    /// Membership status ("ativo", "inativo", "visitante").
    pub status: String,
    /// Last recorded presence, if any.
    pub last_attendance: Option<String>,
    /// Consecutive recorded absences.
    pub consecutive_absences: i64,
    /// Whether the member opted in to WhatsApp notifications.
    pub notify_whatsapp: bool,
    /// Whether the member opted in to email notifications.
    pub notify_email: bool,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// Fields for creating a member.
#[derive(Debug, Clone, Default)]
pub struct NewMember {
    pub name: String,
    pub phone: String,
    pub birthday: Option<String>,
    /// Defaults to "ativo" when empty.
    pub status: Option<String>,
    pub notify_whatsapp: bool,
    pub notify_email: bool,
    pub notes: Option<String>,
}

impl NewMember {
    /// Create a new member record with default preferences (WhatsApp on).
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            notify_whatsapp: true,
            ..Default::default()
        }
    }
}

/// One attendance record for a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AttendanceRecord {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Member this record belongs to.
    pub member_id: String,
    /// Service date.
    pub date: String,
    /// Present or absent.
    pub present: bool,
    /// Who recorded it, if known.
    pub recorded_by: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

/// A visitor contact, tracked before becoming a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Contact {
    /// Generated UUID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// National phone number, digits only.
    pub phone: String,
    /// Who is following up with this contact.
    pub owner: Option<String>,
    /// Birthday as "YYYY-MM-DD", if known.
    pub birthday: Option<String>,
    /// Follow-up status (starts as "novo").
    pub status: String,
    /// Whether a welcome message has been sent.
    pub received_message: bool,
    /// Creation timestamp.
    pub created_at: String,
}

/// Fields for creating a contact.
#[derive(Debug, Clone, Default)]
pub struct NewContact {
    pub name: String,
    pub phone: String,
    pub owner: Option<String>,
    pub birthday: Option<String>,
}

/// Lifecycle state of a dispatched message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageState {
    Queued,
    Sent,
    Delivered,
    Read,
    Failed,
}

impl MessageState {
    /// Column value for this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageState::Queued => "queued",
            MessageState::Sent => "sent",
            MessageState::Delivered => "delivered",
            MessageState::Read => "read",
            MessageState::Failed => "failed",
        }
    }

    /// Parse a column value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "queued" => Some(MessageState::Queued),
            "sent" => Some(MessageState::Sent),
            "delivered" => Some(MessageState::Delivered),
            "read" => Some(MessageState::Read),
            "failed" => Some(MessageState::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for MessageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracking record for one dispatched message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct MessageStatus {
    /// Audit log entry id written just before the send.
    pub message_id: String,
    /// Recipient entity id.
    pub recipient_id: String,
    /// Recipient entity kind ("member" or "contact").
    pub recipient_kind: String,
    /// Normalized destination phone (country code prefixed).
    pub phone: String,
    /// The rendered message text, kept for retries.
    pub body: String,
    /// Lifecycle status.
    pub status: String,
    /// Gateway message id, set once the send succeeds.
    pub transport_id: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
    /// Set on transition to sent.
    pub sent_at: Option<String>,
    /// Set on transition to delivered.
    pub delivered_at: Option<String>,
    /// Set on transition to read.
    pub read_at: Option<String>,
}

impl MessageStatus {
    /// The typed lifecycle state, if the stored value is recognized.
    pub fn state(&self) -> Option<MessageState> {
        MessageState::parse(&self.status)
    }
}

/// Fields for creating a message status record.
#[derive(Debug, Clone)]
pub struct NewMessageStatus {
    pub message_id: String,
    pub recipient_id: String,
    pub recipient_kind: String,
    pub phone: String,
    pub body: String,
}

/// One audit log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LogEntry {
    /// Generated UUID.
    pub id: String,
    /// Entry kind ("message", "system", "create", ...).
    pub kind: String,
    /// Action identifier ("send_whatsapp", "message_sent", ...).
    pub action: String,
    /// Severity ("info", "warning", "error", "critical").
    pub level: String,
    /// Emitting subsystem.
    pub source: String,
    /// Human-readable description.
    pub description: String,
    /// Acting user, "system" for background jobs.
    pub username: String,
    /// JSON payload with extra fields, if any.
    pub details: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

/// Fields for appending a log entry.
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub kind: String,
    pub action: String,
    pub level: String,
    pub source: String,
    pub description: String,
    pub username: String,
    pub details: Option<serde_json::Value>,
}

impl NewLogEntry {
    /// Create an entry with the defaults background jobs use.
    pub fn new(kind: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            action: action.into(),
            level: "info".to_string(),
            source: "system".to_string(),
            description: String::new(),
            username: "system".to_string(),
            details: None,
        }
    }

    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}
