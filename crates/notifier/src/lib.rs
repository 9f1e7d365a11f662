//! WhatsApp notification dispatch for Rebanho.
//!
//! The notifier decides who to message, renders the message body, hands
//! delivery to a [`Transport`], and tracks every dispatch in the message
//! status store. Batch jobs are partial-failure tolerant: one bad number
//! never stops the rest of a run.
//!
//! # Example
//!
//! ```no_run
//! use database::Database;
//! use notifier::{Notifier, NotifierConfig};
//! use wa_gateway::{GatewayClient, GatewayConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("sqlite:rebanho.db?mode=rwc").await?;
//! db.migrate().await?;
//! let client = GatewayClient::connect(GatewayConfig::default()).await?;
//!
//! let notifier = Notifier::with_defaults(db, client);
//! notifier.notify_absent_members().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod recipient;
pub mod retry;
pub mod template;
pub mod transport;

pub use error::NotifierError;
pub use recipient::{Recipient, RecipientRef};
pub use retry::{normalize_phone, send_with_retry, RetryPolicy};
pub use transport::{NoOpTransport, SendReceipt, Transport, TransportError};

use database::{log, member, message_status, Database};
use database::models::{MessageState, NewLogEntry, NewMessageStatus};
use tracing::{debug, error, info, warn};
use wa_gateway::MessageAck;

/// Why a message is being sent. Audit-only; it never changes delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Operator-initiated message.
    Custom,
    /// Weekly absence follow-up.
    Absence,
    /// Hourly retry of a pending dispatch.
    Retry,
}

impl MessageKind {
    /// Tag written into audit log details.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Custom => "custom",
            MessageKind::Absence => "absence",
            MessageKind::Retry => "retry",
        }
    }
}

/// Configuration for the notifier.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Days without attendance before a member counts as absent.
    pub absence_threshold_days: i64,
    /// Maximum pending records processed per retry run.
    pub retry_batch_size: i64,
    /// Per-message delivery retry policy.
    pub retry: RetryPolicy,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            absence_threshold_days: 14,
            retry_batch_size: 10,
            retry: RetryPolicy::default(),
        }
    }
}

/// Result of a successful dispatch.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    /// The audit log id the dispatch is tracked under.
    pub message_id: String,
    /// The transport's receipt.
    pub receipt: SendReceipt,
}

/// The notification dispatcher.
///
/// Generic over the transport so tests can inject fakes; production wires
/// in a `GatewayClient`.
pub struct Notifier<T: Transport> {
    db: Database,
    transport: T,
    config: NotifierConfig,
}

impl<T: Transport> Notifier<T> {
    /// Create a new notifier.
    pub fn new(db: Database, transport: T, config: NotifierConfig) -> Self {
        Self {
            db,
            transport,
            config,
        }
    }

    /// Create a notifier with default configuration.
    pub fn with_defaults(db: Database, transport: T) -> Self {
        Self::new(db, transport, NotifierConfig::default())
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a reference to the database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Send one message to one recipient, tracking it end to end.
    ///
    /// Writes the pre-send audit entry and the `queued` status record
    /// before touching the transport, then marks the record `sent` on
    /// success. On failure the record intentionally stays `queued` so the
    /// hourly retry job will pick it up.
    pub async fn send_message(
        &self,
        recipient: &Recipient,
        body: &str,
        kind: MessageKind,
    ) -> Result<SendOutcome, NotifierError> {
        if !self.transport.is_ready() {
            return Err(NotifierError::TransportNotReady);
        }

        let pool = self.db.pool();
        let phone = retry::normalize_phone(&recipient.phone);

        let message_id = log::append(
            pool,
            &NewLogEntry::new("message", "send_whatsapp")
                .source("whatsapp")
                .description(format!("Sending message to {}", recipient.name))
                .details(serde_json::json!({
                    "messageType": kind.as_str(),
                    "name": recipient.name,
                    "phone": phone,
                    "messageLength": body.len(),
                })),
        )
        .await?;

        message_status::create(
            pool,
            &NewMessageStatus {
                message_id: message_id.clone(),
                recipient_id: recipient.reference.id().to_string(),
                recipient_kind: recipient.reference.kind().to_string(),
                phone: phone.clone(),
                body: body.to_string(),
            },
        )
        .await?;

        match send_with_retry(&self.transport, &phone, body, &self.config.retry).await {
            Ok(receipt) => {
                message_status::mark_sent(pool, &message_id, receipt.id.as_deref()).await?;
                log::event(
                    pool,
                    "message_sent",
                    "info",
                    &format!("Message sent to {}", recipient.name),
                )
                .await?;
                info!(recipient = %recipient.name, %message_id, "Message sent");
                Ok(SendOutcome {
                    message_id,
                    receipt,
                })
            }
            Err(err) => {
                let details = serde_json::json!({
                    "recipientName": recipient.name,
                    "recipientPhone": recipient.phone,
                    "messageType": kind.as_str(),
                });
                if let Err(log_err) =
                    log::error(pool, "send_whatsapp_failed", &err.to_string(), details).await
                {
                    error!(error = %log_err, "Failed to write audit entry for failed send");
                }
                Err(err)
            }
        }
    }

    /// Message every active member who has not attended within the
    /// threshold and opted in to WhatsApp notifications.
    ///
    /// Per-member failures are logged and skipped.
    pub async fn notify_absent_members(&self) -> Result<(), NotifierError> {
        let members =
            member::find_absent_notifiable(self.db.pool(), self.config.absence_threshold_days)
                .await?;

        info!(count = members.len(), "Notifying absent members");

        for m in &members {
            let recipient = Recipient::from(m);
            let body = template::absence_message(&m.name);
            if let Err(err) = self.send_message(&recipient, &body, MessageKind::Absence).await {
                error!(member = %m.name, error = %err, "Failed to notify absent member");
            }
        }

        Ok(())
    }

    /// Re-send up to `retry_batch_size` pending dispatches, oldest first.
    ///
    /// Records whose recipient no longer exists are skipped. A successful
    /// resend resolves the original record as well, so it stops showing
    /// up as pending.
    pub async fn retry_failed_messages(&self) -> Result<(), NotifierError> {
        let pool = self.db.pool();
        let pending = message_status::find_pending(pool, self.config.retry_batch_size).await?;
        if pending.is_empty() {
            return Ok(());
        }

        info!(count = pending.len(), "Retrying pending messages");

        for record in &pending {
            let Some(reference) =
                RecipientRef::from_kind(&record.recipient_kind, &record.recipient_id)
            else {
                warn!(
                    message_id = %record.message_id,
                    kind = %record.recipient_kind,
                    "Skipping record with unknown recipient kind"
                );
                continue;
            };

            let recipient = match reference.resolve(pool).await {
                Ok(recipient) => recipient,
                Err(NotifierError::RecipientNotFound { kind, id }) => {
                    debug!(
                        message_id = %record.message_id,
                        kind,
                        id = %id,
                        "Recipient no longer exists, skipping"
                    );
                    continue;
                }
                Err(err) => {
                    error!(message_id = %record.message_id, error = %err, "Failed to resolve recipient");
                    continue;
                }
            };

            match self
                .send_message(&recipient, &record.body, MessageKind::Retry)
                .await
            {
                Ok(outcome) => {
                    if let Err(err) = message_status::mark_sent(
                        pool,
                        &record.message_id,
                        outcome.receipt.id.as_deref(),
                    )
                    .await
                    {
                        error!(message_id = %record.message_id, error = %err, "Failed to resolve retried record");
                    }
                }
                Err(err) => {
                    error!(message_id = %record.message_id, error = %err, "Retry failed");
                }
            }
        }

        Ok(())
    }

    /// Apply a delivery receipt from the gateway.
    ///
    /// Level 1 marks the message delivered, level 2 read; anything else
    /// carries no lifecycle transition.
    pub async fn record_ack(&self, ack: &MessageAck) -> Result<(), NotifierError> {
        let state = match ack.ack {
            1 => MessageState::Delivered,
            2 => MessageState::Read,
            _ => return Ok(()),
        };

        let applied = message_status::record_ack(self.db.pool(), &ack.id, state).await?;
        if applied {
            debug!(id = %ack.id, state = %state, "Delivery receipt recorded");
        }
        Ok(())
    }
}
