//! Error types for the notifier.

use thiserror::Error;

use crate::transport::TransportError;

/// Errors that can occur while dispatching notifications.
#[derive(Debug, Error)]
pub enum NotifierError {
    /// The transport session is absent or disconnected; sends fail fast.
    #[error("transport session is not connected")]
    TransportNotReady,

    /// All retry attempts for a single message were exhausted.
    #[error("delivery failed after {attempts} attempts")]
    DeliveryFailed {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// The referenced recipient no longer exists.
    #[error("recipient {kind} {id} not found")]
    RecipientNotFound { kind: &'static str, id: String },

    /// Persistence failure.
    #[error("database error: {0}")]
    Database(#[from] database::DatabaseError),
}
