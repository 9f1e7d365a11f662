//! Phone normalization and fixed-delay delivery retry.

use std::time::Duration;

use tracing::warn;

use crate::error::NotifierError;
use crate::transport::{SendReceipt, Transport};

/// Country code prefixed to national numbers.
pub const COUNTRY_CODE: &str = "55";

/// Retry policy for a single logical delivery.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum physical attempts per delivery.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Normalize a phone number into the transport-addressable form: digits
/// only, prefixed with the country code when absent.
///
/// Normalization is idempotent.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.starts_with(COUNTRY_CODE) {
        digits
    } else {
        format!("{}{}", COUNTRY_CODE, digits)
    }
}

/// Attempt a single logical delivery up to `policy.max_attempts` times,
/// waiting `policy.delay` between attempts.
///
/// Returns on the first success; after the last failure the underlying
/// transport error is surfaced as `DeliveryFailed`.
pub async fn send_with_retry<T: Transport + ?Sized>(
    transport: &T,
    phone: &str,
    body: &str,
    policy: &RetryPolicy,
) -> Result<SendReceipt, NotifierError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match transport.send_text(phone, body).await {
            Ok(receipt) => return Ok(receipt),
            Err(err) => {
                warn!(
                    attempt,
                    max = policy.max_attempts,
                    phone,
                    error = %err,
                    "Send attempt failed"
                );
                if attempt >= policy.max_attempts {
                    return Err(NotifierError::DeliveryFailed {
                        attempts: attempt,
                        source: err,
                    });
                }
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` calls, then succeeds.
    struct FlakyTransport {
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakyTransport {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for FlakyTransport {
        fn is_ready(&self) -> bool {
            true
        }

        async fn send_text(
            &self,
            _phone: &str,
            _body: &str,
        ) -> Result<SendReceipt, TransportError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(TransportError::Rejected("session dropped".to_string()))
            } else {
                Ok(SendReceipt::default())
            }
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(5),
        }
    }

    #[test]
    fn normalize_strips_formatting_and_prefixes_country_code() {
        assert_eq!(normalize_phone("+55 (11) 91234-5678"), "5511912345678");
        assert_eq!(normalize_phone("11912345678"), "5511912345678");
        assert_eq!(normalize_phone("(11) 3333-4444"), "551133334444");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize_phone("+55 (11) 91234-5678");
        assert_eq!(once.len(), 13);
        assert_eq!(normalize_phone(&once), once);
    }

    #[tokio::test]
    async fn retries_exactly_max_attempts_then_fails() {
        let transport = FlakyTransport::new(u32::MAX);
        let result =
            send_with_retry(&transport, "5511912345678", "Olá", &fast_policy()).await;

        assert_eq!(transport.calls(), 3);
        match result {
            Err(NotifierError::DeliveryFailed { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected DeliveryFailed, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn stops_on_first_success() {
        let transport = FlakyTransport::new(1);
        let result =
            send_with_retry(&transport, "5511912345678", "Olá", &fast_policy()).await;

        assert!(result.is_ok());
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn succeeds_immediately_without_delay() {
        let transport = FlakyTransport::new(0);
        send_with_retry(&transport, "5511912345678", "Olá", &fast_policy())
            .await
            .unwrap();
        assert_eq!(transport.calls(), 1);
    }
}
