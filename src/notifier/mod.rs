// file: src/notifier/mod.rs
// description: chat delivery trait and the bounded webhook retry loop
// reference: internal module structure

pub mod console;
pub mod teams;

pub use console::ConsoleNotifier;
pub use teams::TeamsNotifier;

use crate::config::WebhookConfig;
use crate::error::Result;
use crate::models::MessageBatch;
use async_trait::async_trait;
use std::time::Duration;
use tokio_retry::Retry;
use tokio_retry::strategy::FixedInterval;
use tracing::{error, warn};

#[async_trait]
pub trait ChatNotifier: Send + Sync {
    /// One delivery attempt.
    async fn post(&self, batch: &MessageBatch) -> Result<()>;
}

#[derive(Debug, Clone, Copy)]
pub struct DeliveryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl From<&WebhookConfig> for DeliveryPolicy {
    fn from(config: &WebhookConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: config.retry_delay(),
        }
    }
}

/// Posts `batch`, retrying with a fixed delay. Returns false once every
/// attempt has failed; the caller keeps going either way.
pub async fn deliver_with_retry<N>(notifier: &N, batch: &MessageBatch, policy: DeliveryPolicy) -> bool
where
    N: ChatNotifier + ?Sized,
{
    let max_attempts = policy.max_attempts.max(1);
    let strategy = FixedInterval::new(policy.delay).take(max_attempts as usize - 1);

    let mut attempt = 0;
    let result = Retry::spawn(strategy, || {
        attempt += 1;
        let current = attempt;
        async move {
            let posted = notifier.post(batch).await;
            if let (Err(e), true) = (&posted, current < max_attempts) {
                warn!(
                    "Webhook failed: {}. Retrying in {}s ({}/{})",
                    e,
                    policy.delay.as_secs(),
                    current,
                    max_attempts
                );
            }
            posted
        }
    })
    .await;

    match result {
        Ok(()) => true,
        Err(e) => {
            error!(
                "Giving up on message {} for query '{}' after {} attempts: {}",
                batch.message_count, batch.query, max_attempts, e
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use std::sync::Mutex;

    struct FlakyNotifier {
        failures_left: Mutex<u32>,
        calls: Mutex<u32>,
    }

    impl FlakyNotifier {
        fn failing(times: u32) -> Self {
            Self {
                failures_left: Mutex::new(times),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ChatNotifier for FlakyNotifier {
        async fn post(&self, _batch: &MessageBatch) -> Result<()> {
            *self.calls.lock().unwrap() += 1;
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(PipelineError::Webhook("HTTP 500".to_string()));
            }
            Ok(())
        }
    }

    fn batch() -> MessageBatch {
        MessageBatch {
            query: "asthma".to_string(),
            search_date: "2024/05/01".to_string(),
            message_count: 1,
            entries: vec![],
        }
    }

    fn policy() -> DeliveryPolicy {
        DeliveryPolicy {
            max_attempts: 3,
            delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_first_attempt_succeeds() {
        let notifier = FlakyNotifier::failing(0);
        assert!(deliver_with_retry(&notifier, &batch(), policy()).await);
        assert_eq!(notifier.calls(), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_failures() {
        let notifier = FlakyNotifier::failing(2);
        assert!(deliver_with_retry(&notifier, &batch(), policy()).await);
        assert_eq!(notifier.calls(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_three_failures() {
        let notifier = FlakyNotifier::failing(5);
        assert!(!deliver_with_retry(&notifier, &batch(), policy()).await);
        assert_eq!(notifier.calls(), 3);
    }

    #[tokio::test]
    async fn test_single_attempt_policy_does_not_retry() {
        let notifier = FlakyNotifier::failing(1);
        let once = DeliveryPolicy {
            max_attempts: 1,
            delay: Duration::ZERO,
        };
        assert!(!deliver_with_retry(&notifier, &batch(), once).await);
        assert_eq!(notifier.calls(), 1);
    }

    #[test]
    fn test_policy_from_config() {
        let policy = DeliveryPolicy::from(&WebhookConfig::default());
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(10));
    }
}
