pub mod sound;
pub mod webhook;

pub use sound::SoundNotifier;
pub use webhook::WebhookNotifier;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use tracing::{debug, error};

/// A detected change, as handed to notifiers.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub url: String,
    pub detected_at: DateTime<Local>,
    /// Rendered diff report, already truncated.
    pub report: String,
}

impl ChangeEvent {
    pub fn headline(&self) -> String {
        format!(
            "CHANGE DETECTED: {}",
            self.detected_at.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;
    async fn notify(&self, event: &ChangeEvent) -> Result<()>;
}

/// Fan-out over every configured notifier. Failures are logged and never
/// reach the caller.
#[derive(Default)]
pub struct Notifiers {
    sinks: Vec<Box<dyn Notifier>>,
}

impl Notifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notifier: impl Notifier + 'static) {
        self.sinks.push(Box::new(notifier));
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub async fn notify_all(&self, event: &ChangeEvent) {
        for sink in &self.sinks {
            match sink.notify(event).await {
                Ok(()) => debug!("Sent {} notification for {}", sink.name(), event.url),
                Err(e) => error!("Failed to send {} notification: {:#}", sink.name(), e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl Notifier for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn notify(&self, _event: &ChangeEvent) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Notifier for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn notify(&self, _event: &ChangeEvent) -> Result<()> {
            anyhow::bail!("speaker unplugged")
        }
    }

    fn event() -> ChangeEvent {
        ChangeEvent {
            url: "https://status.example.com".into(),
            detected_at: Local::now(),
            report: "Added:\n  + Outage\n".into(),
        }
    }

    #[test]
    fn failing_notifier_does_not_stop_the_others() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut notifiers = Notifiers::new();
        notifiers.push(Failing);
        notifiers.push(Counting(count.clone()));

        tokio_test::block_on(notifiers.notify_all(&event()));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn headline_carries_local_timestamp() {
        let headline = event().headline();
        assert!(headline.starts_with("CHANGE DETECTED: "));
        assert_eq!(headline.len(), "CHANGE DETECTED: 2024-01-15 14:32:07".len());
    }
}
