//! In-memory [`Notifier`] that records every message in an outbox.
//!
//! Used by tests and by embedders without a mail gateway. Delivery can be
//! made to fail for all recipients or for specific ones.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use healthins_core::Notifier;
use parking_lot::Mutex;

/// One message accepted by the outbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Default)]
pub struct OutboxNotifier {
    sent: Mutex<Vec<SentMessage>>,
    /// Number of send attempts, including failed ones.
    attempts: Mutex<usize>,
    fail_all: AtomicBool,
    failing_recipients: Mutex<HashSet<String>>,
}

impl OutboxNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send fail.
    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Make sends to `recipient` fail.
    pub fn fail_for(&self, recipient: impl Into<String>) {
        self.failing_recipients.lock().insert(recipient.into());
    }

    /// Messages delivered so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    #[must_use]
    pub fn attempts(&self) -> usize {
        *self.attempts.lock()
    }
}

#[async_trait]
impl Notifier for OutboxNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        *self.attempts.lock() += 1;
        if self.fail_all.load(Ordering::SeqCst) || self.failing_recipients.lock().contains(recipient)
        {
            anyhow::bail!("delivery to {recipient} refused");
        }
        tracing::debug!(recipient, subject, "notification queued");
        self.sent.lock().push(SentMessage {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
