//! Standard listeners wired at startup: audit trail, metrics, marketing analytics.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context as _;
use dashmap::DashMap;
use parking_lot::Mutex;

use super::{event_types, Event, EventListener};

// ---------------------------------------------------------------------------
// AuditListener
// ---------------------------------------------------------------------------

const CRITICAL_EVENTS: [&str; 3] = [
    event_types::CAMPAIGN_EXECUTED,
    event_types::BULK_EMAIL_SENT,
    event_types::CAMPAIGN_DELETED,
];

/// Writes every event to the `audit` tracing target and keeps the most recent
/// rendered lines in memory for inspection.
#[derive(Debug)]
pub struct AuditListener {
    trail: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl Default for AuditListener {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl AuditListener {
    pub const DEFAULT_CAPACITY: usize = 1024;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps at most `capacity` lines; the oldest are dropped first. Zero
    /// disables the in-memory copy.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            trail: Mutex::new(VecDeque::with_capacity(capacity.min(Self::DEFAULT_CAPACITY))),
            capacity,
        }
    }

    /// Retained audit lines, oldest first.
    #[must_use]
    pub fn trail(&self) -> Vec<String> {
        self.trail.lock().iter().cloned().collect()
    }

    #[must_use]
    pub fn is_critical(event_type: &str) -> bool {
        CRITICAL_EVENTS.contains(&event_type)
    }

    fn render(event: &Event) -> String {
        let mut line = format!(
            "ts={} event={} actor={} subject={}",
            event.timestamp().millis,
            event.event_type(),
            event.actor_id(),
            event.subject()
        );
        if !event.payload().is_empty() {
            line.push_str(" data={");
            for (i, (k, v)) in event.payload().iter().enumerate() {
                if i > 0 {
                    line.push_str(", ");
                }
                let _ = write!(line, "{k}={v}");
            }
            line.push('}');
        }
        line
    }
}

impl EventListener for AuditListener {
    fn name(&self) -> &str {
        "audit"
    }

    fn on_event(&self, event: &Event) -> anyhow::Result<()> {
        let line = Self::render(event);
        tracing::info!(target: "audit", event_id = %event.id(), "{line}");
        if Self::is_critical(event.event_type()) {
            tracing::warn!(
                target: "audit",
                event_type = event.event_type(),
                actor_id = %event.actor_id(),
                "critical event recorded"
            );
        }
        if self.capacity > 0 {
            let mut trail = self.trail.lock();
            while trail.len() >= self.capacity {
                trail.pop_front();
            }
            trail.push_back(line);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MetricsListener
// ---------------------------------------------------------------------------

/// Counts events per type, both locally and through the `metrics` facade.
#[derive(Debug, Default)]
pub struct MetricsListener {
    counts: DashMap<String, u64>,
}

impl MetricsListener {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events of `event_type` seen so far.
    #[must_use]
    pub fn count(&self, event_type: &str) -> u64 {
        self.counts.get(event_type).map_or(0, |c| *c)
    }
}

impl EventListener for MetricsListener {
    fn name(&self) -> &str {
        "metrics"
    }

    fn on_event(&self, event: &Event) -> anyhow::Result<()> {
        *self
            .counts
            .entry(event.event_type().to_string())
            .or_insert(0) += 1;
        metrics::counter!(
            "backoffice_events_total",
            "event_type" => event.event_type().to_string()
        )
        .increment(1);
        tracing::debug!(
            target: "metrics",
            event_type = event.event_type(),
            actor_id = %event.actor_id(),
            "event counted"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AnalyticsListener
// ---------------------------------------------------------------------------

/// Marketing analytics. Handles only campaign lifecycle and email events.
#[derive(Debug, Default)]
pub struct AnalyticsListener {
    per_type: DashMap<String, u64>,
    emails_succeeded: AtomicU64,
    emails_failed: AtomicU64,
}

impl AnalyticsListener {
    /// Event types this listener accepts.
    pub const HANDLED_EVENTS: [&'static str; 4] = [
        event_types::CAMPAIGN_CREATED,
        event_types::CAMPAIGN_EXECUTED,
        event_types::EMAIL_SENT,
        event_types::CAMPAIGN_COMPLETED,
    ];

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn tracked(&self, event_type: &str) -> u64 {
        self.per_type.get(event_type).map_or(0, |c| *c)
    }

    /// Total (succeeded, failed) email deliveries reported so far.
    #[must_use]
    pub fn email_totals(&self) -> (u64, u64) {
        (
            self.emails_succeeded.load(Ordering::Relaxed),
            self.emails_failed.load(Ordering::Relaxed),
        )
    }

    fn count_field(event: &Event, key: &str) -> anyhow::Result<u64> {
        let value = event
            .get(key)
            .and_then(healthins_core::Value::as_i64)
            .with_context(|| format!("{} payload is missing integer `{key}`", event.event_type()))?;
        Ok(u64::try_from(value).unwrap_or(0))
    }
}

impl EventListener for AnalyticsListener {
    fn name(&self) -> &str {
        "analytics"
    }

    fn should_handle(&self, event_type: &str) -> bool {
        Self::HANDLED_EVENTS.contains(&event_type)
    }

    fn on_event(&self, event: &Event) -> anyhow::Result<()> {
        match event.event_type() {
            event_types::CAMPAIGN_EXECUTED => {
                let strategy = event
                    .get("strategy")
                    .and_then(healthins_core::Value::as_str)
                    .context("CAMPAIGN_EXECUTED payload is missing `strategy`")?;
                metrics::counter!("campaign_executed_total", "strategy" => strategy.to_string())
                    .increment(1);
                if let Ok(sent) = Self::count_field(event, "sentCount") {
                    self.emails_succeeded.fetch_add(sent, Ordering::Relaxed);
                }
            }
            event_types::EMAIL_SENT => {
                let ok = Self::count_field(event, "successCount")?;
                let failed = Self::count_field(event, "failureCount")?;
                self.emails_succeeded.fetch_add(ok, Ordering::Relaxed);
                self.emails_failed.fetch_add(failed, Ordering::Relaxed);
            }
            _ => {}
        }
        *self
            .per_type
            .entry(event.event_type().to_string())
            .or_insert(0) += 1;
        tracing::info!(
            target: "analytics",
            event_type = event.event_type(),
            subject = %event.subject(),
            "campaign activity tracked"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
