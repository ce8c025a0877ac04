//! Listener trait and the synchronous fan-out bus.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use super::Event;

/// Observer notified after a business action completes.
///
/// Used as `Arc<dyn EventListener>`.
pub trait EventListener: Send + Sync {
    /// Self-reported name used when logging this listener's failures.
    fn name(&self) -> &str;

    /// Whether this listener wants events of `event_type`. Defaults to all.
    fn should_handle(&self, event_type: &str) -> bool {
        let _ = event_type;
        true
    }

    /// Handle one event. An `Err` is logged by the bus and goes no further.
    ///
    /// # Errors
    ///
    /// Any error is isolated to this listener.
    fn on_event(&self, event: &Event) -> anyhow::Result<()>;
}

/// Outcome of one [`EventBus::publish`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Listeners that handled the event successfully.
    pub delivered: usize,
    /// Listeners whose `should_handle` declined the event.
    pub skipped: usize,
    /// Names of listeners that returned an error or panicked.
    pub failed: Vec<String>,
}

/// Fan-out to a fixed list of listeners.
///
/// Delivery is synchronous and in registration order. Each listener call is
/// isolated: an error or panic in one listener is logged with its name and
/// never reaches the publisher or the remaining listeners.
#[derive(Default, Clone)]
pub struct EventBus {
    listeners: Vec<Arc<dyn EventListener>>,
}

impl EventBus {
    /// Creates a bus with the given startup list of listeners.
    #[must_use]
    pub fn new(listeners: Vec<Arc<dyn EventListener>>) -> Self {
        Self { listeners }
    }

    /// Adds a listener during startup wiring.
    pub fn add(&mut self, listener: Arc<dyn EventListener>) {
        self.listeners.push(listener);
    }

    /// Listener names in delivery order.
    #[must_use]
    pub fn listener_names(&self) -> Vec<String> {
        self.listeners.iter().map(|l| l.name().to_string()).collect()
    }

    /// Deliver `event` to every matching listener. Returns after all
    /// listeners have been attempted.
    pub fn publish(&self, event: &Event) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for listener in &self.listeners {
            let wanted = catch_unwind(AssertUnwindSafe(|| {
                listener.should_handle(event.event_type())
            }));
            let outcome = match wanted {
                Ok(false) => {
                    report.skipped += 1;
                    continue;
                }
                Ok(true) => catch_unwind(AssertUnwindSafe(|| listener.on_event(event))),
                Err(panic) => Err(panic),
            };
            match outcome {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(err)) => {
                    tracing::error!(
                        listener = listener.name(),
                        event_type = event.event_type(),
                        event_id = %event.id(),
                        error = %err,
                        "event listener failed"
                    );
                    record_failure(listener.name());
                    report.failed.push(listener.name().to_string());
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    tracing::error!(
                        listener = listener.name(),
                        event_type = event.event_type(),
                        event_id = %event.id(),
                        panic = %message,
                        "event listener panicked"
                    );
                    record_failure(listener.name());
                    report.failed.push(listener.name().to_string());
                }
            }
        }
        tracing::debug!(
            event_type = event.event_type(),
            delivered = report.delivered,
            skipped = report.skipped,
            failed = report.failed.len(),
            "event published"
        );
        report
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_names())
            .finish()
    }
}

fn record_failure(listener: &str) {
    metrics::counter!("backoffice_listener_failures_total", "listener" => listener.to_string())
        .increment(1);
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
