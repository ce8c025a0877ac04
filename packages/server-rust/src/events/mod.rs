//! Event fan-out: immutable [`Event`] values delivered by the [`EventBus`] to
//! independent [`EventListener`]s.

pub mod bus;
pub mod listeners;

use std::collections::BTreeMap;

use healthins_core::{ActorId, Timestamp, Value};
use serde::Serialize;
use uuid::Uuid;

pub use bus::{DeliveryReport, EventBus, EventListener};
pub use listeners::{AnalyticsListener, AuditListener, MetricsListener};

/// Well-known event type tags.
pub mod event_types {
    pub const CUSTOMER_UPDATE: &str = "CUSTOMER_UPDATE";
    pub const CUSTOMER_UPDATE_REVERTED: &str = "CUSTOMER_UPDATE_REVERTED";
    pub const PAYMENT_REMINDER: &str = "PAYMENT_REMINDER";
    pub const REPORT_GENERATION: &str = "REPORT_GENERATION";
    pub const CAMPAIGN_CREATED: &str = "CAMPAIGN_CREATED";
    pub const CAMPAIGN_EXECUTED: &str = "CAMPAIGN_EXECUTED";
    pub const CAMPAIGN_COMPLETED: &str = "CAMPAIGN_COMPLETED";
    pub const CAMPAIGN_DELETED: &str = "CAMPAIGN_DELETED";
    pub const EMAIL_SENT: &str = "EMAIL_SENT";
    pub const BULK_EMAIL_SENT: &str = "BULK_EMAIL_SENT";
    pub const CLAIM_SUBMITTED: &str = "CLAIM_SUBMITTED";
    pub const POLICY_PURCHASED: &str = "POLICY_PURCHASED";
    pub const INQUIRY_SUBMITTED: &str = "INQUIRY_SUBMITTED";
}

/// What an event is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Subject {
    Campaign(String),
    Payment(String),
    Customer(String),
    Report(String),
    Operation(String),
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Subject::Campaign(id) => write!(f, "campaign:{id}"),
            Subject::Payment(id) => write!(f, "payment:{id}"),
            Subject::Customer(id) => write!(f, "customer:{id}"),
            Subject::Report(id) => write!(f, "report:{id}"),
            Subject::Operation(id) => write!(f, "operation:{id}"),
        }
    }
}

/// A business action that has completed.
///
/// Fields are private: an event is assembled with [`Event::new`] and
/// [`Event::with`] and is read-only once handed to the bus.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    id: Uuid,
    event_type: String,
    subject: Subject,
    payload: BTreeMap<String, Value>,
    actor_id: ActorId,
    timestamp: Timestamp,
}

impl Event {
    #[must_use]
    pub fn new(
        event_type: impl Into<String>,
        subject: Subject,
        actor_id: ActorId,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type: event_type.into(),
            subject,
            payload: BTreeMap::new(),
            actor_id,
            timestamp,
        }
    }

    /// Adds one payload entry.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Merges a whole map into the payload.
    #[must_use]
    pub fn with_all(mut self, entries: BTreeMap<String, Value>) -> Self {
        self.payload.extend(entries);
        self
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    #[must_use]
    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    #[must_use]
    pub fn payload(&self) -> &BTreeMap<String, Value> {
        &self.payload
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    #[must_use]
    pub fn actor_id(&self) -> ActorId {
        self.actor_id
    }

    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}
