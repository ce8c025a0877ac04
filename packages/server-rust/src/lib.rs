//! `HealthInsure` back-office orchestration: the customer portal operation
//! pipeline, keyed strategy registries, the event bus, reversible commands,
//! and the facades that tie them together.

pub mod command;
pub mod error;
pub mod events;
pub mod facade;
pub mod notify;
pub mod render;
pub mod service;
pub mod storage;
pub mod strategy;
pub mod telemetry;

pub use command::{Command, CustomerUpdate, UpdateCustomerCommand};
pub use error::{OperationError, RegistryError};
pub use events::{Event, EventBus, EventListener, Subject};
pub use facade::{Collaborators, CustomerSupportFacade, MarketingFacade, PortalFacade};
pub use notify::OutboxNotifier;
pub use render::JsonReportRenderer;
pub use service::{BackofficeConfig, OperationPipeline, PortalOperation, StrategyRegistry};
pub use storage::MemoryStore;
pub use telemetry::init_tracing;
