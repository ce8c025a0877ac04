//! Operation orchestration framework.
//!
//! - **Operations** (`operation`, `operations`): the per-action hooks and the
//!   three customer portal actions
//! - **Pipeline** (`pipeline`): fixed phase ordering, audit, notification
//! - **Registry** (`registry`): keyed strategy lookup
//! - **Config** (`config`): validation bounds and message defaults

pub mod config;
pub mod operation;
pub mod operations;
pub mod pipeline;
pub mod registry;

// Re-export key types for convenient access.
pub use config::{BackofficeConfig, TelemetryConfig};
pub use operation::{Notification, PortalOperation};
pub use operations::{
    ClaimRequest, ClaimSubmission, InquiryRequest, InquirySubmission, PolicyPurchase,
    PurchaseReceipt, PurchaseRequest,
};
pub use pipeline::{OperationPipeline, PipelineDeps};
pub use registry::{Keyed, StrategyRegistry};
