//! `HealthInsure` core: domain model, money, monotonic clock, and the
//! collaborator contracts consumed by the back-office orchestration layer.

pub mod clock;
pub mod model;
pub mod traits;
pub mod types;

pub use clock::{date_from_millis, ClockSource, ManualClock, MonotonicClock, SystemClock, Timestamp};
pub use model::{
    Actor, AuditEntry, Campaign, CampaignChannel, Claim, ClaimStatus, Inquiry, InquiryStatus,
    NewCampaign, NewClaim, NewInquiry, NewPayment, NewPolicy, Payment, PaymentStatus, Policy,
    PolicyOffer, PolicyStatus, Role,
};
pub use traits::{
    ActorStore, AuditLog, CampaignStore, ClaimStore, InquiryStore, Notifier, PaymentStore,
    PolicyStore, ReportRenderer,
};
pub use types::{
    ActorId, CampaignId, ClaimId, InquiryId, Money, PaymentId, PolicyId, PolicyOfferId, Value,
};
