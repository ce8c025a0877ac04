//! Collaborator contracts consumed by the orchestration layer.
//!
//! Every store returns `Ok(None)` (or an empty `Vec`) for a miss; `Err` is
//! reserved for the store itself failing. The orchestration layer never
//! retries and propagates these errors unchanged.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::model::{
    Actor, AuditEntry, Campaign, Claim, Inquiry, NewCampaign, NewClaim, NewInquiry, NewPayment,
    NewPolicy, Payment, Policy, PolicyOffer, Role,
};
use crate::types::{ActorId, CampaignId, PaymentId, PolicyId, PolicyOfferId};

/// Lookup and update of user accounts.
#[async_trait]
pub trait ActorStore: Send + Sync {
    async fn find_actor(&self, id: ActorId) -> anyhow::Result<Option<Actor>>;

    /// All actors carrying `role`, in id order.
    async fn find_by_role(&self, role: Role) -> anyhow::Result<Vec<Actor>>;

    /// Overwrite an existing actor record.
    async fn save_actor(&self, actor: &Actor) -> anyhow::Result<()>;
}

/// Issued policies and the purchasable catalog.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn find_policy(&self, id: PolicyId) -> anyhow::Result<Option<Policy>>;

    async fn find_offer(&self, id: PolicyOfferId) -> anyhow::Result<Option<PolicyOffer>>;

    async fn create_policy(&self, policy: NewPolicy) -> anyhow::Result<Policy>;

    /// Removes a policy created earlier in a business step that could not
    /// complete. Removing an unknown id is not an error.
    async fn remove_policy(&self, id: PolicyId) -> anyhow::Result<()>;
}

#[async_trait]
pub trait ClaimStore: Send + Sync {
    async fn insert_claim(&self, claim: NewClaim) -> anyhow::Result<Claim>;

    /// Claims whose claim date falls in `from..=to`.
    async fn claims_between(&self, from: NaiveDate, to: NaiveDate) -> anyhow::Result<Vec<Claim>>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn find_payment(&self, id: PaymentId) -> anyhow::Result<Option<Payment>>;

    async fn insert_payment(&self, payment: NewPayment) -> anyhow::Result<Payment>;

    /// Settled payments whose payment date falls in `from..=to`.
    async fn payments_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<Payment>>;
}

#[async_trait]
pub trait InquiryStore: Send + Sync {
    async fn insert_inquiry(&self, inquiry: NewInquiry) -> anyhow::Result<Inquiry>;

    /// Inquiries whose resolution date falls in `from..=to`.
    async fn inquiries_resolved_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<Inquiry>>;
}

#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn find_campaign(&self, id: CampaignId) -> anyhow::Result<Option<Campaign>>;

    async fn insert_campaign(&self, campaign: NewCampaign) -> anyhow::Result<Campaign>;
}

/// Append-only audit trail sink.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn append(&self, entry: AuditEntry) -> anyhow::Result<()>;
}

/// Out-of-band message delivery (email, SMS gateway, ...).
///
/// May fail; callers decide whether a failure is fatal.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// Tabular document renderer. Receives a header and rows, owns all layout.
pub trait ReportRenderer: Send + Sync {
    fn render(
        &self,
        title: &str,
        header: &[String],
        rows: &[Vec<String>],
    ) -> anyhow::Result<Vec<u8>>;
}
