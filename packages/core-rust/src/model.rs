//! Domain records read and written by the orchestration layer.
//!
//! Only the fields that the pipeline, strategies, and commands care about are
//! modelled here. Persistence schema and DTO shapes belong to the store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{
    ActorId, CampaignId, ClaimId, InquiryId, Money, PaymentId, PolicyId, PolicyOfferId,
};

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// Role tag assigned to an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    Policyholder,
    CustomerServiceOfficer,
    ClaimsProcessing,
    Marketing,
    Hr,
    Admin,
}

/// A user account able to initiate operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub username: String,
    pub name: String,
    /// Contact address used for out-of-band notifications.
    pub email: String,
    pub phone: Option<String>,
    /// Postal address or other free-form contact detail.
    pub contact: Option<String>,
    /// Inactive actors may not initiate any pipeline operation.
    pub active: bool,
    pub role: Role,
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyStatus {
    Active,
    Lapsed,
    Cancelled,
    Expired,
}

/// An issued policy owned by exactly one holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub id: PolicyId,
    pub policy_number: String,
    pub holder: ActorId,
    pub status: PolicyStatus,
    pub premium: Money,
    pub coverage: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Fields needed to issue a new policy; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPolicy {
    pub policy_number: String,
    pub holder: ActorId,
    pub status: PolicyStatus,
    pub premium: Money,
    pub coverage: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// A purchasable catalog entry. `price` is `None` when pricing has not been
/// configured yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyOffer {
    pub id: PolicyOfferId,
    pub coverage_type: String,
    pub description: String,
    pub price: Option<Money>,
}

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimStatus {
    Pending,
    Approved,
    Rejected,
    Paid,
}

impl ClaimStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ClaimStatus::Pending => "PENDING",
            ClaimStatus::Approved => "APPROVED",
            ClaimStatus::Rejected => "REJECTED",
            ClaimStatus::Paid => "PAID",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    pub claim_number: String,
    pub policy_id: PolicyId,
    pub amount: Money,
    pub status: ClaimStatus,
    pub claim_date: NaiveDate,
    pub notes: String,
    pub document_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClaim {
    pub claim_number: String,
    pub policy_id: PolicyId,
    pub amount: Money,
    pub status: ClaimStatus,
    pub claim_date: NaiveDate,
    pub notes: String,
    pub document_path: String,
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Overdue,
    Failed,
}

impl PaymentStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Overdue => "OVERDUE",
            PaymentStatus::Failed => "FAILED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub policy_id: PolicyId,
    pub amount: Money,
    pub due_date: NaiveDate,
    /// Settlement date; `None` while unpaid.
    pub payment_date: Option<NaiveDate>,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    pub policy_id: PolicyId,
    pub amount: Money,
    pub due_date: NaiveDate,
    pub payment_date: Option<NaiveDate>,
    pub status: PaymentStatus,
}

// ---------------------------------------------------------------------------
// Inquiries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InquiryStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl InquiryStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            InquiryStatus::Open => "OPEN",
            InquiryStatus::InProgress => "IN_PROGRESS",
            InquiryStatus::Resolved => "RESOLVED",
            InquiryStatus::Closed => "CLOSED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inquiry {
    pub id: InquiryId,
    pub customer_id: ActorId,
    pub inquiry_type: String,
    pub title: String,
    pub description: String,
    pub status: InquiryStatus,
    pub resolution_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInquiry {
    pub customer_id: ActorId,
    pub inquiry_type: String,
    pub title: String,
    pub description: String,
    pub status: InquiryStatus,
}

// ---------------------------------------------------------------------------
// Campaigns
// ---------------------------------------------------------------------------

/// Delivery channel of a marketing campaign. Campaign strategies select on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignChannel {
    Email,
    Sms,
    SocialMedia,
}

impl CampaignChannel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CampaignChannel::Email => "EMAIL",
            CampaignChannel::Sms => "SMS",
            CampaignChannel::SocialMedia => "SOCIAL_MEDIA",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub channel: CampaignChannel,
    pub description: Option<String>,
    pub target_segment: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCampaign {
    pub name: String,
    pub channel: CampaignChannel,
    pub description: Option<String>,
    pub target_segment: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

/// One audit-trail record written after a successful operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub actor_id: ActorId,
    /// Operation name, e.g. `"claim_submission"`.
    pub action: String,
    pub details: String,
    /// Milliseconds since Unix epoch.
    pub at: u64,
}
