//! The customer self-service operations run through the pipeline.

pub mod claim_submission;
pub mod inquiry_submission;
pub mod policy_purchase;

pub use claim_submission::{ClaimRequest, ClaimSubmission};
pub use inquiry_submission::{InquiryRequest, InquirySubmission};
pub use policy_purchase::{PolicyPurchase, PurchaseReceipt, PurchaseRequest};
