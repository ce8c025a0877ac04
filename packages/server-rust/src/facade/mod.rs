//! Single entry points per business area.
//!
//! Each facade composes pipelines, commands, strategies, and the event bus so
//! callers never wire them by hand. Every facade method publishes exactly one
//! event after its action succeeds; failed actions publish nothing.

pub mod customer_support;
pub mod marketing;
pub mod portal;

use std::sync::Arc;

use healthins_core::{
    ActorStore, AuditLog, CampaignStore, ClaimStore, InquiryStore, MonotonicClock, Notifier,
    PaymentStore, PolicyStore,
};

use crate::error::RegistryError;
use crate::service::config::BackofficeConfig;
use crate::service::pipeline::PipelineDeps;
use crate::service::registry::StrategyRegistry;
use crate::storage::MemoryStore;
use crate::strategy::{
    CampaignStrategy, ClaimsReport, EmailCampaign, InquiriesReport, PaymentsReport,
    ReportStrategy, SocialMediaCampaign,
};

pub use customer_support::{CustomerSupportFacade, ReminderRequest, UpdatedCustomer};
pub use marketing::MarketingFacade;
pub use portal::PortalFacade;

/// Handles to every external collaborator, shared by all facades.
#[derive(Clone)]
pub struct Collaborators {
    pub actors: Arc<dyn ActorStore>,
    pub policies: Arc<dyn PolicyStore>,
    pub claims: Arc<dyn ClaimStore>,
    pub payments: Arc<dyn PaymentStore>,
    pub inquiries: Arc<dyn InquiryStore>,
    pub campaigns: Arc<dyn CampaignStore>,
    pub audit: Arc<dyn AuditLog>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<MonotonicClock>,
}

impl Collaborators {
    /// Points every store handle at one [`MemoryStore`].
    #[must_use]
    pub fn in_memory(
        store: Arc<MemoryStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<MonotonicClock>,
    ) -> Self {
        Self {
            actors: store.clone(),
            policies: store.clone(),
            claims: store.clone(),
            payments: store.clone(),
            inquiries: store.clone(),
            campaigns: store.clone(),
            audit: store,
            notifier,
            clock,
        }
    }

    #[must_use]
    pub fn pipeline_deps(&self) -> PipelineDeps {
        PipelineDeps {
            actors: Arc::clone(&self.actors),
            audit: Arc::clone(&self.audit),
            notifier: Arc::clone(&self.notifier),
            clock: Arc::clone(&self.clock),
        }
    }
}

/// The built-in report types: `claims`, `payments`, `inquiries`.
///
/// # Errors
///
/// Returns [`RegistryError::DuplicateKey`] if two report keys collide.
pub fn standard_reports(
    c: &Collaborators,
) -> Result<StrategyRegistry<dyn ReportStrategy>, RegistryError> {
    StrategyRegistry::from_strategies([
        Arc::new(ClaimsReport::new(Arc::clone(&c.claims), Arc::clone(&c.policies)))
            as Arc<dyn ReportStrategy>,
        Arc::new(PaymentsReport::new(
            Arc::clone(&c.payments),
            Arc::clone(&c.policies),
        )),
        Arc::new(InquiriesReport::new(Arc::clone(&c.inquiries))),
    ])
}

/// The built-in campaign strategies: email first, then social media.
///
/// # Errors
///
/// Returns [`RegistryError::DuplicateKey`] if two strategy keys collide.
pub fn standard_campaigns(
    c: &Collaborators,
    config: &BackofficeConfig,
) -> Result<StrategyRegistry<dyn CampaignStrategy>, RegistryError> {
    StrategyRegistry::from_strategies([
        Arc::new(EmailCampaign::new(
            Arc::clone(&c.notifier),
            config.default_campaign_message.clone(),
        )) as Arc<dyn CampaignStrategy>,
        Arc::new(SocialMediaCampaign),
    ])
}
