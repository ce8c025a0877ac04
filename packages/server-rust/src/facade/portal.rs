//! Customer portal entry points. Each action runs through its
//! [`OperationPipeline`] and is announced on the bus only once it succeeds.

use std::sync::Arc;

use healthins_core::{ActorId, Claim, Inquiry, MonotonicClock};

use super::Collaborators;
use crate::error::OperationError;
use crate::events::{event_types, Event, EventBus, Subject};
use crate::service::config::BackofficeConfig;
use crate::service::operations::{
    ClaimRequest, ClaimSubmission, InquiryRequest, InquirySubmission, PolicyPurchase,
    PurchaseReceipt, PurchaseRequest,
};
use crate::service::pipeline::OperationPipeline;

pub struct PortalFacade {
    claims: OperationPipeline<ClaimSubmission>,
    purchases: OperationPipeline<PolicyPurchase>,
    inquiries: OperationPipeline<InquirySubmission>,
    clock: Arc<MonotonicClock>,
    bus: Arc<EventBus>,
}

impl PortalFacade {
    #[must_use]
    pub fn new(c: &Collaborators, bus: Arc<EventBus>, config: &BackofficeConfig) -> Self {
        let deps = c.pipeline_deps();
        Self {
            claims: OperationPipeline::new(
                ClaimSubmission::new(
                    Arc::clone(&c.policies),
                    Arc::clone(&c.claims),
                    Arc::clone(&c.clock),
                ),
                deps.clone(),
            ),
            purchases: OperationPipeline::new(
                PolicyPurchase::new(
                    Arc::clone(&c.policies),
                    Arc::clone(&c.payments),
                    Arc::clone(&c.clock),
                    config,
                ),
                deps.clone(),
            ),
            inquiries: OperationPipeline::new(
                InquirySubmission::new(Arc::clone(&c.inquiries), config),
                deps,
            ),
            clock: Arc::clone(&c.clock),
            bus,
        }
    }

    /// # Errors
    ///
    /// Any pipeline failure, unchanged.
    pub async fn submit_claim(
        &self,
        actor_id: ActorId,
        request: ClaimRequest,
    ) -> Result<Claim, OperationError> {
        let claim = self.claims.execute(request, actor_id).await?;
        self.publish(
            Event::new(
                event_types::CLAIM_SUBMITTED,
                Subject::Operation(claim.claim_number.clone()),
                actor_id,
                self.clock.now(),
            )
            .with("claimId", claim.id.0)
            .with("policyId", claim.policy_id.0)
            .with("amount", claim.amount),
        );
        Ok(claim)
    }

    /// # Errors
    ///
    /// Any pipeline failure, unchanged.
    pub async fn purchase_policy(
        &self,
        actor_id: ActorId,
        request: PurchaseRequest,
    ) -> Result<PurchaseReceipt, OperationError> {
        let receipt = self.purchases.execute(request, actor_id).await?;
        self.publish(
            Event::new(
                event_types::POLICY_PURCHASED,
                Subject::Operation(receipt.policy.policy_number.clone()),
                actor_id,
                self.clock.now(),
            )
            .with("policyId", receipt.policy.id.0)
            .with("coverage", receipt.policy.coverage.clone())
            .with("premium", receipt.policy.premium),
        );
        Ok(receipt)
    }

    /// # Errors
    ///
    /// Any pipeline failure, unchanged.
    pub async fn submit_inquiry(
        &self,
        actor_id: ActorId,
        request: InquiryRequest,
    ) -> Result<Inquiry, OperationError> {
        let inquiry = self.inquiries.execute(request, actor_id).await?;
        self.publish(
            Event::new(
                event_types::INQUIRY_SUBMITTED,
                Subject::Operation(format!("inquiry-{}", inquiry.id)),
                actor_id,
                self.clock.now(),
            )
            .with("inquiryId", inquiry.id.0)
            .with("inquiryType", inquiry.inquiry_type.clone()),
        );
        Ok(inquiry)
    }

    fn publish(&self, event: Event) {
        let report = self.bus.publish(&event);
        if !report.failed.is_empty() {
            tracing::debug!(
                event_type = event.event_type(),
                failed = ?report.failed,
                "some listeners failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use healthins_core::{
        Actor, Money, Policy, PolicyId, PolicyOffer, PolicyOfferId, PolicyStatus, Role,
    };

    use super::*;
    use crate::events::{EventListener, MetricsListener};
    use crate::notify::OutboxNotifier;
    use crate::storage::MemoryStore;

    fn fixture() -> (Arc<MemoryStore>, Arc<MetricsListener>, PortalFacade) {
        let store = Arc::new(MemoryStore::new());
        store.seed_actor(Actor {
            id: ActorId(7),
            username: "jane".into(),
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            phone: None,
            contact: None,
            active: true,
            role: Role::Customer,
        });
        store.seed_policy(Policy {
            id: PolicyId(1),
            policy_number: "P-1".into(),
            holder: ActorId(7),
            status: PolicyStatus::Active,
            premium: Money::from_major(15_000),
            coverage: "HEALTH".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        });
        store.seed_offer(PolicyOffer {
            id: PolicyOfferId(2),
            coverage_type: "DENTAL".into(),
            description: "Dental cover".into(),
            price: Some(Money::from_major(300)),
        });
        let metrics = Arc::new(MetricsListener::new());
        let bus = Arc::new(EventBus::new(vec![
            metrics.clone() as Arc<dyn EventListener>
        ]));
        let c = Collaborators::in_memory(
            store.clone(),
            Arc::new(OutboxNotifier::new()),
            Arc::new(MonotonicClock::system()),
        );
        let facade = PortalFacade::new(&c, bus, &BackofficeConfig::default());
        (store, metrics, facade)
    }

    #[tokio::test]
    async fn each_portal_action_publishes_its_event() {
        let (store, metrics, portal) = fixture();
        portal
            .submit_claim(
                ActorId(7),
                ClaimRequest {
                    policy_id: Some(PolicyId(1)),
                    amount: Money::from_major(100),
                    description: "Checkup".into(),
                    claim_date: None,
                },
            )
            .await
            .unwrap();
        portal
            .purchase_policy(
                ActorId(7),
                PurchaseRequest {
                    offer_id: Some(PolicyOfferId(2)),
                    card_holder: "Jane Doe".into(),
                    card_number: "4111111111111111".into(),
                    expiry: "01/30".into(),
                    cvv: "999".into(),
                },
            )
            .await
            .unwrap();
        portal
            .submit_inquiry(
                ActorId(7),
                InquiryRequest {
                    inquiry_type: "GENERAL".into(),
                    title: "Coverage".into(),
                    description: "Does dental include braces?".into(),
                },
            )
            .await
            .unwrap();

        assert_eq!(metrics.count(event_types::CLAIM_SUBMITTED), 1);
        assert_eq!(metrics.count(event_types::POLICY_PURCHASED), 1);
        assert_eq!(metrics.count(event_types::INQUIRY_SUBMITTED), 1);
        assert_eq!(store.audit_entries().len(), 3);
    }

    #[tokio::test]
    async fn rejected_claim_publishes_nothing() {
        let (_, metrics, portal) = fixture();
        let err = portal
            .submit_claim(
                ActorId(7),
                ClaimRequest {
                    policy_id: Some(PolicyId(1)),
                    amount: Money::from_major(20_000),
                    description: "Surgery".into(),
                    claim_date: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, OperationError::InvalidState(_)));
        assert_eq!(metrics.count(event_types::CLAIM_SUBMITTED), 0);
    }
}
