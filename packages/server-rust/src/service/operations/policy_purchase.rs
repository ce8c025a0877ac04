use std::sync::Arc;

use async_trait::async_trait;
use chrono::Months;
use healthins_core::{
    Actor, Money, MonotonicClock, NewPayment, NewPolicy, Payment, PaymentStatus, PaymentStore,
    Policy, PolicyOffer, PolicyOfferId, PolicyStatus, PolicyStore,
};

use crate::error::OperationError;
use crate::service::config::BackofficeConfig;
use crate::service::operation::{Notification, PortalOperation};

/// Purchase of a catalog offer, paid by card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRequest {
    pub offer_id: Option<PolicyOfferId>,
    pub card_holder: String,
    pub card_number: String,
    pub expiry: String,
    pub cvv: String,
}

/// What the customer receives after a successful purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    pub policy: Policy,
    pub payment: Payment,
}

/// Issues a new active policy for a priced offer and records the payment.
pub struct PolicyPurchase {
    policies: Arc<dyn PolicyStore>,
    payments: Arc<dyn PaymentStore>,
    clock: Arc<MonotonicClock>,
    min_card_number_len: usize,
    min_cvv_len: usize,
    term_years: u32,
}

impl PolicyPurchase {
    #[must_use]
    pub fn new(
        policies: Arc<dyn PolicyStore>,
        payments: Arc<dyn PaymentStore>,
        clock: Arc<MonotonicClock>,
        config: &BackofficeConfig,
    ) -> Self {
        Self {
            policies,
            payments,
            clock,
            min_card_number_len: config.min_card_number_len,
            min_cvv_len: config.min_cvv_len,
            term_years: config.policy_term_years,
        }
    }
}

fn invalid(reason: &str) -> OperationError {
    OperationError::InvalidRequest(reason.to_string())
}

#[async_trait]
impl PortalOperation for PolicyPurchase {
    type Request = PurchaseRequest;
    type Grant = (PolicyOffer, Money);
    type Output = PurchaseReceipt;

    fn name(&self) -> &'static str {
        "policy_purchase"
    }

    fn validate_request(&self, request: &PurchaseRequest) -> Result<(), OperationError> {
        if request.offer_id.is_none() {
            return Err(invalid("policy offer id is required"));
        }
        if request.card_holder.trim().is_empty() {
            return Err(invalid("card holder name is required"));
        }
        let digits: String = request
            .card_number
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();
        if digits.len() < self.min_card_number_len || !digits.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("valid card number is required"));
        }
        if request.expiry.trim().is_empty() {
            return Err(invalid("card expiry date is required"));
        }
        if request.cvv.trim().len() < self.min_cvv_len {
            return Err(invalid("valid cvv is required"));
        }
        Ok(())
    }

    async fn authorize(
        &self,
        _actor: &Actor,
        request: &PurchaseRequest,
    ) -> Result<(PolicyOffer, Money), OperationError> {
        let offer_id = request
            .offer_id
            .ok_or_else(|| invalid("policy offer id is required"))?;
        let offer = self
            .policies
            .find_offer(offer_id)
            .await?
            .ok_or_else(|| OperationError::not_found("policy offer", offer_id))?;
        match offer.price {
            Some(price) if price.is_positive() => Ok((offer, price)),
            _ => Err(OperationError::InvalidState("invalid policy pricing".into())),
        }
    }

    async fn execute(
        &self,
        actor: &Actor,
        _request: &PurchaseRequest,
        grant: (PolicyOffer, Money),
    ) -> Result<PurchaseReceipt, OperationError> {
        let (offer, price) = grant;
        let ts = self.clock.now();
        let start_date = ts.date();
        let end_date = start_date
            .checked_add_months(Months::new(self.term_years.saturating_mul(12)))
            .ok_or_else(|| OperationError::InvalidState("policy term overflows calendar".into()))?;

        let policy = self
            .policies
            .create_policy(NewPolicy {
                policy_number: format!("POL-{}-{}", ts.millis, ts.counter),
                holder: actor.id,
                status: PolicyStatus::Active,
                premium: price,
                coverage: offer.coverage_type.clone(),
                start_date,
                end_date,
            })
            .await?;
        let recorded = self
            .payments
            .insert_payment(NewPayment {
                policy_id: policy.id,
                amount: price,
                due_date: start_date,
                payment_date: Some(start_date),
                status: PaymentStatus::Paid,
            })
            .await;
        match recorded {
            Ok(payment) => Ok(PurchaseReceipt { policy, payment }),
            Err(err) => {
                // A policy without its payment must not outlive the failed purchase.
                if let Err(undo) = self.policies.remove_policy(policy.id).await {
                    tracing::error!(
                        policy = %policy.policy_number,
                        error = %undo,
                        "failed to remove policy after payment failure"
                    );
                }
                Err(err.into())
            }
        }
    }

    fn audit_details(&self, receipt: &PurchaseReceipt) -> String {
        format!(
            "policy {} purchased for {}",
            receipt.policy.policy_number, receipt.payment.amount
        )
    }

    fn notification(&self, actor: &Actor, receipt: &PurchaseReceipt) -> Option<Notification> {
        Some(Notification {
            recipient: actor.email.clone(),
            subject: "Policy Purchased".into(),
            body: format!(
                "Your policy {} is now active. Coverage: {}. Premium: {}. Valid until {}.",
                receipt.policy.policy_number,
                receipt.policy.coverage,
                receipt.policy.premium,
                receipt.policy.end_date
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use healthins_core::{ActorId, ManualClock, Role};

    use super::*;
    use crate::notify::OutboxNotifier;
    use crate::service::pipeline::{OperationPipeline, PipelineDeps};
    use crate::storage::MemoryStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
    }

    fn request(offer: u64) -> PurchaseRequest {
        PurchaseRequest {
            offer_id: Some(PolicyOfferId(offer)),
            card_holder: "Jane Doe".into(),
            card_number: "4111 1111 1111 1111".into(),
            expiry: "12/29".into(),
            cvv: "123".into(),
        }
    }

    fn fixture() -> (Arc<MemoryStore>, Arc<OutboxNotifier>, OperationPipeline<PolicyPurchase>) {
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
        store.seed_offer(PolicyOffer {
            id: PolicyOfferId(1),
            coverage_type: "FAMILY_HEALTH".into(),
            description: "Family cover".into(),
            price: Some(Money::from_major(1_200)),
        });
        store.seed_offer(PolicyOffer {
            id: PolicyOfferId(2),
            coverage_type: "DENTAL".into(),
            description: "Unpriced".into(),
            price: None,
        });
        store.seed_offer(PolicyOffer {
            id: PolicyOfferId(3),
            coverage_type: "VISION".into(),
            description: "Free?".into(),
            price: Some(Money::ZERO),
        });
        let notifier = Arc::new(OutboxNotifier::new());
        let clock = Arc::new(MonotonicClock::new(Arc::new(ManualClock::at_date(today()))));
        let op = PolicyPurchase::new(
            store.clone(),
            store.clone(),
            clock.clone(),
            &BackofficeConfig::default(),
        );
        let deps = PipelineDeps {
            actors: store.clone(),
            audit: store.clone(),
            notifier: notifier.clone(),
            clock,
        };
        (store, notifier, OperationPipeline::new(op, deps))
    }

    #[test]
    fn card_shape_is_validated() {
        let (_, _, pipeline) = fixture();
        let op = pipeline.operation();
        assert!(op.validate_request(&request(1)).is_ok());

        let mut short = request(1);
        short.card_number = "4111 1111".into();
        assert!(op.validate_request(&short).is_err());

        let mut letters = request(1);
        letters.card_number = "4111-1111-1111-ABCD".into();
        assert!(op.validate_request(&letters).is_err());

        let mut cvv = request(1);
        cvv.cvv = "12".into();
        assert!(op.validate_request(&cvv).is_err());

        let mut expiry = request(1);
        expiry.expiry = " ".into();
        assert!(op.validate_request(&expiry).is_err());

        let mut offer = request(1);
        offer.offer_id = None;
        assert!(op.validate_request(&offer).is_err());
    }

    #[tokio::test]
    async fn purchase_issues_active_policy_and_paid_payment() {
        let (store, notifier, pipeline) = fixture();
        let receipt = pipeline.execute(request(1), ActorId(7)).await.unwrap();

        assert_eq!(receipt.policy.status, PolicyStatus::Active);
        assert_eq!(receipt.policy.holder, ActorId(7));
        assert_eq!(receipt.policy.premium, Money::from_major(1_200));
        assert_eq!(receipt.policy.coverage, "FAMILY_HEALTH");
        assert_eq!(receipt.policy.start_date, today());
        assert_eq!(
            receipt.policy.end_date,
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
        assert_eq!(receipt.payment.status, PaymentStatus::Paid);
        assert_eq!(receipt.payment.policy_id, receipt.policy.id);
        assert_eq!(store.all_policies().len(), 1);
        assert_eq!(store.all_payments().len(), 1);
        assert_eq!(notifier.sent()[0].subject, "Policy Purchased");
    }

    #[tokio::test]
    async fn unpriced_or_free_offer_is_invalid_state() {
        let (store, _, pipeline) = fixture();
        for offer in [2, 3] {
            let err = pipeline.execute(request(offer), ActorId(7)).await.unwrap_err();
            assert!(matches!(err, OperationError::InvalidState(ref r) if r == "invalid policy pricing"));
        }
        assert_eq!(store.mutation_count(), 0);
    }

    struct PaymentsDown;

    #[async_trait]
    impl PaymentStore for PaymentsDown {
        async fn find_payment(
            &self,
            _id: healthins_core::PaymentId,
        ) -> anyhow::Result<Option<Payment>> {
            Ok(None)
        }

        async fn insert_payment(&self, _payment: NewPayment) -> anyhow::Result<Payment> {
            anyhow::bail!("payments down")
        }

        async fn payments_between(
            &self,
            _from: NaiveDate,
            _to: NaiveDate,
        ) -> anyhow::Result<Vec<Payment>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn failed_payment_leaves_no_policy_behind() {
        let (store, notifier, _) = fixture();
        let clock = Arc::new(MonotonicClock::new(Arc::new(ManualClock::at_date(today()))));
        let op = PolicyPurchase::new(
            store.clone(),
            Arc::new(PaymentsDown),
            clock.clone(),
            &BackofficeConfig::default(),
        );
        let deps = PipelineDeps {
            actors: store.clone(),
            audit: store.clone(),
            notifier: notifier.clone(),
            clock,
        };
        let pipeline = OperationPipeline::new(op, deps);

        let err = pipeline.execute(request(1), ActorId(7)).await.unwrap_err();

        assert!(err.to_string().contains("payments down"));
        assert!(store.all_policies().is_empty());
        assert!(store.all_payments().is_empty());
        assert!(store.audit_entries().is_empty());
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn unknown_offer_is_not_found() {
        let (_, _, pipeline) = fixture();
        let err = pipeline.execute(request(42), ActorId(7)).await.unwrap_err();
        assert!(matches!(err, OperationError::ResourceNotFound { .. }));
    }
}
