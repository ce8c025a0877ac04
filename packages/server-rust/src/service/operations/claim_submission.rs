use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use healthins_core::{
    Actor, ActorId, Claim, ClaimStatus, ClaimStore, Money, MonotonicClock, NewClaim, Policy,
    PolicyId, PolicyStatus, PolicyStore,
};

use crate::error::OperationError;
use crate::service::operation::{Notification, PortalOperation};

/// A customer's claim against one of their policies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRequest {
    pub policy_id: Option<PolicyId>,
    pub amount: Money,
    pub description: String,
    /// Date of the incident; defaults to today.
    pub claim_date: Option<NaiveDate>,
}

/// Files a claim against an active policy owned by the actor, for no more
/// than the policy premium. Notifies the actor on success.
pub struct ClaimSubmission {
    policies: Arc<dyn PolicyStore>,
    claims: Arc<dyn ClaimStore>,
    clock: Arc<MonotonicClock>,
}

impl ClaimSubmission {
    #[must_use]
    pub fn new(
        policies: Arc<dyn PolicyStore>,
        claims: Arc<dyn ClaimStore>,
        clock: Arc<MonotonicClock>,
    ) -> Self {
        Self {
            policies,
            claims,
            clock,
        }
    }
}

#[async_trait]
impl PortalOperation for ClaimSubmission {
    type Request = ClaimRequest;
    type Grant = Policy;
    type Output = Claim;

    fn name(&self) -> &'static str {
        "claim_submission"
    }

    fn validate_request(&self, request: &ClaimRequest) -> Result<(), OperationError> {
        if request.policy_id.is_none() {
            return Err(OperationError::InvalidRequest("policy id is required".into()));
        }
        if !request.amount.is_positive() {
            return Err(OperationError::InvalidRequest(
                "claim amount must be greater than zero".into(),
            ));
        }
        if request.description.trim().is_empty() {
            return Err(OperationError::InvalidRequest(
                "claim description is required".into(),
            ));
        }
        Ok(())
    }

    async fn authorize(
        &self,
        actor: &Actor,
        request: &ClaimRequest,
    ) -> Result<Policy, OperationError> {
        let policy_id = request
            .policy_id
            .ok_or_else(|| OperationError::InvalidRequest("policy id is required".into()))?;
        let policy = self
            .policies
            .find_policy(policy_id)
            .await?
            .ok_or_else(|| OperationError::not_found("policy", policy_id))?;

        if policy.holder != actor.id {
            return Err(OperationError::Forbidden(format!(
                "actor {} does not own policy {}",
                actor.id, policy.policy_number
            )));
        }
        if policy.status != PolicyStatus::Active {
            return Err(OperationError::InvalidState(format!(
                "policy {} is not active",
                policy.policy_number
            )));
        }
        if request.amount > policy.premium {
            return Err(OperationError::InvalidState(format!(
                "claim amount {} exceeds policy premium {}",
                request.amount, policy.premium
            )));
        }
        Ok(policy)
    }

    async fn execute(
        &self,
        _actor: &Actor,
        request: &ClaimRequest,
        policy: Policy,
    ) -> Result<Claim, OperationError> {
        let ts = self.clock.now();
        let claim = self
            .claims
            .insert_claim(NewClaim {
                claim_number: format!("CLM-{}-{}", ts.millis, ts.counter),
                policy_id: policy.id,
                amount: request.amount,
                status: ClaimStatus::Pending,
                claim_date: request.claim_date.unwrap_or_else(|| ts.date()),
                notes: request.description.trim().to_string(),
                document_path: "N/A".into(),
            })
            .await?;
        tracing::debug!(claim = %claim.claim_number, policy = %policy.policy_number, "claim persisted");
        Ok(claim)
    }

    fn audit_details(&self, claim: &Claim) -> String {
        format!(
            "claim {} for {} on policy {}",
            claim.claim_number, claim.amount, claim.policy_id
        )
    }

    fn notification(&self, actor: &Actor, claim: &Claim) -> Option<Notification> {
        Some(Notification {
            recipient: actor.email.clone(),
            subject: "Claim Submitted".into(),
            body: format!(
                "Your claim has been submitted successfully. Claim ID: {}",
                claim.claim_number
            ),
        })
    }

    fn on_error(&self, actor_id: ActorId, error: &OperationError) {
        tracing::warn!(
            operation = self.name(),
            actor_id = %actor_id,
            error_kind = error.kind(),
            error = %error,
            "claim submission failed"
        );
    }
}
