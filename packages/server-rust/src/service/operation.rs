//! The per-operation behavior plugged into an
//! [`OperationPipeline`](super::pipeline::OperationPipeline).

use async_trait::async_trait;
use healthins_core::{Actor, ActorId};

use crate::error::OperationError;

/// Out-of-band message an operation wants sent after it succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// A customer self-service action run through the four-phase pipeline.
///
/// The pipeline owns ordering: actor checks, then [`validate_request`],
/// then [`authorize`], then [`execute`]. An implementation only supplies the
/// operation-specific parts.
///
/// [`validate_request`]: PortalOperation::validate_request
/// [`authorize`]: PortalOperation::authorize
/// [`execute`]: PortalOperation::execute
#[async_trait]
pub trait PortalOperation: Send + Sync {
    /// Operation-specific payload handed in by the caller.
    type Request: Send + Sync;
    /// What authorization resolved (e.g. the referenced policy), passed on to
    /// the business step so it does not re-read the store.
    type Grant: Send;
    /// The business outcome returned to the caller.
    type Output: Send + Sync;

    /// Stable operation name used in logs and the audit trail.
    fn name(&self) -> &'static str;

    /// Structural checks only. Must not touch any store.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidRequest`] describing the first
    /// offending field.
    fn validate_request(&self, request: &Self::Request) -> Result<(), OperationError>;

    /// Ownership and eligibility checks. May read stores, never writes.
    async fn authorize(
        &self,
        actor: &Actor,
        request: &Self::Request,
    ) -> Result<Self::Grant, OperationError>;

    /// The only phase allowed to mutate state.
    async fn execute(
        &self,
        actor: &Actor,
        request: &Self::Request,
        grant: Self::Grant,
    ) -> Result<Self::Output, OperationError>;

    /// Free-form details written alongside the audit entry.
    fn audit_details(&self, output: &Self::Output) -> String {
        let _ = output;
        String::new()
    }

    /// Message to send after success. `None` means this operation does not notify.
    fn notification(&self, actor: &Actor, output: &Self::Output) -> Option<Notification> {
        let _ = (actor, output);
        None
    }

    /// Called once with any failure before it is returned to the caller.
    /// Must not alter the error.
    fn on_error(&self, actor_id: ActorId, error: &OperationError) {
        tracing::warn!(
            operation = self.name(),
            actor_id = %actor_id,
            error_kind = error.kind(),
            error = %error,
            "operation failed"
        );
    }
}
