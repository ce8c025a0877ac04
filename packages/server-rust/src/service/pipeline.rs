//! Ordered execution of a [`PortalOperation`].
//!
//! Phases run strictly in order and stop at the first failure:
//!
//! 1. validate actor (exists and is active)
//! 2. validate request (structural, no store access)
//! 3. authorize (store reads only)
//! 4. execute (the only mutating phase)
//! 5. audit log (best effort)
//! 6. notify (best effort, only when the operation asks for it)
//!
//! Failures in phases 5 and 6 are logged and never reach the caller.

use std::sync::Arc;
use std::time::Instant;

use healthins_core::{Actor, ActorId, ActorStore, AuditEntry, AuditLog, MonotonicClock, Notifier};
use tracing::{info_span, Instrument};

use super::operation::PortalOperation;
use crate::error::OperationError;

/// Shared collaborators every pipeline needs.
#[derive(Clone)]
pub struct PipelineDeps {
    pub actors: Arc<dyn ActorStore>,
    pub audit: Arc<dyn AuditLog>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<MonotonicClock>,
}

/// Runs one operation type through the fixed phase sequence.
pub struct OperationPipeline<O> {
    operation: O,
    deps: PipelineDeps,
}

impl<O: PortalOperation> OperationPipeline<O> {
    #[must_use]
    pub fn new(operation: O, deps: PipelineDeps) -> Self {
        Self { operation, deps }
    }

    #[must_use]
    pub fn operation(&self) -> &O {
        &self.operation
    }

    /// Run `request` on behalf of `actor_id`.
    ///
    /// # Errors
    ///
    /// Returns the first failure from phases 1 through 4, unchanged.
    pub async fn execute(
        &self,
        request: O::Request,
        actor_id: ActorId,
    ) -> Result<O::Output, OperationError> {
        let span = info_span!(
            "portal_operation",
            operation = self.operation.name(),
            actor_id = %actor_id,
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        async move {
            let start = Instant::now();
            let result = self.run(&request, actor_id).await;

            #[allow(clippy::cast_possible_truncation)]
            let duration_ms = start.elapsed().as_millis() as u64;
            let outcome = match &result {
                Ok(_) => "ok",
                Err(err) => err.kind(),
            };
            tracing::Span::current().record("duration_ms", duration_ms);
            tracing::Span::current().record("outcome", outcome);

            if let Err(err) = &result {
                self.operation.on_error(actor_id, err);
            } else {
                tracing::info!(duration_ms, "operation complete");
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        request: &O::Request,
        actor_id: ActorId,
    ) -> Result<O::Output, OperationError> {
        let actor = self.validate_actor(actor_id).await?;
        self.operation.validate_request(request)?;
        let grant = self.operation.authorize(&actor, request).await?;
        let output = self.operation.execute(&actor, request, grant).await?;

        self.record(&actor, &output).await;
        self.notify(&actor, &output).await;
        Ok(output)
    }

    async fn validate_actor(&self, actor_id: ActorId) -> Result<Actor, OperationError> {
        let actor = self
            .deps
            .actors
            .find_actor(actor_id)
            .await?
            .ok_or(OperationError::ActorNotFound(actor_id))?;
        if !actor.active {
            return Err(OperationError::ActorInactive(actor_id));
        }
        Ok(actor)
    }

    async fn record(&self, actor: &Actor, output: &O::Output) {
        let entry = AuditEntry {
            actor_id: actor.id,
            action: self.operation.name().to_string(),
            details: self.operation.audit_details(output),
            at: self.deps.clock.now().millis,
        };
        if let Err(err) = self.deps.audit.append(entry).await {
            tracing::warn!(
                operation = self.operation.name(),
                actor_id = %actor.id,
                error = %err,
                "audit log write failed"
            );
        }
    }

    async fn notify(&self, actor: &Actor, output: &O::Output) {
        let Some(message) = self.operation.notification(actor, output) else {
            return;
        };
        if let Err(err) = self
            .deps
            .notifier
            .send(&message.recipient, &message.subject, &message.body)
            .await
        {
            tracing::warn!(
                operation = self.operation.name(),
                recipient = %message.recipient,
                error = %err,
                "notification failed"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
