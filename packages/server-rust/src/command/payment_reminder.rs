use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use healthins_core::{ActorStore, Notifier, PaymentId, PaymentStore, PolicyStore};

use super::Command;
use crate::error::OperationError;

/// Result of a reminder attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderOutcome {
    pub recipient: String,
    pub subject: String,
    /// `false` when the notifier rejected the message.
    pub delivered: bool,
}

/// Emails the policy holder about a payment. Not reversible.
pub struct SendPaymentReminderCommand {
    payments: Arc<dyn PaymentStore>,
    policies: Arc<dyn PolicyStore>,
    actors: Arc<dyn ActorStore>,
    notifier: Arc<dyn Notifier>,
    sender_name: String,
    payment_id: PaymentId,
    reminder_type: String,
    extra_message: Option<String>,
}

impl SendPaymentReminderCommand {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        payments: Arc<dyn PaymentStore>,
        policies: Arc<dyn PolicyStore>,
        actors: Arc<dyn ActorStore>,
        notifier: Arc<dyn Notifier>,
        sender_name: impl Into<String>,
        payment_id: PaymentId,
        reminder_type: impl Into<String>,
        extra_message: Option<String>,
    ) -> Self {
        Self {
            payments,
            policies,
            actors,
            notifier,
            sender_name: sender_name.into(),
            payment_id,
            reminder_type: reminder_type.into(),
            extra_message,
        }
    }

    #[must_use]
    pub fn payment_id(&self) -> PaymentId {
        self.payment_id
    }

    #[must_use]
    pub fn reminder_type(&self) -> &str {
        &self.reminder_type
    }
}

#[async_trait]
impl Command for SendPaymentReminderCommand {
    type Output = ReminderOutcome;

    async fn execute(&mut self) -> Result<ReminderOutcome, OperationError> {
        let payment = self
            .payments
            .find_payment(self.payment_id)
            .await?
            .ok_or_else(|| OperationError::not_found("payment", self.payment_id))?;
        let policy = self
            .policies
            .find_policy(payment.policy_id)
            .await?
            .ok_or_else(|| OperationError::not_found("policy", payment.policy_id))?;
        let holder = self
            .actors
            .find_actor(policy.holder)
            .await?
            .ok_or_else(|| OperationError::not_found("customer", policy.holder))?;

        let subject = format!("Payment Reminder - {}", self.reminder_type);
        let mut body = format!(
            "Dear {},\n\nThis is a {} reminder for your payment due.\nAmount: {}, Due Date: {}.\n\n",
            holder.name,
            self.reminder_type.to_lowercase(),
            payment.amount,
            payment.due_date,
        );
        if let Some(extra) = self.extra_message.as_deref().filter(|m| !m.trim().is_empty()) {
            let _ = write!(body, "Additional Message: {extra}\n\n");
        }
        let _ = write!(
            body,
            "Please settle at your earliest convenience.\n\nRegards,\n{}",
            self.sender_name
        );

        let delivered = match self.notifier.send(&holder.email, &subject, &body).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(
                    payment_id = %self.payment_id,
                    recipient = %holder.email,
                    error = %err,
                    "payment reminder delivery failed"
                );
                false
            }
        };
        Ok(ReminderOutcome {
            recipient: holder.email,
            subject,
            delivered,
        })
    }

    fn describe(&self) -> String {
        format!("Send payment reminder for payment ID: {}", self.payment_id)
    }
}
