//! Customer-support entry points: record updates, payment reminders, and
//! reports.

use std::sync::Arc;

use chrono::NaiveDate;
use healthins_core::{
    Actor, ActorId, ActorStore, MonotonicClock, Notifier, PaymentId, PaymentStore, PolicyStore,
    ReportRenderer,
};

use super::Collaborators;
use crate::command::{
    Command, CustomerUpdate, ReminderOutcome, SendPaymentReminderCommand, UpdateCustomerCommand,
};
use crate::error::OperationError;
use crate::events::{event_types, Event, EventBus, Subject};
use crate::service::config::BackofficeConfig;
use crate::service::registry::StrategyRegistry;
use crate::strategy::{ReportStrategy, Table};

/// Result of a customer update: the stored record plus the command that
/// produced it, so the caller can revert it later.
pub struct UpdatedCustomer {
    pub customer: Actor,
    pub command: UpdateCustomerCommand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderRequest {
    pub payment_id: PaymentId,
    /// Free-form label such as `OVERDUE` or `UPCOMING`.
    pub reminder_type: String,
    pub message: Option<String>,
}

pub struct CustomerSupportFacade {
    actors: Arc<dyn ActorStore>,
    policies: Arc<dyn PolicyStore>,
    payments: Arc<dyn PaymentStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<MonotonicClock>,
    reports: StrategyRegistry<dyn ReportStrategy>,
    renderer: Arc<dyn ReportRenderer>,
    bus: Arc<EventBus>,
    sender_name: String,
}

impl CustomerSupportFacade {
    #[must_use]
    pub fn new(
        collaborators: &Collaborators,
        reports: StrategyRegistry<dyn ReportStrategy>,
        renderer: Arc<dyn ReportRenderer>,
        bus: Arc<EventBus>,
        config: &BackofficeConfig,
    ) -> Self {
        Self {
            actors: Arc::clone(&collaborators.actors),
            policies: Arc::clone(&collaborators.policies),
            payments: Arc::clone(&collaborators.payments),
            notifier: Arc::clone(&collaborators.notifier),
            clock: Arc::clone(&collaborators.clock),
            reports,
            renderer,
            bus,
            sender_name: config.notification_sender_name.clone(),
        }
    }

    fn event(&self, event_type: &str, subject: Subject, performed_by: ActorId) -> Event {
        Event::new(event_type, subject, performed_by, self.clock.now())
    }

    // -- customer records ---------------------------------------------------

    /// Apply `update` to a customer and publish `CUSTOMER_UPDATE`.
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` for an unknown customer, or the store's failure.
    pub async fn update_customer(
        &self,
        performed_by: ActorId,
        customer_id: ActorId,
        update: CustomerUpdate,
    ) -> Result<UpdatedCustomer, OperationError> {
        tracing::info!(customer_id = %customer_id, performed_by = %performed_by, "updating customer");
        let mut command = UpdateCustomerCommand::new(
            Arc::clone(&self.actors),
            Arc::clone(&self.clock),
            customer_id,
            update,
        );
        let customer = command.execute().await?;

        self.bus.publish(
            &self
                .event(
                    event_types::CUSTOMER_UPDATE,
                    Subject::Customer(customer_id.to_string()),
                    performed_by,
                )
                .with("customerId", customer_id.0)
                .with("description", command.describe())
                .with("result", "success"),
        );
        Ok(UpdatedCustomer { customer, command })
    }

    /// Undo a previous [`update_customer`](Self::update_customer) and
    /// publish `CUSTOMER_UPDATE_REVERTED`.
    ///
    /// # Errors
    ///
    /// `NothingToUndo` if the command was already reverted, or the store's
    /// failure.
    pub async fn revert_customer_update(
        &self,
        performed_by: ActorId,
        command: &mut UpdateCustomerCommand,
    ) -> Result<(), OperationError> {
        command.undo().await?;
        let customer_id = command.customer_id();
        self.bus.publish(
            &self
                .event(
                    event_types::CUSTOMER_UPDATE_REVERTED,
                    Subject::Customer(customer_id.to_string()),
                    performed_by,
                )
                .with("customerId", customer_id.0),
        );
        Ok(())
    }

    // -- reminders ----------------------------------------------------------

    /// Send a reminder for one payment and publish `PAYMENT_REMINDER`.
    ///
    /// A rejected delivery is reported in the outcome, not as an error.
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` when the payment, its policy, or the holder is
    /// missing.
    pub async fn send_payment_reminder(
        &self,
        performed_by: ActorId,
        request: ReminderRequest,
    ) -> Result<ReminderOutcome, OperationError> {
        tracing::info!(payment_id = %request.payment_id, performed_by = %performed_by, "sending payment reminder");
        let mut command = SendPaymentReminderCommand::new(
            Arc::clone(&self.payments),
            Arc::clone(&self.policies),
            Arc::clone(&self.actors),
            Arc::clone(&self.notifier),
            self.sender_name.clone(),
            request.payment_id,
            request.reminder_type.clone(),
            request.message,
        );
        let outcome = command.execute().await?;

        self.bus.publish(
            &self
                .event(
                    event_types::PAYMENT_REMINDER,
                    Subject::Payment(request.payment_id.to_string()),
                    performed_by,
                )
                .with("paymentId", request.payment_id.0)
                .with("reminderType", request.reminder_type)
                .with("delivered", outcome.delivered),
        );
        Ok(outcome)
    }

    // -- reports ------------------------------------------------------------

    /// Collect a report's rows for `from..=to` and publish `REPORT_GENERATION`.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` when `from` is after `to`, `UnsupportedType` for an
    /// unknown report key, or the store's failure.
    pub async fn generate_report(
        &self,
        performed_by: ActorId,
        report_type: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Table, OperationError> {
        let (_, table) = self.build_report(performed_by, report_type, from, to).await?;
        Ok(table)
    }

    /// Like [`generate_report`](Self::generate_report), then renders the
    /// table into a document.
    ///
    /// # Errors
    ///
    /// Any error from `generate_report`, or the renderer's failure.
    pub async fn export_report(
        &self,
        performed_by: ActorId,
        report_type: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<u8>, OperationError> {
        let (strategy, table) = self.build_report(performed_by, report_type, from, to).await?;
        let document = self
            .renderer
            .render(strategy.title(), table.header(), table.rows())?;
        Ok(document)
    }

    async fn build_report(
        &self,
        performed_by: ActorId,
        report_type: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<(Arc<dyn ReportStrategy>, Table), OperationError> {
        if from > to {
            return Err(OperationError::InvalidRequest(format!(
                "report range start {from} is after end {to}"
            )));
        }
        let strategy = self.reports.resolve(report_type)?;
        let records = strategy.data_for(from, to).await?;

        let mut table = Table::new(strategy.header_row());
        for record in &records {
            strategy.append_row(&mut table, record)?;
        }
        tracing::info!(
            report_type,
            rows = table.row_count(),
            performed_by = %performed_by,
            "report generated"
        );

        self.bus.publish(
            &self
                .event(
                    event_types::REPORT_GENERATION,
                    Subject::Report(report_type.to_string()),
                    performed_by,
                )
                .with("reportType", report_type)
                .with("rowCount", table.row_count())
                .with("from", from.to_string())
                .with("to", to.to_string()),
        );
        Ok((strategy, table))
    }

    /// Registered report keys, in registration order.
    #[must_use]
    pub fn available_report_types(&self) -> Vec<String> {
        self.reports.keys()
    }
}
