//! Mutating actions wrapped as command objects.
//!
//! A command instance is built per invocation and owns any state it needs
//! to undo itself. Most commands are one-way; those that can be reversed
//! capture a snapshot of their target immediately before writing.

pub mod payment_reminder;
pub mod update_customer;

use async_trait::async_trait;

use crate::error::OperationError;

pub use payment_reminder::{ReminderOutcome, SendPaymentReminderCommand};
pub use update_customer::{CommandSnapshot, CustomerUpdate, UpdateCustomerCommand};

/// A mutating action that may optionally be undone.
#[async_trait]
pub trait Command: Send + Sync {
    type Output: Send;

    /// Perform the action.
    async fn execute(&mut self) -> Result<Self::Output, OperationError>;

    /// Reverse the last `execute`.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::UndoNotSupported`] unless the command
    /// overrides it.
    async fn undo(&mut self) -> Result<(), OperationError> {
        Err(OperationError::UndoNotSupported)
    }

    fn supports_undo(&self) -> bool {
        false
    }

    /// One-line human description used in logs.
    fn describe(&self) -> String;
}
