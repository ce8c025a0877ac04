use std::sync::Arc;

use async_trait::async_trait;
use healthins_core::{Actor, ActorId, ActorStore, MonotonicClock, Timestamp};

use super::Command;
use crate::error::OperationError;

/// Fields to change on a customer record. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub contact: Option<String>,
    pub active: Option<bool>,
}

impl CustomerUpdate {
    fn apply_to(&self, actor: &mut Actor) {
        if let Some(name) = &self.name {
            actor.name.clone_from(name);
        }
        if let Some(email) = &self.email {
            actor.email.clone_from(email);
        }
        if let Some(phone) = &self.phone {
            actor.phone = Some(phone.clone());
        }
        if let Some(contact) = &self.contact {
            actor.contact = Some(contact.clone());
        }
        if let Some(active) = self.active {
            actor.active = active;
        }
    }
}

/// Prior state of the target, captured right before the write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSnapshot {
    pub target_id: ActorId,
    pub prior: Actor,
    pub captured_at: Timestamp,
}

#[derive(Debug, Clone)]
enum SnapshotState {
    /// `execute` has not completed a write yet.
    Empty,
    Captured(CommandSnapshot),
    /// The snapshot was written back by a successful `undo`.
    Restored,
}

/// Updates one customer's contact details. Reversible once.
pub struct UpdateCustomerCommand {
    actors: Arc<dyn ActorStore>,
    clock: Arc<MonotonicClock>,
    customer_id: ActorId,
    update: CustomerUpdate,
    state: SnapshotState,
}

impl UpdateCustomerCommand {
    #[must_use]
    pub fn new(
        actors: Arc<dyn ActorStore>,
        clock: Arc<MonotonicClock>,
        customer_id: ActorId,
        update: CustomerUpdate,
    ) -> Self {
        Self {
            actors,
            clock,
            customer_id,
            update,
            state: SnapshotState::Empty,
        }
    }

    #[must_use]
    pub fn customer_id(&self) -> ActorId {
        self.customer_id
    }

    /// The captured prior state, if `execute` ran and `undo` has not.
    #[must_use]
    pub fn snapshot(&self) -> Option<&CommandSnapshot> {
        match &self.state {
            SnapshotState::Captured(snapshot) => Some(snapshot),
            SnapshotState::Empty | SnapshotState::Restored => None,
        }
    }
}

#[async_trait]
impl Command for UpdateCustomerCommand {
    type Output = Actor;

    async fn execute(&mut self) -> Result<Actor, OperationError> {
        let prior = self
            .actors
            .find_actor(self.customer_id)
            .await?
            .ok_or_else(|| OperationError::not_found("customer", self.customer_id))?;

        let mut updated = prior.clone();
        self.update.apply_to(&mut updated);

        let snapshot = CommandSnapshot {
            target_id: self.customer_id,
            prior,
            captured_at: self.clock.now(),
        };
        self.actors.save_actor(&updated).await?;
        self.state = SnapshotState::Captured(snapshot);

        tracing::info!(customer_id = %self.customer_id, "customer record updated");
        Ok(updated)
    }

    async fn undo(&mut self) -> Result<(), OperationError> {
        let snapshot = match &self.state {
            SnapshotState::Empty => return Err(OperationError::NoSnapshotAvailable),
            SnapshotState::Restored => return Err(OperationError::NothingToUndo),
            SnapshotState::Captured(snapshot) => snapshot,
        };
        // A failed restore keeps the snapshot so the caller can retry.
        self.actors.save_actor(&snapshot.prior).await?;
        tracing::info!(
            customer_id = %snapshot.target_id,
            captured_at = snapshot.captured_at.millis,
            "customer update reverted"
        );
        self.state = SnapshotState::Restored;
        Ok(())
    }

    fn supports_undo(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        format!("Update customer information for ID: {}", self.customer_id)
    }
}

#[cfg(test)]
mod tests {
    use healthins_core::Role;
    use proptest::prelude::*;

    use super::*;
    use crate::storage::MemoryStore;

    fn customer() -> Actor {
        Actor {
            id: ActorId(7),
            username: "jane".into(),
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            phone: Some("0771234567".into()),
            contact: None,
            active: true,
            role: Role::Customer,
        }
    }

    fn command(store: &Arc<MemoryStore>, update: CustomerUpdate) -> UpdateCustomerCommand {
        UpdateCustomerCommand::new(
            store.clone(),
            Arc::new(MonotonicClock::system()),
            ActorId(7),
            update,
        )
    }

    fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.seed_actor(customer());
        store
    }

    #[tokio::test]
    async fn execute_applies_only_given_fields() {
        let store = seeded();
        let mut cmd = command(
            &store,
            CustomerUpdate {
                email: Some("new@example.com".into()),
                ..CustomerUpdate::default()
            },
        );
        let updated = cmd.execute().await.unwrap();
        assert_eq!(updated.email, "new@example.com");
        assert_eq!(updated.name, "Jane Doe");
        assert_eq!(updated.phone.as_deref(), Some("0771234567"));
        assert_eq!(store.actor(ActorId(7)), Some(updated));
        assert_eq!(cmd.snapshot().map(|s| &s.prior), Some(&customer()));
    }

    #[tokio::test]
    async fn undo_restores_prior_state() {
        let store = seeded();
        let mut cmd = command(
            &store,
            CustomerUpdate {
                name: Some("Jane Smith".into()),
                active: Some(false),
                ..CustomerUpdate::default()
            },
        );
        cmd.execute().await.unwrap();
        cmd.undo().await.unwrap();
        assert_eq!(store.actor(ActorId(7)), Some(customer()));
        assert!(cmd.snapshot().is_none());
    }

    #[tokio::test]
    async fn undo_before_execute_has_no_snapshot() {
        let store = seeded();
        let mut cmd = command(&store, CustomerUpdate::default());
        assert!(matches!(
            cmd.undo().await,
            Err(OperationError::NoSnapshotAvailable)
        ));
        assert_eq!(store.mutation_count(), 0);
    }

    #[tokio::test]
    async fn second_undo_is_nothing_to_undo() {
        let store = seeded();
        let mut cmd = command(
            &store,
            CustomerUpdate {
                name: Some("Other".into()),
                ..CustomerUpdate::default()
            },
        );
        cmd.execute().await.unwrap();
        cmd.undo().await.unwrap();
        assert!(matches!(cmd.undo().await, Err(OperationError::NothingToUndo)));
    }

    #[tokio::test]
    async fn failed_write_captures_no_snapshot() {
        let store = seeded();
        store.fail_writes(true);
        let mut cmd = command(
            &store,
            CustomerUpdate {
                name: Some("Other".into()),
                ..CustomerUpdate::default()
            },
        );
        assert!(matches!(cmd.execute().await, Err(OperationError::Store(_))));
        assert!(matches!(
            cmd.undo().await,
            Err(OperationError::NoSnapshotAvailable)
        ));
    }

    #[tokio::test]
    async fn failed_restore_keeps_snapshot_for_retry() {
        let store = seeded();
        let mut cmd = command(
            &store,
            CustomerUpdate {
                name: Some("Other".into()),
                ..CustomerUpdate::default()
            },
        );
        cmd.execute().await.unwrap();
        store.fail_writes(true);
        assert!(cmd.undo().await.is_err());
        store.fail_writes(false);
        cmd.undo().await.unwrap();
        assert_eq!(store.actor(ActorId(7)), Some(customer()));
    }

    #[tokio::test]
    async fn unknown_customer_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let mut cmd = command(&store, CustomerUpdate::default());
        assert!(matches!(
            cmd.execute().await,
            Err(OperationError::ResourceNotFound { kind: "customer", .. })
        ));
    }

    #[test]
    fn command_is_reversible_and_described() {
        let store = seeded();
        let cmd = command(&store, CustomerUpdate::default());
        assert!(cmd.supports_undo());
        assert_eq!(cmd.describe(), "Update customer information for ID: 7");
    }

    fn arb_update() -> impl Strategy<Value = CustomerUpdate> {
        (
            proptest::option::of("[A-Za-z ]{1,20}"),
            proptest::option::of("[a-z]{1,8}@example\\.com"),
            proptest::option::of("[0-9]{7,10}"),
            proptest::option::of("[a-z ]{0,30}"),
            proptest::option::of(any::<bool>()),
        )
            .prop_map(|(name, email, phone, contact, active)| CustomerUpdate {
                name,
                email,
                phone,
                contact,
                active,
            })
    }

    proptest! {
        #[test]
        fn execute_then_undo_round_trips(update in arb_update()) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let store = seeded();
                let mut cmd = command(&store, update);
                cmd.execute().await.unwrap();
                cmd.undo().await.unwrap();
                prop_assert_eq!(store.actor(ActorId(7)), Some(customer()));
                Ok(())
            })?;
        }
    }
}
