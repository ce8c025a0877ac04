//! In-memory implementation of every collaborator store, backed by [`DashMap`].
//!
//! Provides concurrent read/write access without external locking. Ids are
//! issued from one atomic sequence shared by all tables. Range queries return
//! records sorted by id so results are deterministic.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use healthins_core::{
    Actor, ActorId, ActorStore, AuditEntry, AuditLog, Campaign, CampaignId, CampaignStore, Claim,
    ClaimId, ClaimStore, Inquiry, InquiryId, InquiryStore, NewCampaign, NewClaim, NewInquiry,
    NewPayment, NewPolicy, Payment, PaymentId, PaymentStore, Policy, PolicyId, PolicyOffer,
    PolicyOfferId, PolicyStore, Role,
};
use parking_lot::Mutex;

/// In-memory store for actors, policies, claims, payments, inquiries,
/// campaigns, and the audit trail.
pub struct MemoryStore {
    actors: DashMap<ActorId, Actor>,
    policies: DashMap<PolicyId, Policy>,
    offers: DashMap<PolicyOfferId, PolicyOffer>,
    claims: DashMap<ClaimId, Claim>,
    payments: DashMap<PaymentId, Payment>,
    inquiries: DashMap<InquiryId, Inquiry>,
    campaigns: DashMap<CampaignId, Campaign>,
    audit: Mutex<Vec<AuditEntry>>,
    next_id: AtomicU64,
    /// Count of successful mutating calls through the store traits.
    mutations: AtomicU64,
    fail_writes: AtomicBool,
    fail_audit: AtomicBool,
}

impl MemoryStore {
    /// Creates a new, empty `MemoryStore`. Issued ids start at 1000 so they
    /// never collide with ids seeded by hand.
    #[must_use]
    pub fn new() -> Self {
        Self {
            actors: DashMap::new(),
            policies: DashMap::new(),
            offers: DashMap::new(),
            claims: DashMap::new(),
            payments: DashMap::new(),
            inquiries: DashMap::new(),
            campaigns: DashMap::new(),
            audit: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1000),
            mutations: AtomicU64::new(0),
            fail_writes: AtomicBool::new(false),
            fail_audit: AtomicBool::new(false),
        }
    }

    fn issue_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn check_writable(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.fail_writes.load(Ordering::SeqCst),
            "memory store is read-only"
        );
        Ok(())
    }

    fn mutated(&self) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }

    // -- seeding (bypasses mutation counting) -------------------------------

    pub fn seed_actor(&self, actor: Actor) {
        self.actors.insert(actor.id, actor);
    }

    pub fn seed_policy(&self, policy: Policy) {
        self.policies.insert(policy.id, policy);
    }

    pub fn seed_offer(&self, offer: PolicyOffer) {
        self.offers.insert(offer.id, offer);
    }

    pub fn seed_claim(&self, claim: Claim) {
        self.claims.insert(claim.id, claim);
    }

    pub fn seed_payment(&self, payment: Payment) {
        self.payments.insert(payment.id, payment);
    }

    pub fn seed_inquiry(&self, inquiry: Inquiry) {
        self.inquiries.insert(inquiry.id, inquiry);
    }

    pub fn seed_campaign(&self, campaign: Campaign) {
        self.campaigns.insert(campaign.id, campaign);
    }

    // -- fault injection ----------------------------------------------------

    /// Make every mutating call fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make audit appends fail.
    pub fn fail_audit(&self, fail: bool) {
        self.fail_audit.store(fail, Ordering::SeqCst);
    }

    // -- inspection ---------------------------------------------------------

    #[must_use]
    pub fn mutation_count(&self) -> u64 {
        self.mutations.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn actor(&self, id: ActorId) -> Option<Actor> {
        self.actors.get(&id).map(|a| a.clone())
    }

    /// All claims, sorted by id.
    #[must_use]
    pub fn all_claims(&self) -> Vec<Claim> {
        sorted(self.claims.iter().map(|c| c.clone()).collect(), |c| c.id)
    }

    #[must_use]
    pub fn all_policies(&self) -> Vec<Policy> {
        sorted(self.policies.iter().map(|p| p.clone()).collect(), |p| p.id)
    }

    #[must_use]
    pub fn all_payments(&self) -> Vec<Payment> {
        sorted(self.payments.iter().map(|p| p.clone()).collect(), |p| p.id)
    }

    #[must_use]
    pub fn all_inquiries(&self) -> Vec<Inquiry> {
        sorted(self.inquiries.iter().map(|i| i.clone()).collect(), |i| i.id)
    }

    #[must_use]
    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit.lock().clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sorted<T, K: Ord>(mut items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    items.sort_by_key(key);
    items
}

fn within(date: NaiveDate, from: NaiveDate, to: NaiveDate) -> bool {
    from <= date && date <= to
}

#[async_trait]
impl ActorStore for MemoryStore {
    async fn find_actor(&self, id: ActorId) -> anyhow::Result<Option<Actor>> {
        Ok(self.actors.get(&id).map(|a| a.clone()))
    }

    async fn find_by_role(&self, role: Role) -> anyhow::Result<Vec<Actor>> {
        let matching = self
            .actors
            .iter()
            .filter(|a| a.role == role)
            .map(|a| a.clone())
            .collect();
        Ok(sorted(matching, |a| a.id))
    }

    async fn save_actor(&self, actor: &Actor) -> anyhow::Result<()> {
        self.check_writable()?;
        anyhow::ensure!(
            self.actors.contains_key(&actor.id),
            "actor {} does not exist",
            actor.id
        );
        self.actors.insert(actor.id, actor.clone());
        self.mutated();
        Ok(())
    }
}

#[async_trait]
impl PolicyStore for MemoryStore {
    async fn find_policy(&self, id: PolicyId) -> anyhow::Result<Option<Policy>> {
        Ok(self.policies.get(&id).map(|p| p.clone()))
    }

    async fn find_offer(&self, id: PolicyOfferId) -> anyhow::Result<Option<PolicyOffer>> {
        Ok(self.offers.get(&id).map(|o| o.clone()))
    }

    async fn create_policy(&self, policy: NewPolicy) -> anyhow::Result<Policy> {
        self.check_writable()?;
        let created = Policy {
            id: PolicyId(self.issue_id()),
            policy_number: policy.policy_number,
            holder: policy.holder,
            status: policy.status,
            premium: policy.premium,
            coverage: policy.coverage,
            start_date: policy.start_date,
            end_date: policy.end_date,
        };
        self.policies.insert(created.id, created.clone());
        self.mutated();
        Ok(created)
    }

    async fn remove_policy(&self, id: PolicyId) -> anyhow::Result<()> {
        self.check_writable()?;
        if self.policies.remove(&id).is_some() {
            self.mutated();
        }
        Ok(())
    }
}

#[async_trait]
impl ClaimStore for MemoryStore {
    async fn insert_claim(&self, claim: NewClaim) -> anyhow::Result<Claim> {
        self.check_writable()?;
        let created = Claim {
            id: ClaimId(self.issue_id()),
            claim_number: claim.claim_number,
            policy_id: claim.policy_id,
            amount: claim.amount,
            status: claim.status,
            claim_date: claim.claim_date,
            notes: claim.notes,
            document_path: claim.document_path,
        };
        self.claims.insert(created.id, created.clone());
        self.mutated();
        Ok(created)
    }

    async fn claims_between(&self, from: NaiveDate, to: NaiveDate) -> anyhow::Result<Vec<Claim>> {
        let matching = self
            .claims
            .iter()
            .filter(|c| within(c.claim_date, from, to))
            .map(|c| c.clone())
            .collect();
        Ok(sorted(matching, |c| c.id))
    }
}

#[async_trait]
impl PaymentStore for MemoryStore {
    async fn find_payment(&self, id: PaymentId) -> anyhow::Result<Option<Payment>> {
        Ok(self.payments.get(&id).map(|p| p.clone()))
    }

    async fn insert_payment(&self, payment: NewPayment) -> anyhow::Result<Payment> {
        self.check_writable()?;
        let created = Payment {
            id: PaymentId(self.issue_id()),
            policy_id: payment.policy_id,
            amount: payment.amount,
            due_date: payment.due_date,
            payment_date: payment.payment_date,
            status: payment.status,
        };
        self.payments.insert(created.id, created.clone());
        self.mutated();
        Ok(created)
    }

    async fn payments_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<Payment>> {
        let matching = self
            .payments
            .iter()
            .filter(|p| p.payment_date.is_some_and(|d| within(d, from, to)))
            .map(|p| p.clone())
            .collect();
        Ok(sorted(matching, |p| p.id))
    }
}

#[async_trait]
impl InquiryStore for MemoryStore {
    async fn insert_inquiry(&self, inquiry: NewInquiry) -> anyhow::Result<Inquiry> {
        self.check_writable()?;
        let created = Inquiry {
            id: InquiryId(self.issue_id()),
            customer_id: inquiry.customer_id,
            inquiry_type: inquiry.inquiry_type,
            title: inquiry.title,
            description: inquiry.description,
            status: inquiry.status,
            resolution_date: None,
        };
        self.inquiries.insert(created.id, created.clone());
        self.mutated();
        Ok(created)
    }

    async fn inquiries_resolved_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<Inquiry>> {
        let matching = self
            .inquiries
            .iter()
            .filter(|i| i.resolution_date.is_some_and(|d| within(d, from, to)))
            .map(|i| i.clone())
            .collect();
        Ok(sorted(matching, |i| i.id))
    }
}

#[async_trait]
impl CampaignStore for MemoryStore {
    async fn find_campaign(&self, id: CampaignId) -> anyhow::Result<Option<Campaign>> {
        Ok(self.campaigns.get(&id).map(|c| c.clone()))
    }

    async fn insert_campaign(&self, campaign: NewCampaign) -> anyhow::Result<Campaign> {
        self.check_writable()?;
        let created = Campaign {
            id: CampaignId(self.issue_id()),
            name: campaign.name,
            channel: campaign.channel,
            description: campaign.description,
            target_segment: campaign.target_segment,
            start_date: campaign.start_date,
            end_date: campaign.end_date,
        };
        self.campaigns.insert(created.id, created.clone());
        self.mutated();
        Ok(created)
    }
}

#[async_trait]
impl AuditLog for MemoryStore {
    async fn append(&self, entry: AuditEntry) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.fail_audit.load(Ordering::SeqCst),
            "audit sink unavailable"
        );
        self.audit.lock().push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use healthins_core::{ClaimStatus, Money};

    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn new_claim(d: u32) -> NewClaim {
        NewClaim {
            claim_number: format!("CLM-{d}"),
            policy_id: PolicyId(1),
            amount: Money::from_major(10),
            status: ClaimStatus::Pending,
            claim_date: date(d),
            notes: String::new(),
            document_path: "N/A".into(),
        }
    }

    #[tokio::test]
    async fn insert_issues_ids_and_counts_mutations() {
        let store = MemoryStore::new();
        let a = store.insert_claim(new_claim(1)).await.unwrap();
        let b = store.insert_claim(new_claim(2)).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.mutation_count(), 2);
        assert_eq!(store.all_claims().len(), 2);
    }

    #[tokio::test]
    async fn claims_between_is_inclusive() {
        let store = MemoryStore::new();
        for d in [1, 5, 10, 15] {
            store.insert_claim(new_claim(d)).await.unwrap();
        }
        let found = store.claims_between(date(5), date(10)).await.unwrap();
        let days: Vec<_> = found.iter().map(|c| c.claim_number.as_str()).collect();
        assert_eq!(days, vec!["CLM-5", "CLM-10"]);
    }

    #[tokio::test]
    async fn failing_writes_leave_store_untouched() {
        let store = MemoryStore::new();
        store.fail_writes(true);
        assert!(store.insert_claim(new_claim(1)).await.is_err());
        assert_eq!(store.mutation_count(), 0);
        assert!(store.all_claims().is_empty());
    }

    #[tokio::test]
    async fn save_actor_requires_existing_record() {
        let store = MemoryStore::new();
        let actor = Actor {
            id: ActorId(7),
            username: "u".into(),
            name: "n".into(),
            email: "e@example.com".into(),
            phone: None,
            contact: None,
            active: true,
            role: Role::Customer,
        };
        assert!(store.save_actor(&actor).await.is_err());
        store.seed_actor(actor.clone());
        assert!(store.save_actor(&actor).await.is_ok());
        assert_eq!(store.find_by_role(Role::Customer).await.unwrap().len(), 1);
        assert!(store.find_by_role(Role::Admin).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn audit_append_can_be_made_to_fail() {
        let store = MemoryStore::new();
        store.fail_audit(true);
        let entry = AuditEntry {
            actor_id: ActorId(1),
            action: "x".into(),
            details: String::new(),
            at: 0,
        };
        assert!(store.append(entry.clone()).await.is_err());
        store.fail_audit(false);
        store.append(entry).await.unwrap();
        assert_eq!(store.audit_entries().len(), 1);
    }
}
