//! Report-data strategies: each one knows how to fetch its records for a date
//! range, what the header row looks like, and how to turn a record into cells.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use healthins_core::{
    Claim, ClaimStore, Inquiry, InquiryStore, Payment, PaymentStore, PolicyId, PolicyStore,
};

use crate::error::OperationError;
use crate::service::registry::Keyed;

/// Placeholder written for absent cells.
pub const MISSING_CELL: &str = "N/A";

// ---------------------------------------------------------------------------
// Records and sinks
// ---------------------------------------------------------------------------

/// One row's worth of source data, with any joined fields already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportRecord {
    Claim {
        claim: Claim,
        policy_number: Option<String>,
    },
    Payment {
        payment: Payment,
        policy_number: Option<String>,
    },
    Inquiry(Inquiry),
}

/// Destination for rendered rows.
pub trait TableSink {
    /// Append one row of cells.
    ///
    /// # Errors
    ///
    /// Returns an error if the row does not fit the sink's shape.
    fn push_row(&mut self, cells: Vec<String>) -> anyhow::Result<()>;
}

/// In-memory table: a header plus rows of exactly the header's width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    #[must_use]
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

impl TableSink for Table {
    fn push_row(&mut self, cells: Vec<String>) -> anyhow::Result<()> {
        anyhow::ensure!(
            cells.len() == self.header.len(),
            "row has {} cells but the header has {} columns",
            cells.len(),
            self.header.len()
        );
        self.rows.push(cells);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ReportStrategy trait
// ---------------------------------------------------------------------------

/// A report type selectable by key.
#[async_trait]
pub trait ReportStrategy: Keyed {
    /// Human-readable title handed to the renderer.
    fn title(&self) -> &str;

    /// Records in `from..=to`, in store order.
    async fn data_for(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ReportRecord>, OperationError>;

    /// Column names, in order.
    fn header_row(&self) -> Vec<String>;

    /// Render `record` into one row of `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidState`] when handed a record of a
    /// different report type, or the sink's error if it rejects the row.
    fn append_row(
        &self,
        sink: &mut dyn TableSink,
        record: &ReportRecord,
    ) -> Result<(), OperationError>;
}

fn header(columns: &[&str]) -> Vec<String> {
    columns.iter().map(ToString::to_string).collect()
}

fn or_missing(value: Option<impl ToString>) -> String {
    value.map_or_else(|| MISSING_CELL.to_string(), |v| v.to_string())
}

fn mismatched(strategy: &str, record: &ReportRecord) -> OperationError {
    let found = match record {
        ReportRecord::Claim { .. } => "claim",
        ReportRecord::Payment { .. } => "payment",
        ReportRecord::Inquiry(_) => "inquiry",
    };
    OperationError::InvalidState(format!("{strategy} report cannot render a {found} record"))
}

/// Looks up each distinct policy once and returns id -> policy number.
async fn policy_numbers(
    policies: &dyn PolicyStore,
    ids: Vec<PolicyId>,
) -> Result<HashMap<PolicyId, String>, OperationError> {
    let mut numbers = HashMap::new();
    for id in ids {
        if numbers.contains_key(&id) {
            continue;
        }
        if let Some(policy) = policies.find_policy(id).await? {
            numbers.insert(id, policy.policy_number);
        }
    }
    Ok(numbers)
}

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

pub struct ClaimsReport {
    claims: Arc<dyn ClaimStore>,
    policies: Arc<dyn PolicyStore>,
}

impl ClaimsReport {
    pub const KEY: &'static str = "claims";

    #[must_use]
    pub fn new(claims: Arc<dyn ClaimStore>, policies: Arc<dyn PolicyStore>) -> Self {
        Self { claims, policies }
    }
}

impl Keyed for ClaimsReport {
    fn key(&self) -> &str {
        Self::KEY
    }
}

#[async_trait]
impl ReportStrategy for ClaimsReport {
    fn title(&self) -> &str {
        "Claims Report"
    }

    async fn data_for(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ReportRecord>, OperationError> {
        let claims = self.claims.claims_between(from, to).await?;
        let ids = claims.iter().map(|c| c.policy_id).collect();
        let numbers = policy_numbers(self.policies.as_ref(), ids).await?;
        Ok(claims
            .into_iter()
            .map(|claim| ReportRecord::Claim {
                policy_number: numbers.get(&claim.policy_id).cloned(),
                claim,
            })
            .collect())
    }

    fn header_row(&self) -> Vec<String> {
        header(&["ID", "Policy Number", "Status", "Notes"])
    }

    fn append_row(
        &self,
        sink: &mut dyn TableSink,
        record: &ReportRecord,
    ) -> Result<(), OperationError> {
        let ReportRecord::Claim {
            claim,
            policy_number,
        } = record
        else {
            return Err(mismatched(Self::KEY, record));
        };
        let notes = Some(claim.notes.as_str()).filter(|n| !n.is_empty());
        sink.push_row(vec![
            claim.id.to_string(),
            or_missing(policy_number.as_deref()),
            claim.status.as_str().to_string(),
            or_missing(notes),
        ])?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

pub struct PaymentsReport {
    payments: Arc<dyn PaymentStore>,
    policies: Arc<dyn PolicyStore>,
}

impl PaymentsReport {
    pub const KEY: &'static str = "payments";

    #[must_use]
    pub fn new(payments: Arc<dyn PaymentStore>, policies: Arc<dyn PolicyStore>) -> Self {
        Self { payments, policies }
    }
}

impl Keyed for PaymentsReport {
    fn key(&self) -> &str {
        Self::KEY
    }
}

#[async_trait]
impl ReportStrategy for PaymentsReport {
    fn title(&self) -> &str {
        "Payments Report"
    }

    async fn data_for(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ReportRecord>, OperationError> {
        let payments = self.payments.payments_between(from, to).await?;
        let ids = payments.iter().map(|p| p.policy_id).collect();
        let numbers = policy_numbers(self.policies.as_ref(), ids).await?;
        Ok(payments
            .into_iter()
            .map(|payment| ReportRecord::Payment {
                policy_number: numbers.get(&payment.policy_id).cloned(),
                payment,
            })
            .collect())
    }

    fn header_row(&self) -> Vec<String> {
        header(&["ID", "Policy Number", "Status", "Amount"])
    }

    fn append_row(
        &self,
        sink: &mut dyn TableSink,
        record: &ReportRecord,
    ) -> Result<(), OperationError> {
        let ReportRecord::Payment {
            payment,
            policy_number,
        } = record
        else {
            return Err(mismatched(Self::KEY, record));
        };
        sink.push_row(vec![
            payment.id.to_string(),
            or_missing(policy_number.as_deref()),
            payment.status.as_str().to_string(),
            payment.amount.to_string(),
        ])?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Inquiries
// ---------------------------------------------------------------------------

pub struct InquiriesReport {
    inquiries: Arc<dyn InquiryStore>,
}

impl InquiriesReport {
    pub const KEY: &'static str = "inquiries";

    #[must_use]
    pub fn new(inquiries: Arc<dyn InquiryStore>) -> Self {
        Self { inquiries }
    }
}

impl Keyed for InquiriesReport {
    fn key(&self) -> &str {
        Self::KEY
    }
}

#[async_trait]
impl ReportStrategy for InquiriesReport {
    fn title(&self) -> &str {
        "Inquiries Report"
    }

    async fn data_for(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ReportRecord>, OperationError> {
        let inquiries = self.inquiries.inquiries_resolved_between(from, to).await?;
        Ok(inquiries.into_iter().map(ReportRecord::Inquiry).collect())
    }

    fn header_row(&self) -> Vec<String> {
        header(&["ID", "Type", "Status", "Resolution Date"])
    }

    fn append_row(
        &self,
        sink: &mut dyn TableSink,
        record: &ReportRecord,
    ) -> Result<(), OperationError> {
        let ReportRecord::Inquiry(inquiry) = record else {
            return Err(mismatched(Self::KEY, record));
        };
        let inquiry_type = Some(inquiry.inquiry_type.as_str()).filter(|t| !t.is_empty());
        sink.push_row(vec![
            inquiry.id.to_string(),
            or_missing(inquiry_type),
            inquiry.status.as_str().to_string(),
            or_missing(inquiry.resolution_date),
        ])?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use healthins_core::{
        ActorId, ClaimId, ClaimStatus, InquiryId, InquiryStatus, Money, PaymentId, PaymentStatus,
    };

    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn claim(notes: &str) -> Claim {
        Claim {
            id: ClaimId(11),
            claim_number: "CLM-1".into(),
            policy_id: PolicyId(1),
            amount: Money::from_major(100),
            status: ClaimStatus::Pending,
            claim_date: date(3),
            notes: notes.into(),
            document_path: "N/A".into(),
        }
    }

    struct NoStore;

    #[async_trait]
    impl InquiryStore for NoStore {
        async fn insert_inquiry(
            &self,
            _inquiry: healthins_core::NewInquiry,
        ) -> anyhow::Result<Inquiry> {
            anyhow::bail!("read-only")
        }

        async fn inquiries_resolved_between(
            &self,
            _from: NaiveDate,
            _to: NaiveDate,
        ) -> anyhow::Result<Vec<Inquiry>> {
            anyhow::bail!("store offline")
        }
    }

    #[test]
    fn table_rejects_rows_of_wrong_width() {
        let mut table = Table::new(header(&["A", "B"]));
        assert!(table.push_row(vec!["1".into()]).is_err());
        assert!(table.push_row(vec!["1".into(), "2".into()]).is_ok());
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn claim_row_fills_missing_cells() {
        let strategy = ClaimsReport::new(
            Arc::new(crate::storage::MemoryStore::new()),
            Arc::new(crate::storage::MemoryStore::new()),
        );
        let mut table = Table::new(strategy.header_row());
        strategy
            .append_row(
                &mut table,
                &ReportRecord::Claim {
                    claim: claim(""),
                    policy_number: None,
                },
            )
            .unwrap();
        assert_eq!(table.rows()[0], vec!["11", "N/A", "PENDING", "N/A"]);
    }

    #[test]
    fn payment_row_formats_amount() {
        let strategy = PaymentsReport::new(
            Arc::new(crate::storage::MemoryStore::new()),
            Arc::new(crate::storage::MemoryStore::new()),
        );
        let payment = Payment {
            id: PaymentId(4),
            policy_id: PolicyId(1),
            amount: Money::from_cents(123_456),
            due_date: date(1),
            payment_date: Some(date(2)),
            status: PaymentStatus::Paid,
        };
        let mut table = Table::new(strategy.header_row());
        strategy
            .append_row(
                &mut table,
                &ReportRecord::Payment {
                    payment,
                    policy_number: Some("POL-1".into()),
                },
            )
            .unwrap();
        assert_eq!(table.rows()[0], vec!["4", "POL-1", "PAID", "1234.56"]);
    }

    #[test]
    fn inquiry_row_renders_resolution_date() {
        let strategy = InquiriesReport::new(Arc::new(NoStore));
        let inquiry = Inquiry {
            id: InquiryId(9),
            customer_id: ActorId(7),
            inquiry_type: "BILLING".into(),
            title: "t".into(),
            description: "d".into(),
            status: InquiryStatus::Resolved,
            resolution_date: Some(date(20)),
        };
        let mut table = Table::new(strategy.header_row());
        strategy
            .append_row(&mut table, &ReportRecord::Inquiry(inquiry))
            .unwrap();
        assert_eq!(table.rows()[0], vec!["9", "BILLING", "RESOLVED", "2024-05-20"]);
    }

    #[test]
    fn mismatched_record_is_invalid_state() {
        let strategy = InquiriesReport::new(Arc::new(NoStore));
        let mut table = Table::new(strategy.header_row());
        let err = strategy
            .append_row(
                &mut table,
                &ReportRecord::Claim {
                    claim: claim("x"),
                    policy_number: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, OperationError::InvalidState(_)));
        assert_eq!(table.row_count(), 0);
    }

    #[tokio::test]
    async fn store_failure_propagates_unchanged() {
        let strategy = InquiriesReport::new(Arc::new(NoStore));
        let err = strategy.data_for(date(1), date(31)).await.unwrap_err();
        assert!(matches!(err, OperationError::Store(_)));
        assert_eq!(err.to_string(), "store offline");
    }

    #[tokio::test]
    async fn claims_report_resolves_policy_numbers() {
        use healthins_core::{Policy, PolicyStatus};

        let store = Arc::new(crate::storage::MemoryStore::new());
        store.seed_policy(Policy {
            id: PolicyId(1),
            policy_number: "P-1".into(),
            holder: ActorId(7),
            status: PolicyStatus::Active,
            premium: Money::from_major(500),
            coverage: "HEALTH".into(),
            start_date: date(1),
            end_date: date(31),
        });
        store.seed_claim(claim("first"));
        store.seed_claim(Claim {
            id: ClaimId(12),
            policy_id: PolicyId(9),
            ..claim("orphan")
        });

        let strategy = ClaimsReport::new(store.clone(), store);
        let records = strategy.data_for(date(1), date(31)).await.unwrap();

        let numbers: Vec<_> = records
            .iter()
            .map(|r| match r {
                ReportRecord::Claim { policy_number, .. } => policy_number.clone(),
                _ => panic!("unexpected record"),
            })
            .collect();
        assert_eq!(numbers, vec![Some("P-1".to_string()), None]);
    }

    #[test]
    fn strategies_report_their_keys() {
        let store = Arc::new(crate::storage::MemoryStore::new());
        assert_eq!(ClaimsReport::new(store.clone(), store.clone()).key(), "claims");
        assert_eq!(PaymentsReport::new(store.clone(), store.clone()).key(), "payments");
        assert_eq!(InquiriesReport::new(store).key(), "inquiries");
    }
}
