use std::sync::Arc;

use async_trait::async_trait;
use healthins_core::{Actor, Inquiry, InquiryStatus, InquiryStore, NewInquiry};

use crate::error::OperationError;
use crate::service::config::BackofficeConfig;
use crate::service::operation::PortalOperation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InquiryRequest {
    pub inquiry_type: String,
    pub title: String,
    pub description: String,
}

/// Opens a customer inquiry. Any active actor may submit one; no
/// notification is sent.
pub struct InquirySubmission {
    inquiries: Arc<dyn InquiryStore>,
    max_description_chars: usize,
}

impl InquirySubmission {
    #[must_use]
    pub fn new(inquiries: Arc<dyn InquiryStore>, config: &BackofficeConfig) -> Self {
        Self {
            inquiries,
            max_description_chars: config.inquiry_description_max_chars,
        }
    }
}

#[async_trait]
impl PortalOperation for InquirySubmission {
    type Request = InquiryRequest;
    type Grant = ();
    type Output = Inquiry;

    fn name(&self) -> &'static str {
        "inquiry_submission"
    }

    fn validate_request(&self, request: &InquiryRequest) -> Result<(), OperationError> {
        let required = [
            ("inquiry type", &request.inquiry_type),
            ("inquiry title", &request.title),
            ("inquiry description", &request.description),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(OperationError::InvalidRequest(format!("{field} is required")));
            }
        }
        if request.description.chars().count() > self.max_description_chars {
            return Err(OperationError::InvalidRequest(format!(
                "inquiry description cannot exceed {} characters",
                self.max_description_chars
            )));
        }
        Ok(())
    }

    async fn authorize(&self, _actor: &Actor, _request: &InquiryRequest) -> Result<(), OperationError> {
        Ok(())
    }

    async fn execute(
        &self,
        actor: &Actor,
        request: &InquiryRequest,
        _grant: (),
    ) -> Result<Inquiry, OperationError> {
        let inquiry = self
            .inquiries
            .insert_inquiry(NewInquiry {
                customer_id: actor.id,
                inquiry_type: request.inquiry_type.trim().to_string(),
                title: request.title.trim().to_string(),
                description: request.description.clone(),
                status: InquiryStatus::Open,
            })
            .await?;
        Ok(inquiry)
    }

    fn audit_details(&self, inquiry: &Inquiry) -> String {
        format!("inquiry {} ({})", inquiry.id, inquiry.inquiry_type)
    }
}

#[cfg(test)]
mod tests {
    use healthins_core::{ActorId, MonotonicClock, Role};

    use super::*;
    use crate::notify::OutboxNotifier;
    use crate::service::pipeline::{OperationPipeline, PipelineDeps};
    use crate::storage::MemoryStore;

    fn request(description: String) -> InquiryRequest {
        InquiryRequest {
            inquiry_type: "BILLING".into(),
            title: "Double charge".into(),
            description,
        }
    }

    fn fixture() -> (Arc<MemoryStore>, Arc<OutboxNotifier>, OperationPipeline<InquirySubmission>) {
        let store = Arc::new(MemoryStore::new());
        store.seed_actor(Actor {
            id: ActorId(7),
            username: "u7".into(),
            name: "User".into(),
            email: "u7@example.com".into(),
            phone: None,
            contact: None,
            active: true,
            role: Role::Customer,
        });
        let notifier = Arc::new(OutboxNotifier::new());
        let op = InquirySubmission::new(store.clone(), &BackofficeConfig::default());
        let deps = PipelineDeps {
            actors: store.clone(),
            audit: store.clone(),
            notifier: notifier.clone(),
            clock: Arc::new(MonotonicClock::system()),
        };
        (store, notifier, OperationPipeline::new(op, deps))
    }

    #[test]
    fn description_limit_counts_characters() {
        let (_, _, pipeline) = fixture();
        let op = pipeline.operation();
        // 1000 multi-byte characters are within the limit.
        assert!(op.validate_request(&request("é".repeat(1000))).is_ok());
        assert!(matches!(
            op.validate_request(&request("a".repeat(1001))),
            Err(OperationError::InvalidRequest(_))
        ));
    }

    #[test]
    fn blank_fields_are_rejected() {
        let (_, _, pipeline) = fixture();
        let op = pipeline.operation();
        let mut req = request("text".into());
        req.title = "  ".into();
        let err = op.validate_request(&req).unwrap_err();
        assert_eq!(err.to_string(), "invalid request: inquiry title is required");
    }

    #[tokio::test]
    async fn inquiry_is_opened_without_notification() {
        let (store, notifier, pipeline) = fixture();
        let inquiry = pipeline
            .execute(request("Charged twice in May".into()), ActorId(7))
            .await
            .unwrap();
        assert_eq!(inquiry.status, InquiryStatus::Open);
        assert_eq!(inquiry.customer_id, ActorId(7));
        assert_eq!(store.all_inquiries().len(), 1);
        assert_eq!(store.audit_entries().len(), 1);
        assert_eq!(notifier.attempts(), 0);
    }
}
