//! Campaign-execution strategies, selected by applicability to a campaign.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use healthins_core::{Actor, Campaign, CampaignChannel, Notifier, Value};

use crate::error::OperationError;
use crate::service::registry::Keyed;

/// Outcome metrics reported by a campaign run, keyed by metric name.
pub type CampaignOutcome = BTreeMap<String, Value>;

/// A campaign executor.
#[async_trait]
pub trait CampaignStrategy: Keyed {
    /// Pure predicate over the campaign; must not touch any collaborator.
    fn is_applicable(&self, campaign: &Campaign) -> bool;

    /// Run the campaign against `targets` and report outcome metrics.
    async fn run(
        &self,
        campaign: &Campaign,
        targets: &[Actor],
    ) -> Result<CampaignOutcome, OperationError>;
}

// ---------------------------------------------------------------------------
// Email
// ---------------------------------------------------------------------------

/// Sends one email per target. Individual delivery failures are counted,
/// not raised.
pub struct EmailCampaign {
    notifier: Arc<dyn Notifier>,
    default_message: String,
}

impl EmailCampaign {
    pub const KEY: &'static str = "EMAIL_CAMPAIGN";

    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>, default_message: impl Into<String>) -> Self {
        Self {
            notifier,
            default_message: default_message.into(),
        }
    }
}

impl Keyed for EmailCampaign {
    fn key(&self) -> &str {
        Self::KEY
    }
}

#[async_trait]
impl CampaignStrategy for EmailCampaign {
    fn is_applicable(&self, campaign: &Campaign) -> bool {
        campaign.channel == CampaignChannel::Email
    }

    async fn run(
        &self,
        campaign: &Campaign,
        targets: &[Actor],
    ) -> Result<CampaignOutcome, OperationError> {
        let subject = format!("Health Insurance: {}", campaign.name);
        let body = campaign
            .description
            .as_deref()
            .unwrap_or(self.default_message.as_str());

        let mut sent = 0usize;
        let mut failed = 0usize;
        for target in targets {
            match self.notifier.send(&target.email, &subject, body).await {
                Ok(()) => sent += 1,
                Err(err) => {
                    failed += 1;
                    tracing::warn!(
                        campaign_id = %campaign.id,
                        recipient = %target.email,
                        error = %err,
                        "campaign email failed"
                    );
                }
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let success_rate = if targets.is_empty() {
            0.0
        } else {
            sent as f64 / targets.len() as f64 * 100.0
        };

        let mut outcome = CampaignOutcome::new();
        outcome.insert("strategy".into(), Self::KEY.into());
        outcome.insert("sentCount".into(), sent.into());
        outcome.insert("failedCount".into(), failed.into());
        outcome.insert("totalTargeted".into(), targets.len().into());
        outcome.insert("successRate".into(), success_rate.into());
        Ok(outcome)
    }
}

// ---------------------------------------------------------------------------
// Social media
// ---------------------------------------------------------------------------

/// Posts the campaign to social platforms and reports projected reach.
#[derive(Debug, Default)]
pub struct SocialMediaCampaign;

impl SocialMediaCampaign {
    pub const KEY: &'static str = "SOCIAL_MEDIA_CAMPAIGN";
    pub const PLATFORMS: &'static str = "Facebook, Instagram, Twitter";
}

impl Keyed for SocialMediaCampaign {
    fn key(&self) -> &str {
        Self::KEY
    }
}

#[async_trait]
impl CampaignStrategy for SocialMediaCampaign {
    fn is_applicable(&self, campaign: &Campaign) -> bool {
        campaign.channel == CampaignChannel::SocialMedia
    }

    async fn run(
        &self,
        campaign: &Campaign,
        targets: &[Actor],
    ) -> Result<CampaignOutcome, OperationError> {
        let targeted = targets.len();
        // Shares extend reach to 2.5x the audience; 15% are expected to engage.
        let reach = targeted * 5 / 2;
        let engagement = targeted * 15 / 100;

        tracing::info!(
            campaign_id = %campaign.id,
            campaign = %campaign.name,
            reach,
            "social media campaign posted"
        );

        let mut outcome = CampaignOutcome::new();
        outcome.insert("strategy".into(), Self::KEY.into());
        outcome.insert("targetedCustomers".into(), targeted.into());
        outcome.insert("estimatedReach".into(), reach.into());
        outcome.insert("expectedEngagement".into(), engagement.into());
        outcome.insert("campaignPosted".into(), true.into());
        outcome.insert("platform".into(), Self::PLATFORMS.into());
        Ok(outcome)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use healthins_core::{ActorId, CampaignId, Role};

    use super::*;
    use crate::notify::OutboxNotifier;

    fn campaign(channel: CampaignChannel, description: Option<&str>) -> Campaign {
        Campaign {
            id: CampaignId(1),
            name: "Spring Wellness".into(),
            channel,
            description: description.map(str::to_string),
            target_segment: None,
            start_date: None,
            end_date: None,
        }
    }

    fn customer(id: u64, email: &str) -> Actor {
        Actor {
            id: ActorId(id),
            username: format!("user{id}"),
            name: format!("Customer {id}"),
            email: email.into(),
            phone: None,
            contact: None,
            active: true,
            role: Role::Customer,
        }
    }

    #[test]
    fn applicability_follows_channel() {
        let email = EmailCampaign::new(Arc::new(OutboxNotifier::new()), "hi");
        let social = SocialMediaCampaign;
        let c = campaign(CampaignChannel::Email, None);
        assert!(email.is_applicable(&c));
        assert!(!social.is_applicable(&c));
        assert!(!email.is_applicable(&campaign(CampaignChannel::Sms, None)));
    }

    #[tokio::test]
    async fn email_campaign_counts_failures() {
        let notifier = Arc::new(OutboxNotifier::new());
        notifier.fail_for("bad@example.com");
        let strategy = EmailCampaign::new(notifier.clone(), "default body");
        let targets = vec![
            customer(1, "a@example.com"),
            customer(2, "bad@example.com"),
            customer(3, "c@example.com"),
            customer(4, "d@example.com"),
        ];

        let outcome = strategy
            .run(&campaign(CampaignChannel::Email, None), &targets)
            .await
            .unwrap();

        assert_eq!(outcome["sentCount"], Value::Int(3));
        assert_eq!(outcome["failedCount"], Value::Int(1));
        assert_eq!(outcome["totalTargeted"], Value::Int(4));
        assert_eq!(outcome["successRate"], Value::Float(75.0));
        let sent = notifier.sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].subject, "Health Insurance: Spring Wellness");
        assert_eq!(sent[0].body, "default body");
    }

    #[tokio::test]
    async fn email_campaign_prefers_description() {
        let notifier = Arc::new(OutboxNotifier::new());
        let strategy = EmailCampaign::new(notifier.clone(), "default body");
        strategy
            .run(
                &campaign(CampaignChannel::Email, Some("20% off dental")),
                &[customer(1, "a@example.com")],
            )
            .await
            .unwrap();
        assert_eq!(notifier.sent()[0].body, "20% off dental");
    }

    #[tokio::test]
    async fn email_campaign_with_no_targets_has_zero_rate() {
        let strategy = EmailCampaign::new(Arc::new(OutboxNotifier::new()), "x");
        let outcome = strategy
            .run(&campaign(CampaignChannel::Email, None), &[])
            .await
            .unwrap();
        assert_eq!(outcome["successRate"], Value::Float(0.0));
    }

    #[tokio::test]
    async fn social_campaign_projects_reach() {
        let targets: Vec<Actor> = (1..=10)
            .map(|i| customer(i, &format!("{i}@example.com")))
            .collect();
        let outcome = SocialMediaCampaign
            .run(&campaign(CampaignChannel::SocialMedia, None), &targets)
            .await
            .unwrap();
        assert_eq!(outcome["strategy"], Value::from("SOCIAL_MEDIA_CAMPAIGN"));
        assert_eq!(outcome["targetedCustomers"], Value::Int(10));
        assert_eq!(outcome["estimatedReach"], Value::Int(25));
        assert_eq!(outcome["expectedEngagement"], Value::Int(1));
        assert_eq!(outcome["campaignPosted"], Value::Bool(true));
    }
}
