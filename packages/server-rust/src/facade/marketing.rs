//! Marketing entry points: campaign creation and execution.

use std::sync::Arc;

use healthins_core::{
    ActorId, ActorStore, Campaign, CampaignId, CampaignStore, MonotonicClock, NewCampaign, Role,
    Value,
};

use super::Collaborators;
use crate::error::OperationError;
use crate::events::{event_types, Event, EventBus, Subject};
use crate::service::config::BackofficeConfig;
use crate::service::registry::StrategyRegistry;
use crate::strategy::{CampaignOutcome, CampaignStrategy, EmailCampaign};

pub struct MarketingFacade {
    actors: Arc<dyn ActorStore>,
    campaigns: Arc<dyn CampaignStore>,
    clock: Arc<MonotonicClock>,
    strategies: StrategyRegistry<dyn CampaignStrategy>,
    bus: Arc<EventBus>,
    strict_resolution: bool,
}

impl MarketingFacade {
    #[must_use]
    pub fn new(
        collaborators: &Collaborators,
        strategies: StrategyRegistry<dyn CampaignStrategy>,
        bus: Arc<EventBus>,
        config: &BackofficeConfig,
    ) -> Self {
        Self {
            actors: Arc::clone(&collaborators.actors),
            campaigns: Arc::clone(&collaborators.campaigns),
            clock: Arc::clone(&collaborators.clock),
            strategies,
            bus,
            strict_resolution: config.strict_campaign_resolution,
        }
    }

    /// Persist a campaign and publish `CAMPAIGN_CREATED`.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for a blank name or an end date before the start
    /// date, or the store's failure.
    pub async fn create_campaign(
        &self,
        performed_by: ActorId,
        campaign: NewCampaign,
    ) -> Result<Campaign, OperationError> {
        if campaign.name.trim().is_empty() {
            return Err(OperationError::InvalidRequest(
                "campaign name is required".into(),
            ));
        }
        if let (Some(start), Some(end)) = (campaign.start_date, campaign.end_date) {
            if end < start {
                return Err(OperationError::InvalidRequest(format!(
                    "campaign end date {end} is before start date {start}"
                )));
            }
        }
        let campaign = self.campaigns.insert_campaign(campaign).await?;
        tracing::info!(campaign_id = %campaign.id, channel = campaign.channel.as_str(), "campaign created");

        let segment = campaign
            .target_segment
            .clone()
            .map_or(Value::Null, Value::from);
        let event = Event::new(
            event_types::CAMPAIGN_CREATED,
            Subject::Campaign(campaign.id.to_string()),
            performed_by,
            self.clock.now(),
        )
        .with("campaignType", campaign.channel.as_str())
        .with("targetSegment", segment);
        self.bus.publish(&event);
        Ok(campaign)
    }

    /// Run the one strategy applicable to the campaign against every
    /// customer and publish `CAMPAIGN_EXECUTED` with its outcome.
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` for an unknown campaign, `NoStrategyForCampaignType`
    /// when nothing applies, `AmbiguousStrategy` when several apply under
    /// strict resolution, or a collaborator failure.
    pub async fn execute_campaign(
        &self,
        performed_by: ActorId,
        campaign_id: CampaignId,
    ) -> Result<CampaignOutcome, OperationError> {
        let campaign = self.load(campaign_id).await?;
        let strategy = self.applicable_strategy(&campaign)?;
        let targets = self.actors.find_by_role(Role::Customer).await?;

        let outcome = strategy.run(&campaign, &targets).await?;
        tracing::info!(
            campaign_id = %campaign.id,
            strategy = strategy.key(),
            targets = targets.len(),
            "campaign executed"
        );

        let event = Event::new(
            event_types::CAMPAIGN_EXECUTED,
            Subject::Campaign(campaign.id.to_string()),
            performed_by,
            self.clock.now(),
        )
        .with_all(outcome.clone());
        self.bus.publish(&event);
        Ok(outcome)
    }

    /// Send the campaign by email regardless of its channel and publish
    /// `EMAIL_SENT` with delivery counts.
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` for an unknown campaign, `UnsupportedType` when no
    /// email strategy is registered, or a collaborator failure.
    pub async fn send_campaign_emails(
        &self,
        performed_by: ActorId,
        campaign_id: CampaignId,
    ) -> Result<CampaignOutcome, OperationError> {
        let campaign = self.load(campaign_id).await?;
        let strategy = self.strategies.resolve(EmailCampaign::KEY)?;
        let targets = self.actors.find_by_role(Role::Customer).await?;
        let outcome = strategy.run(&campaign, &targets).await?;

        let count = |key: &str| outcome.get(key).cloned().unwrap_or(Value::Int(0));
        let event = Event::new(
            event_types::EMAIL_SENT,
            Subject::Campaign(campaign.id.to_string()),
            performed_by,
            self.clock.now(),
        )
        .with("successCount", count("sentCount"))
        .with("failureCount", count("failedCount"))
        .with("totalCustomers", targets.len());
        self.bus.publish(&event);
        Ok(outcome)
    }

    /// Registered strategy keys, in registration order.
    #[must_use]
    pub fn available_strategies(&self) -> Vec<String> {
        self.strategies.keys()
    }

    async fn load(&self, campaign_id: CampaignId) -> Result<Campaign, OperationError> {
        self.campaigns
            .find_campaign(campaign_id)
            .await?
            .ok_or_else(|| OperationError::not_found("campaign", campaign_id))
    }

    fn applicable_strategy(
        &self,
        campaign: &Campaign,
    ) -> Result<Arc<dyn CampaignStrategy>, OperationError> {
        let mut matches = self
            .strategies
            .iter()
            .filter(|s| s.is_applicable(campaign));
        let Some(first) = matches.next() else {
            return Err(OperationError::NoStrategyForCampaignType(
                campaign.channel.as_str().to_string(),
            ));
        };
        let rest: Vec<&Arc<dyn CampaignStrategy>> = matches.collect();
        if rest.is_empty() {
            return Ok(Arc::clone(first));
        }

        let candidates: Vec<String> = std::iter::once(first)
            .chain(rest)
            .map(|s| s.key().to_string())
            .collect();
        if self.strict_resolution {
            return Err(OperationError::AmbiguousStrategy {
                subject: format!("campaign:{}", campaign.id),
                candidates,
            });
        }
        tracing::warn!(
            campaign_id = %campaign.id,
            ?candidates,
            chosen = first.key(),
            "several campaign strategies apply, using the first registered"
        );
        Ok(Arc::clone(first))
    }
}
