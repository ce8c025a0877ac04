//! Interchangeable behaviors selected through a
//! [`StrategyRegistry`](crate::service::registry::StrategyRegistry).

pub mod campaign;
pub mod report;

pub use campaign::{CampaignOutcome, CampaignStrategy, EmailCampaign, SocialMediaCampaign};
pub use report::{
    ClaimsReport, InquiriesReport, PaymentsReport, ReportRecord, ReportStrategy, Table, TableSink,
};
