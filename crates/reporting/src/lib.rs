//! Campaign reporting — cohort selection, campaign metrics and leaderboards,
//! acquisition activity, and the multi-campaign segmentation runner.

pub mod activity;
pub mod batch;
pub mod cohort;
pub mod dashboard;
pub mod sources;

pub use batch::{CampaignBatch, CampaignOutcome, SchemeChoice};
pub use cohort::{CohortFilter, CountryFilter};
pub use dashboard::{CampaignMetrics, DashboardSummary, Leaderboard};
pub use sources::{CampaignRegistry, LearnerProvider, Snapshot};
