//! Cohort selection — which learners a campaign acquired.

use campaign_core::types::{AppCatalog, Campaign, Learner};
use campaign_core::{CampaignError, CampaignResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountryFilter {
    All,
    Only(String),
}

impl CountryFilter {
    pub fn matches(&self, country: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == country,
        }
    }
}

/// Learners acquired through one app, inside an inclusive date window,
/// optionally in one country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortFilter {
    pub app_id: String,
    pub country: CountryFilter,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CohortFilter {
    pub fn for_campaign(campaign: &Campaign, catalog: &AppCatalog) -> CampaignResult<Self> {
        let app = catalog
            .by_language(&campaign.language)
            .ok_or_else(|| CampaignError::UnknownLanguage(campaign.language.clone()))?;
        let (start, end) = campaign.cohort_window();
        let country = if campaign.targets_all_countries() {
            CountryFilter::All
        } else {
            CountryFilter::Only(campaign.country.clone())
        };
        Ok(Self {
            app_id: app.app_id.clone(),
            country,
            start,
            end,
        })
    }

    pub fn matches(&self, learner: &Learner) -> bool {
        learner.app_id == self.app_id
            && self.country.matches(&learner.country)
            && learner.acquisition_date >= self.start
            && learner.acquisition_date <= self.end
    }

    pub fn select(&self, learners: &[Learner]) -> Vec<Learner> {
        learners.iter().filter(|l| self.matches(l)).cloned().collect()
    }
}

/// Looks a campaign row up by name and rejects rows with unusable spend.
pub fn find_campaign<'a>(campaigns: &'a [Campaign], name: &str) -> CampaignResult<&'a Campaign> {
    let campaign = campaigns
        .iter()
        .find(|c| c.name == name)
        .ok_or_else(|| CampaignError::UnknownCampaign(name.to_string()))?;
    campaign.validate()?;
    Ok(campaign)
}
