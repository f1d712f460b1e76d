use crate::error::{CampaignError, CampaignResult};
use chrono::{Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A learner row as returned by the event warehouse. One row per learner that
/// completed at least one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Learner {
    pub id: String,
    pub app_id: String,
    pub country: String,
    pub max_level_reached: u32,
    pub acquisition_date: NaiveDate,
}

/// One row of the app reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppEntry {
    pub app_id: String,
    pub language: String,
    /// Zero when the content size is not known yet.
    #[serde(default)]
    pub total_levels: u32,
    #[serde(default)]
    pub warehouse_project_id: Option<String>,
    #[serde(default)]
    pub warehouse_property_id: Option<String>,
}

/// Immutable app reference table keyed by app id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<AppEntry>", into = "Vec<AppEntry>")]
pub struct AppCatalog {
    entries: BTreeMap<String, AppEntry>,
}

impl AppCatalog {
    pub fn new(entries: impl IntoIterator<Item = AppEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|e| (e.app_id.clone(), e))
                .collect(),
        }
    }

    pub fn get(&self, app_id: &str) -> Option<&AppEntry> {
        self.entries.get(app_id)
    }

    pub fn by_language(&self, language: &str) -> Option<&AppEntry> {
        self.entries.values().find(|e| e.language == language)
    }

    /// Known content size for an app. Entries with zero levels count as unknown.
    pub fn total_levels(&self, app_id: &str) -> Option<u32> {
        self.get(app_id)
            .map(|e| e.total_levels)
            .filter(|&levels| levels > 0)
    }

    /// Mean content size over every entry with a known size.
    pub fn average_total_levels(&self) -> Option<f64> {
        let known: Vec<u32> = self
            .entries
            .values()
            .map(|e| e.total_levels)
            .filter(|&levels| levels > 0)
            .collect();
        if known.is_empty() {
            return None;
        }
        let sum: u64 = known.iter().map(|&l| u64::from(l)).sum();
        Some(sum as f64 / known.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<AppEntry>> for AppCatalog {
    fn from(entries: Vec<AppEntry>) -> Self {
        Self::new(entries)
    }
}

impl From<AppCatalog> for Vec<AppEntry> {
    fn from(catalog: AppCatalog) -> Self {
        catalog.entries.into_values().collect()
    }
}

/// Registry literal meaning "no country filter".
pub const ALL_COUNTRIES: &str = "All";

/// A campaign row from the campaign registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub name: String,
    pub language: String,
    /// A country name, or `"All"`.
    pub country: String,
    pub start_date: NaiveDate,
    /// Month-granular end date as entered in the registry.
    pub end_date: NaiveDate,
    pub total_cost_usd: f64,
}

impl Campaign {
    /// Inclusive acquisition window. The registry end date is extended by one
    /// month minus a day so a campaign entered as ending in March covers March.
    pub fn cohort_window(&self) -> (NaiveDate, NaiveDate) {
        let end = self
            .end_date
            .checked_add_months(Months::new(1))
            .map(|d| d - Duration::days(1))
            .unwrap_or(self.end_date);
        (self.start_date, end)
    }

    pub fn age_days(&self) -> i64 {
        let (start, end) = self.cohort_window();
        (end - start).num_days()
    }

    pub fn targets_all_countries(&self) -> bool {
        self.country == ALL_COUNTRIES
    }

    /// Spend must be a finite, non-negative amount.
    pub fn validate(&self) -> CampaignResult<()> {
        if !self.total_cost_usd.is_finite() || self.total_cost_usd < 0.0 {
            return Err(CampaignError::DataSource(format!(
                "campaign {} has invalid total cost {}",
                self.name, self.total_cost_usd
            )));
        }
        Ok(())
    }
}
