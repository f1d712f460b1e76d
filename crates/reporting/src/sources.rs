//! Data providers — the campaign registry and the learner warehouse, plus a
//! JSON snapshot that serves both from memory.

use campaign_core::types::{AppCatalog, Campaign, Learner};
use campaign_core::{CampaignError, CampaignResult};
use campaign_segmentation::CutPoints;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::cohort::CohortFilter;

/// Campaign spend, app reference table and per-language quartile cut points.
pub trait CampaignRegistry: Send + Sync {
    fn campaigns(&self) -> CampaignResult<Vec<Campaign>>;

    fn catalog(&self) -> CampaignResult<AppCatalog>;

    /// `Ok(None)` when the language has no cut points configured.
    fn cut_points(&self, language: &str) -> CampaignResult<Option<CutPoints>>;
}

/// Learner rows from the event warehouse.
pub trait LearnerProvider: Send + Sync {
    fn learners(&self, filter: &CohortFilter) -> CampaignResult<Vec<Learner>>;
}

/// Cut points exactly as entered in the reference table; validated on use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuartileCutPoints {
    pub q1: u32,
    pub q2: u32,
    pub q3: u32,
}

impl QuartileCutPoints {
    pub fn validate(&self) -> CampaignResult<CutPoints> {
        CutPoints::new(self.q1, self.q2, self.q3)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub campaigns: Vec<Campaign>,
    #[serde(default)]
    pub apps: AppCatalog,
    /// Keyed by language.
    #[serde(default)]
    pub cut_points: BTreeMap<String, QuartileCutPoints>,
    #[serde(default)]
    pub learners: Vec<Learner>,
}

impl Snapshot {
    pub fn from_json(json: &str) -> CampaignResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> CampaignResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CampaignError::DataSource(format!("failed to read snapshot {}: {e}", path.display()))
        })?;
        let snapshot = Self::from_json(&raw)?;
        info!(
            path = %path.display(),
            campaigns = snapshot.campaigns.len(),
            apps = snapshot.apps.len(),
            learners = snapshot.learners.len(),
            "Snapshot loaded"
        );
        Ok(snapshot)
    }
}

impl CampaignRegistry for Snapshot {
    fn campaigns(&self) -> CampaignResult<Vec<Campaign>> {
        Ok(self.campaigns.clone())
    }

    fn catalog(&self) -> CampaignResult<AppCatalog> {
        Ok(self.apps.clone())
    }

    fn cut_points(&self, language: &str) -> CampaignResult<Option<CutPoints>> {
        self.cut_points
            .get(language)
            .map(QuartileCutPoints::validate)
            .transpose()
    }
}

impl LearnerProvider for Snapshot {
    fn learners(&self, filter: &CohortFilter) -> CampaignResult<Vec<Learner>> {
        Ok(filter.select(&self.learners))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::CountryFilter;
    use chrono::NaiveDate;

    const SNAPSHOT: &str = r#"{
        "campaigns": [
            {"name": "Yoruba Launch", "language": "Yoruba", "country": "All",
             "start_date": "2022-01-01", "end_date": "2022-02-01", "total_cost_usd": 1200.0}
        ],
        "apps": [
            {"app_id": "org.reading.yoruba", "language": "Yoruba", "total_levels": 40}
        ],
        "cut_points": {
            "Yoruba": {"q1": 5, "q2": 12, "q3": 25},
            "Hausa": {"q1": 12, "q2": 5, "q3": 25}
        },
        "learners": [
            {"id": "u1", "app_id": "org.reading.yoruba", "country": "Nigeria",
             "max_level_reached": 10, "acquisition_date": "2022-01-15"},
            {"id": "u2", "app_id": "org.reading.yoruba", "country": "Benin",
             "max_level_reached": 3, "acquisition_date": "2022-03-15"}
        ]
    }"#;

    #[test]
    fn test_snapshot_parses() {
        let snapshot = Snapshot::from_json(SNAPSHOT).unwrap();
        assert_eq!(snapshot.campaigns().unwrap().len(), 1);
        assert_eq!(snapshot.catalog().unwrap().total_levels("org.reading.yoruba"), Some(40));
    }

    #[test]
    fn test_cut_points_validated_per_language() {
        let snapshot = Snapshot::from_json(SNAPSHOT).unwrap();
        assert_eq!(snapshot.cut_points("Yoruba").unwrap().unwrap().q2(), 12);
        assert!(matches!(
            snapshot.cut_points("Hausa"),
            Err(CampaignError::InvalidCutPoints { .. })
        ));
        assert!(snapshot.cut_points("Igbo").unwrap().is_none());
    }

    #[test]
    fn test_learners_filtered() {
        let snapshot = Snapshot::from_json(SNAPSHOT).unwrap();
        let filter = CohortFilter {
            app_id: "org.reading.yoruba".to_string(),
            country: CountryFilter::All,
            start: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2022, 2, 28).unwrap(),
        };
        let learners = snapshot.learners(&filter).unwrap();
        assert_eq!(learners.len(), 1);
        assert_eq!(learners[0].id, "u1");
    }

    #[test]
    fn test_missing_file_is_data_source_error() {
        assert!(matches!(
            Snapshot::from_path("/nonexistent/snapshot.json"),
            Err(CampaignError::DataSource(_))
        ));
    }
}
