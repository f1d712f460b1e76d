//! Progress normalizer — turns a learner's max level into a completion fraction.

use campaign_core::config::MissingCatalogPolicy;
use campaign_core::types::{AppCatalog, Learner};
use campaign_core::{CampaignError, CampaignResult};

/// `max_level_reached / total_levels`, unclamped. Bonus content can push the
/// fraction above 1.0.
pub fn progress_fraction(app_id: &str, max_level_reached: u32, total_levels: u32) -> CampaignResult<f64> {
    if total_levels == 0 {
        return Err(CampaignError::MissingCatalogEntry {
            app_id: app_id.to_string(),
        });
    }
    Ok(f64::from(max_level_reached) / f64::from(total_levels))
}

/// Resolves content sizes from the app catalog under an explicit missing-entry policy.
pub struct ProgressNormalizer<'a> {
    catalog: &'a AppCatalog,
    fallback_levels: Option<f64>,
}

impl<'a> ProgressNormalizer<'a> {
    pub fn new(catalog: &'a AppCatalog, policy: MissingCatalogPolicy) -> Self {
        let fallback_levels = match policy {
            MissingCatalogPolicy::Exclude => None,
            MissingCatalogPolicy::SubstituteAverage => catalog.average_total_levels(),
        };
        Self {
            catalog,
            fallback_levels,
        }
    }

    pub fn normalize(&self, learner: &Learner) -> CampaignResult<f64> {
        match self.catalog.total_levels(&learner.app_id) {
            Some(total) => progress_fraction(&learner.app_id, learner.max_level_reached, total),
            None => match self.fallback_levels {
                Some(average) => Ok(f64::from(learner.max_level_reached) / average),
                None => Err(CampaignError::MissingCatalogEntry {
                    app_id: learner.app_id.clone(),
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_core::types::AppEntry;
    use chrono::NaiveDate;

    fn learner(app_id: &str, level: u32) -> Learner {
        Learner {
            id: format!("{app_id}-{level}"),
            app_id: app_id.to_string(),
            country: "Kenya".to_string(),
            max_level_reached: level,
            acquisition_date: NaiveDate::from_ymd_opt(2022, 6, 1).unwrap(),
        }
    }

    fn catalog() -> AppCatalog {
        AppCatalog::new(vec![
            AppEntry {
                app_id: "app.en".to_string(),
                language: "English".to_string(),
                total_levels: 100,
                warehouse_project_id: None,
                warehouse_property_id: None,
            },
            AppEntry {
                app_id: "app.sw".to_string(),
                language: "Swahili".to_string(),
                total_levels: 50,
                warehouse_project_id: None,
                warehouse_property_id: None,
            },
            AppEntry {
                app_id: "app.zu".to_string(),
                language: "Zulu".to_string(),
                total_levels: 0,
                warehouse_project_id: None,
                warehouse_property_id: None,
            },
        ])
    }

    #[test]
    fn test_fraction_is_unclamped() {
        assert!((progress_fraction("a", 55, 100).unwrap() - 0.55).abs() < 1e-12);
        assert!((progress_fraction("a", 120, 100).unwrap() - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_zero_total_is_missing_entry() {
        assert!(matches!(
            progress_fraction("app.zu", 3, 0),
            Err(CampaignError::MissingCatalogEntry { .. })
        ));
    }

    #[test]
    fn test_exclude_policy_reports_missing() {
        let catalog = catalog();
        let normalizer = ProgressNormalizer::new(&catalog, MissingCatalogPolicy::Exclude);
        assert!((normalizer.normalize(&learner("app.sw", 25)).unwrap() - 0.5).abs() < 1e-12);
        assert!(normalizer.normalize(&learner("app.zu", 25)).is_err());
        assert!(normalizer.normalize(&learner("app.unknown", 25)).is_err());
    }

    #[test]
    fn test_substitute_policy_uses_known_average() {
        let catalog = catalog();
        let normalizer = ProgressNormalizer::new(&catalog, MissingCatalogPolicy::SubstituteAverage);
        // Average over English (100) and Swahili (50); Zulu's zero is skipped.
        let progress = normalizer.normalize(&learner("app.zu", 30)).unwrap();
        assert!((progress - 0.4).abs() < 1e-12);
        assert!(progress.is_finite());
    }

    #[test]
    fn test_substitute_policy_without_known_sizes_still_excludes() {
        let catalog = AppCatalog::default();
        let normalizer = ProgressNormalizer::new(&catalog, MissingCatalogPolicy::SubstituteAverage);
        assert!(normalizer.normalize(&learner("app.en", 1)).is_err());
    }
}
