//! Campaign dashboard — LA/LAC/RA/RAC per campaign and the top-N leaderboards.

use campaign_core::config::MissingCatalogPolicy;
use campaign_core::types::{AppCatalog, Campaign, Learner};
use campaign_segmentation::ProgressNormalizer;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Acquisition metrics for one campaign.
///
/// - LA: learners acquired.
/// - LAC: spend per learner acquired.
/// - RA: mean progress fraction of the learners with a known content size.
/// - RAC: spend per unit of reading acquired, `spend / (RA * classified learners)`.
///
/// `start_date`/`end_date` are the cohort window, for the campaign timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignMetrics {
    pub campaign: String,
    pub la: u64,
    pub lac: Option<f64>,
    pub ra: Option<f64>,
    pub rac: Option<f64>,
    /// `RA / LA`.
    pub avg_ra_per_learner: Option<f64>,
    pub total_cost_usd: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub age_days: i64,
}

impl CampaignMetrics {
    pub fn compute(
        campaign: &Campaign,
        learners: &[Learner],
        catalog: &AppCatalog,
        policy: MissingCatalogPolicy,
    ) -> Self {
        let normalizer = ProgressNormalizer::new(catalog, policy);
        let progress: Vec<f64> = learners
            .iter()
            .filter_map(|l| normalizer.normalize(l).ok())
            .collect();

        let la = learners.len() as u64;
        let cost = campaign.total_cost_usd;
        let lac = (la > 0).then(|| cost / la as f64);
        let reading: f64 = progress.iter().sum();
        let ra = (!progress.is_empty()).then(|| reading / progress.len() as f64);
        let rac = (reading > 0.0).then(|| cost / reading);
        let avg_ra_per_learner = ra.filter(|_| la > 0).map(|ra| ra / la as f64);
        let (start_date, end_date) = campaign.cohort_window();

        Self {
            campaign: campaign.name.clone(),
            la,
            lac,
            ra,
            rac,
            avg_ra_per_learner,
            total_cost_usd: cost,
            start_date,
            end_date,
            age_days: campaign.age_days(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub campaign: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Highest,
    Lowest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub highest_la: Vec<LeaderboardEntry>,
    pub highest_ra: Vec<LeaderboardEntry>,
    pub lowest_lac: Vec<LeaderboardEntry>,
    pub lowest_rac: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// Campaigns with an undefined value are left off that board.
    pub fn build(metrics: &[CampaignMetrics], size: usize) -> Self {
        Self {
            highest_la: rank(metrics, size, Direction::Highest, |m| Some(m.la as f64)),
            highest_ra: rank(metrics, size, Direction::Highest, |m| m.ra),
            lowest_lac: rank(metrics, size, Direction::Lowest, |m| m.lac),
            lowest_rac: rank(metrics, size, Direction::Lowest, |m| m.rac),
        }
    }
}

fn rank(
    metrics: &[CampaignMetrics],
    size: usize,
    direction: Direction,
    value: impl Fn(&CampaignMetrics) -> Option<f64>,
) -> Vec<LeaderboardEntry> {
    let mut rows: Vec<(&str, f64)> = metrics
        .iter()
        .filter_map(|m| value(m).map(|v| (m.campaign.as_str(), v)))
        .collect();
    rows.sort_by(|a, b| {
        let by_value = match direction {
            Direction::Highest => b.1.total_cmp(&a.1),
            Direction::Lowest => a.1.total_cmp(&b.1),
        };
        match by_value {
            Ordering::Equal => a.0.cmp(b.0),
            other => other,
        }
    });
    rows.into_iter()
        .take(size)
        .enumerate()
        .map(|(i, (campaign, value))| LeaderboardEntry {
            rank: i + 1,
            campaign: campaign.to_string(),
            value,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub campaigns: Vec<CampaignMetrics>,
    pub leaderboard: Leaderboard,
    pub total_la: u64,
    pub total_spend_usd: f64,
}

impl DashboardSummary {
    pub fn new(campaigns: Vec<CampaignMetrics>, leaderboard_size: usize) -> Self {
        let leaderboard = Leaderboard::build(&campaigns, leaderboard_size);
        let total_la = campaigns.iter().map(|m| m.la).sum();
        let total_spend_usd = campaigns.iter().map(|m| m.total_cost_usd).sum();
        Self {
            campaigns,
            leaderboard,
            total_la,
            total_spend_usd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_core::types::AppEntry;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn catalog() -> AppCatalog {
        AppCatalog::new(vec![AppEntry {
            app_id: "app.en".to_string(),
            language: "English".to_string(),
            total_levels: 20,
            warehouse_project_id: None,
            warehouse_property_id: None,
        }])
    }

    fn campaign(name: &str, cost: f64) -> Campaign {
        Campaign {
            name: name.to_string(),
            language: "English".to_string(),
            country: "All".to_string(),
            start_date: date(2022, 1, 1),
            end_date: date(2022, 1, 1),
            total_cost_usd: cost,
        }
    }

    fn learners(levels: &[u32]) -> Vec<Learner> {
        levels
            .iter()
            .enumerate()
            .map(|(i, &level)| Learner {
                id: format!("u{i}"),
                app_id: "app.en".to_string(),
                country: "Ghana".to_string(),
                max_level_reached: level,
                acquisition_date: date(2022, 1, 10),
            })
            .collect()
    }

    fn metric(name: &str, la: u64, lac: Option<f64>, ra: Option<f64>, rac: Option<f64>) -> CampaignMetrics {
        CampaignMetrics {
            campaign: name.to_string(),
            la,
            lac,
            ra,
            rac,
            avg_ra_per_learner: None,
            total_cost_usd: 0.0,
            start_date: date(2022, 1, 1),
            end_date: date(2022, 1, 31),
            age_days: 30,
        }
    }

    #[test]
    fn test_campaign_metrics() {
        // Progress 0.25, 0.5, 0.75, 1.0: RA 0.625, reading 2.5.
        let m = CampaignMetrics::compute(
            &campaign("English Jan", 100.0),
            &learners(&[5, 10, 15, 20]),
            &catalog(),
            MissingCatalogPolicy::Exclude,
        );
        assert_eq!(m.la, 4);
        assert_eq!(m.lac, Some(25.0));
        assert_eq!(m.ra, Some(0.625));
        assert_eq!(m.rac, Some(40.0));
        assert_eq!(m.avg_ra_per_learner, Some(0.625 / 4.0));
        assert_eq!(m.age_days, 30);
    }

    #[test]
    fn test_metrics_carry_cohort_window() {
        let mut spring = campaign("English Spring", 100.0);
        spring.end_date = date(2022, 3, 1);
        let m = CampaignMetrics::compute(&spring, &[], &catalog(), MissingCatalogPolicy::Exclude);
        assert_eq!(m.start_date, date(2022, 1, 1));
        assert_eq!(m.end_date, date(2022, 3, 31));
    }

    #[test]
    fn test_campaign_without_learners() {
        let m = CampaignMetrics::compute(
            &campaign("Empty", 100.0),
            &[],
            &catalog(),
            MissingCatalogPolicy::Exclude,
        );
        assert_eq!(m.la, 0);
        assert_eq!(m.lac, None);
        assert_eq!(m.ra, None);
        assert_eq!(m.rac, None);
        assert_eq!(m.avg_ra_per_learner, None);
    }

    #[test]
    fn test_zero_progress_has_no_rac() {
        let m = CampaignMetrics::compute(
            &campaign("Stalled", 100.0),
            &learners(&[0, 0]),
            &catalog(),
            MissingCatalogPolicy::Exclude,
        );
        assert_eq!(m.ra, Some(0.0));
        assert_eq!(m.rac, None);
    }

    fn names(rows: &[LeaderboardEntry]) -> Vec<String> {
        rows.iter().map(|r| r.campaign.clone()).collect()
    }

    #[test]
    fn test_leaderboard_ordering() {
        let metrics = vec![
            metric("A", 100, Some(2.0), Some(0.3), Some(9.0)),
            metric("B", 300, Some(1.0), Some(0.1), None),
            metric("C", 200, Some(3.0), Some(0.5), Some(4.0)),
        ];
        let board = Leaderboard::build(&metrics, 10);
        assert_eq!(names(&board.highest_la), vec!["B", "C", "A"]);
        assert_eq!(names(&board.highest_ra), vec!["C", "A", "B"]);
        assert_eq!(names(&board.lowest_lac), vec!["B", "A", "C"]);
        assert_eq!(names(&board.lowest_rac), vec!["C", "A"]);
        assert_eq!(board.highest_la[0].rank, 1);
    }

    #[test]
    fn test_leaderboard_truncates_and_breaks_ties_by_name() {
        let metrics = vec![
            metric("Zulu", 50, None, None, None),
            metric("Akan", 50, None, None, None),
            metric("Ewe", 10, None, None, None),
        ];
        let board = Leaderboard::build(&metrics, 2);
        assert_eq!(board.highest_la.len(), 2);
        assert_eq!(board.highest_la[0].campaign, "Akan");
        assert_eq!(board.highest_la[1].campaign, "Zulu");
        assert!(board.highest_ra.is_empty());
    }

    #[test]
    fn test_summary_totals() {
        let mut a = metric("A", 10, None, None, None);
        a.total_cost_usd = 50.0;
        let mut b = metric("B", 5, None, None, None);
        b.total_cost_usd = 25.5;
        let summary = DashboardSummary::new(vec![a, b], 10);
        assert_eq!(summary.total_la, 15);
        assert!((summary.total_spend_usd - 75.5).abs() < f64::EPSILON);
    }
}
