//! Acquisition activity — learners acquired per day with rolling means, and
//! learners acquired per country.

use campaign_core::types::Learner;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingMean {
    pub window: usize,
    /// `None` until `window` observed days are available.
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAcquisition {
    pub date: NaiveDate,
    /// Ordinal of this observed date within the campaign, starting at 1. Lines
    /// campaigns up on a common start.
    pub day: u32,
    pub learners_acquired: u64,
    pub rolling_means: Vec<RollingMean>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryAcquisition {
    pub country: String,
    pub learners_acquired: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignActivity {
    pub campaign: String,
    pub daily: Vec<DailyAcquisition>,
    pub by_country: Vec<CountryAcquisition>,
}

/// One point per observed acquisition date, ascending, for a single campaign's
/// cohort. Rolling windows and day ordinals run over observed dates; days
/// without acquisitions are not filled.
pub fn daily_acquisition(learners: &[Learner], windows: &[usize]) -> Vec<DailyAcquisition> {
    let mut per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for learner in learners {
        *per_day.entry(learner.acquisition_date).or_default() += 1;
    }

    let counts: Vec<u64> = per_day.values().copied().collect();
    per_day
        .into_iter()
        .enumerate()
        .map(|(i, (date, learners_acquired))| DailyAcquisition {
            date,
            day: i as u32 + 1,
            learners_acquired,
            rolling_means: windows
                .iter()
                .map(|&window| RollingMean {
                    window,
                    mean: trailing_mean(&counts[..=i], window),
                })
                .collect(),
        })
        .collect()
}

fn trailing_mean(counts: &[u64], window: usize) -> Option<f64> {
    if window == 0 || counts.len() < window {
        return None;
    }
    let tail = &counts[counts.len() - window..];
    Some(tail.iter().sum::<u64>() as f64 / window as f64)
}

/// Descending by learners acquired, ties by country name.
pub fn acquisition_by_country(learners: &[Learner]) -> Vec<CountryAcquisition> {
    let mut per_country: BTreeMap<&str, u64> = BTreeMap::new();
    for learner in learners {
        *per_country.entry(learner.country.as_str()).or_default() += 1;
    }
    let mut rows: Vec<CountryAcquisition> = per_country
        .into_iter()
        .map(|(country, learners_acquired)| CountryAcquisition {
            country: country.to_string(),
            learners_acquired,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.learners_acquired
            .cmp(&a.learners_acquired)
            .then_with(|| a.country.cmp(&b.country))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn learner(id: usize, country: &str, day: u32) -> Learner {
        Learner {
            id: format!("u{id}"),
            app_id: "app".to_string(),
            country: country.to_string(),
            max_level_reached: 1,
            acquisition_date: NaiveDate::from_ymd_opt(2022, 8, day).unwrap(),
        }
    }

    #[test]
    fn test_daily_counts_sorted() {
        let learners = vec![learner(0, "Peru", 3), learner(1, "Peru", 1), learner(2, "Chile", 3)];
        let daily = daily_acquisition(&learners, &[]);
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, NaiveDate::from_ymd_opt(2022, 8, 1).unwrap());
        assert_eq!(daily[0].learners_acquired, 1);
        assert_eq!(daily[1].learners_acquired, 2);
    }

    #[test]
    fn test_day_ordinals_skip_empty_dates() {
        let learners = vec![learner(0, "Peru", 9), learner(1, "Peru", 2), learner(2, "Peru", 20)];
        let days: Vec<u32> = daily_acquisition(&learners, &[]).iter().map(|d| d.day).collect();
        assert_eq!(days, vec![1, 2, 3]);
    }

    #[test]
    fn test_rolling_mean_needs_full_window() {
        // Days 1..=4 with 1, 2, 3, 4 learners.
        let mut learners = Vec::new();
        let mut id = 0;
        for day in 1..=4u32 {
            for _ in 0..day {
                learners.push(learner(id, "Peru", day));
                id += 1;
            }
        }
        let daily = daily_acquisition(&learners, &[3]);
        assert_eq!(daily[0].rolling_means[0].mean, None);
        assert_eq!(daily[1].rolling_means[0].mean, None);
        assert_eq!(daily[2].rolling_means[0].mean, Some(2.0));
        assert_eq!(daily[3].rolling_means[0].mean, Some(3.0));
        assert_eq!(daily[3].rolling_means[0].window, 3);
    }

    #[test]
    fn test_zero_window_never_defined() {
        let daily = daily_acquisition(&[learner(0, "Peru", 1)], &[0]);
        assert_eq!(daily[0].rolling_means[0].mean, None);
    }

    #[test]
    fn test_country_breakdown() {
        let learners = vec![
            learner(0, "Peru", 1),
            learner(1, "Chile", 1),
            learner(2, "Peru", 2),
            learner(3, "Bolivia", 2),
        ];
        let rows = acquisition_by_country(&learners);
        assert_eq!(rows[0].country, "Peru");
        assert_eq!(rows[0].learners_acquired, 2);
        assert_eq!(rows[1].country, "Bolivia");
        assert_eq!(rows[2].country, "Chile");
    }
}
