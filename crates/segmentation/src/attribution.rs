//! Cost attribution — per-bucket learner share, average progress and reading
//! acquisition cost for one cohort.

use campaign_core::config::ShareDenominator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::buckets::ProgressBucket;

/// A learner that received a bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedLearner {
    pub learner_id: String,
    pub bucket: ProgressBucket,
    pub progress: f64,
}

/// Cost per unit of reading acquired, or the sentinel for a bucket whose
/// learners made no progress at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "usd")]
pub enum AttributedCost {
    Usd(f64),
    ZeroReadingBucket,
}

impl AttributedCost {
    pub fn as_usd(&self) -> Option<f64> {
        match self {
            Self::Usd(v) => Some(*v),
            Self::ZeroReadingBucket => None,
        }
    }

    pub fn is_zero_reading(&self) -> bool {
        matches!(self, Self::ZeroReadingBucket)
    }
}

/// One row of the bucket table handed to the charting layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketAggregate {
    pub bucket: ProgressBucket,
    pub label: String,
    pub learner_count: u64,
    pub learner_share: f64,
    pub average_progress: f64,
    /// `learner_count * average_progress`.
    pub bucket_reading: f64,
    pub attributed_cost: AttributedCost,
}

impl BucketAggregate {
    /// Presentation copy with share and cost rounded half away from zero.
    pub fn rounded(&self, share_decimals: u32, cost_decimals: u32) -> Self {
        Self {
            learner_share: round_to(self.learner_share, share_decimals),
            attributed_cost: match self.attributed_cost {
                AttributedCost::Usd(v) => AttributedCost::Usd(round_to(v, cost_decimals)),
                AttributedCost::ZeroReadingBucket => AttributedCost::ZeroReadingBucket,
            },
            ..self.clone()
        }
    }
}

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[derive(Default)]
struct BucketAccumulator {
    count: u64,
    progress_sum: f64,
}

/// Apportions a campaign's spend over progress buckets.
pub struct CostAttributor {
    total_cost_usd: f64,
    denominator: ShareDenominator,
}

impl CostAttributor {
    pub fn new(total_cost_usd: f64, denominator: ShareDenominator) -> Self {
        Self {
            total_cost_usd,
            denominator,
        }
    }

    /// Emits one aggregate per observed bucket in ascending bucket order.
    /// Buckets without learners are never emitted.
    pub fn attribute(&self, classified: &[ClassifiedLearner], cohort_size: usize) -> Vec<BucketAggregate> {
        let denominator = match self.denominator {
            ShareDenominator::ClassifiedOnly => classified.len(),
            ShareDenominator::FullCohort => cohort_size.max(classified.len()),
        };
        if denominator == 0 {
            return Vec::new();
        }

        let mut groups: BTreeMap<ProgressBucket, BucketAccumulator> = BTreeMap::new();
        for learner in classified {
            let acc = groups.entry(learner.bucket).or_default();
            acc.count += 1;
            acc.progress_sum += learner.progress;
        }

        groups
            .into_iter()
            .map(|(bucket, acc)| {
                let learner_count = acc.count;
                let average_progress = acc.progress_sum / learner_count as f64;
                let learner_share = learner_count as f64 / denominator as f64;
                let bucket_reading = learner_count as f64 * average_progress;
                let attributed_cost = if bucket_reading > 0.0 {
                    AttributedCost::Usd(self.total_cost_usd * learner_share / bucket_reading)
                } else {
                    AttributedCost::ZeroReadingBucket
                };
                BucketAggregate {
                    bucket,
                    label: bucket.label(),
                    learner_count,
                    learner_share,
                    average_progress,
                    bucket_reading,
                    attributed_cost,
                }
            })
            .collect()
    }
}
