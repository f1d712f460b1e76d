//! Progress buckets — fixed deciles over the progress fraction, or quartiles
//! over raw levels with caller-supplied cut points.

use campaign_core::{CampaignError, CampaignResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bounds of the first nine deciles. The tenth decile is unbounded.
const DECILE_UPPER_BOUNDS: [f64; 9] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];

/// A discrete progress bucket. Deciles are numbered 1..=10 and labelled by
/// their upper bound (`0.1` … `1.0`); quartiles are numbered 1..=4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressBucket {
    Decile(u8),
    Quartile(u8),
}

impl ProgressBucket {
    pub fn label(&self) -> String {
        match self {
            Self::Decile(n) => format!("{:.1}", f64::from(*n) / 10.0),
            Self::Quartile(n) => format!("quartile_{n}"),
        }
    }
}

impl fmt::Display for ProgressBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Quartile boundaries in raw level units. Always strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCutPoints")]
pub struct CutPoints {
    q1: u32,
    q2: u32,
    q3: u32,
}

#[derive(Deserialize)]
struct RawCutPoints {
    q1: u32,
    q2: u32,
    q3: u32,
}

impl TryFrom<RawCutPoints> for CutPoints {
    type Error = CampaignError;

    fn try_from(raw: RawCutPoints) -> Result<Self, Self::Error> {
        Self::new(raw.q1, raw.q2, raw.q3)
    }
}

impl CutPoints {
    pub fn new(q1: u32, q2: u32, q3: u32) -> CampaignResult<Self> {
        if q1 < q2 && q2 < q3 {
            Ok(Self { q1, q2, q3 })
        } else {
            Err(CampaignError::InvalidCutPoints { q1, q2, q3 })
        }
    }

    pub fn q1(&self) -> u32 {
        self.q1
    }

    pub fn q2(&self) -> u32 {
        self.q2
    }

    pub fn q3(&self) -> u32 {
        self.q3
    }
}

/// Bucketing scheme applied to one cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "scheme")]
pub enum BucketScheme {
    Decile,
    Quartile { cut_points: CutPoints },
}

impl BucketScheme {
    /// Deciles read the progress fraction, quartiles read the raw level.
    pub fn classify(&self, progress: f64, max_level_reached: u32) -> ProgressBucket {
        match self {
            Self::Decile => classify_decile(progress),
            Self::Quartile { cut_points } => classify_quartile(max_level_reached, cut_points),
        }
    }
}

/// Half-open deciles: `0.3` lands in `0.4`, anything at or above `0.9`
/// (including over-completion) lands in `1.0`.
pub fn classify_decile(progress: f64) -> ProgressBucket {
    let index = DECILE_UPPER_BOUNDS
        .iter()
        .position(|&upper| progress < upper)
        .unwrap_or(DECILE_UPPER_BOUNDS.len());
    ProgressBucket::Decile(index as u8 + 1)
}

/// Cut points belong to the lower quartile.
pub fn classify_quartile(max_level_reached: u32, cut_points: &CutPoints) -> ProgressBucket {
    let quartile = if max_level_reached <= cut_points.q1 {
        1
    } else if max_level_reached <= cut_points.q2 {
        2
    } else if max_level_reached <= cut_points.q3 {
        3
    } else {
        4
    };
    ProgressBucket::Quartile(quartile)
}
