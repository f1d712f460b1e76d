//! Reading-acquisition segmentation — progress normalization, decile and
//! quartile bucketing, and per-bucket cost attribution.

pub mod attribution;
pub mod buckets;
pub mod engine;
pub mod progress;

pub use attribution::{AttributedCost, BucketAggregate, ClassifiedLearner, CostAttributor};
pub use buckets::{BucketScheme, CutPoints, ProgressBucket};
pub use engine::{
    CohortInput, CohortSegmentation, CohortStatus, Diagnostic, DiagnosticKind, SegmentationEngine,
};
pub use progress::ProgressNormalizer;
