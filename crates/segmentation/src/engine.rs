//! Segmentation engine — runs normalize → classify → attribute for one cohort.

use campaign_core::config::SegmentationConfig;
use campaign_core::types::{AppCatalog, Learner};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::attribution::{BucketAggregate, ClassifiedLearner, CostAttributor};
use crate::buckets::BucketScheme;
use crate::progress::ProgressNormalizer;

/// Everything needed to segment one cohort. Borrowed, never mutated.
#[derive(Debug, Clone, Copy)]
pub struct CohortInput<'a> {
    pub cohort: &'a str,
    pub learners: &'a [Learner],
    pub catalog: &'a AppCatalog,
    pub total_cost_usd: f64,
    pub scheme: BucketScheme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    MissingCatalogEntry,
    InvalidCutPoints,
    ZeroReadingBucket,
    EmptyCohort,
    UnknownCampaign,
    DataSource,
}

/// A recovered data-quality condition attached to a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub subject: String,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(subject: impl Into<String>, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CohortStatus {
    Segmented,
    /// No learners matched the cohort filter, or none could be classified.
    EmptyCohort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedLearner {
    pub learner_id: String,
    pub app_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortSegmentation {
    pub cohort: String,
    pub scheme: BucketScheme,
    pub status: CohortStatus,
    pub cohort_size: usize,
    pub classified_count: usize,
    pub excluded: Vec<ExcludedLearner>,
    pub aggregates: Vec<BucketAggregate>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CohortSegmentation {
    pub fn is_empty(&self) -> bool {
        self.status == CohortStatus::EmptyCohort
    }

    pub fn rounded(&self, share_decimals: u32, cost_decimals: u32) -> Self {
        Self {
            aggregates: self
                .aggregates
                .iter()
                .map(|a| a.rounded(share_decimals, cost_decimals))
                .collect(),
            ..self.clone()
        }
    }
}

/// Stateless; safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct SegmentationEngine {
    config: SegmentationConfig,
}

impl SegmentationEngine {
    pub fn new(config: SegmentationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    /// Normalizes and buckets each learner. Learners whose content size
    /// cannot be resolved are returned separately.
    pub fn classify(
        &self,
        learners: &[Learner],
        catalog: &AppCatalog,
        scheme: &BucketScheme,
    ) -> (Vec<ClassifiedLearner>, Vec<ExcludedLearner>) {
        let normalizer = ProgressNormalizer::new(catalog, self.config.missing_catalog_policy);
        let mut classified = Vec::with_capacity(learners.len());
        let mut excluded = Vec::new();

        for learner in learners {
            match normalizer.normalize(learner) {
                Ok(progress) => classified.push(ClassifiedLearner {
                    learner_id: learner.id.clone(),
                    bucket: scheme.classify(progress, learner.max_level_reached),
                    progress,
                }),
                Err(_) => excluded.push(ExcludedLearner {
                    learner_id: learner.id.clone(),
                    app_id: learner.app_id.clone(),
                }),
            }
        }
        (classified, excluded)
    }

    pub fn segment(&self, input: &CohortInput<'_>) -> CohortSegmentation {
        let cohort_size = input.learners.len();
        let (classified, excluded) = self.classify(input.learners, input.catalog, &input.scheme);
        let mut diagnostics = catalog_diagnostics(input, &excluded);

        let aggregates = CostAttributor::new(input.total_cost_usd, self.config.share_denominator)
            .attribute(&classified, cohort_size);

        for aggregate in aggregates.iter().filter(|a| a.attributed_cost.is_zero_reading()) {
            diagnostics.push(Diagnostic::new(
                input.cohort,
                DiagnosticKind::ZeroReadingBucket,
                format!(
                    "bucket {} has {} learners and no reading progress; cost per reading is undefined",
                    aggregate.label, aggregate.learner_count
                ),
            ));
        }

        let status = if classified.is_empty() {
            diagnostics.push(Diagnostic::new(
                input.cohort,
                DiagnosticKind::EmptyCohort,
                format!("no classified learners out of {cohort_size}"),
            ));
            CohortStatus::EmptyCohort
        } else {
            CohortStatus::Segmented
        };

        if !excluded.is_empty() {
            metrics::counter!("segmentation.learners_excluded").increment(excluded.len() as u64);
            warn!(
                cohort = %input.cohort,
                excluded = excluded.len(),
                "Learners excluded for missing catalog entries"
            );
        }
        metrics::counter!("segmentation.cohorts").increment(1);
        debug!(
            cohort = %input.cohort,
            cohort_size,
            classified = classified.len(),
            buckets = aggregates.len(),
            "Cohort segmented"
        );

        CohortSegmentation {
            cohort: input.cohort.to_string(),
            scheme: input.scheme,
            status,
            cohort_size,
            classified_count: classified.len(),
            excluded,
            aggregates,
            diagnostics,
        }
    }
}

/// One diagnostic per app with an unknown content size, covering both
/// excluded and substituted learners.
fn catalog_diagnostics(input: &CohortInput<'_>, excluded: &[ExcludedLearner]) -> Vec<Diagnostic> {
    let mut excluded_by_app: BTreeMap<&str, usize> = BTreeMap::new();
    for learner in excluded {
        *excluded_by_app.entry(learner.app_id.as_str()).or_default() += 1;
    }

    let mut substituted_by_app: BTreeMap<&str, usize> = BTreeMap::new();
    for learner in input.learners {
        if input.catalog.total_levels(&learner.app_id).is_none()
            && !excluded_by_app.contains_key(learner.app_id.as_str())
        {
            *substituted_by_app.entry(learner.app_id.as_str()).or_default() += 1;
        }
    }

    let excluded = excluded_by_app.into_iter().map(|(app_id, count)| {
        Diagnostic::new(
            input.cohort,
            DiagnosticKind::MissingCatalogEntry,
            format!("{count} learners excluded: no known total levels for app {app_id}"),
        )
    });
    let substituted = substituted_by_app.into_iter().map(|(app_id, count)| {
        Diagnostic::new(
            input.cohort,
            DiagnosticKind::MissingCatalogEntry,
            format!("{count} learners normalized by average total levels: no known total levels for app {app_id}"),
        )
    });
    excluded.chain(substituted).collect()
}
