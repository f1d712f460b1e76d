//! Multi-campaign runner — segments, metrics and activity for a selected list
//! of campaigns. A failing campaign is reported, never fatal for the batch.

use campaign_core::config::ReportingConfig;
use campaign_core::types::{AppCatalog, Campaign, Learner};
use campaign_core::{CampaignError, CampaignResult};
use campaign_segmentation::{
    BucketScheme, CohortInput, CohortSegmentation, Diagnostic, DiagnosticKind, SegmentationEngine,
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::activity::{acquisition_by_country, daily_acquisition, CampaignActivity};
use crate::cohort::{find_campaign, CohortFilter};
use crate::dashboard::{CampaignMetrics, DashboardSummary};
use crate::sources::{CampaignRegistry, LearnerProvider};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeChoice {
    #[default]
    Decile,
    /// Uses the cut points registered for the campaign's language.
    Quartile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignOutcome {
    pub campaign: String,
    pub segmentation: Option<CohortSegmentation>,
    /// Why the campaign was skipped. Diagnostics of a segmented campaign live
    /// on its segmentation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl CampaignOutcome {
    fn skipped(campaign: &str, diagnostic: Diagnostic) -> Self {
        Self {
            campaign: campaign.to_string(),
            segmentation: None,
            diagnostics: vec![diagnostic],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub summary: DashboardSummary,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityReport {
    pub campaigns: Vec<CampaignActivity>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn diagnostic_for(subject: &str, err: &CampaignError) -> Diagnostic {
    let kind = match err {
        CampaignError::MissingCatalogEntry { .. } | CampaignError::UnknownLanguage(_) => {
            DiagnosticKind::MissingCatalogEntry
        }
        CampaignError::InvalidCutPoints { .. } | CampaignError::MissingCutPoints(_) => {
            DiagnosticKind::InvalidCutPoints
        }
        CampaignError::UnknownCampaign(_) => DiagnosticKind::UnknownCampaign,
        _ => DiagnosticKind::DataSource,
    };
    Diagnostic::new(subject, kind, err.to_string())
}

/// Drives the registry, the learner provider and the segmentation engine.
#[derive(Clone)]
pub struct CampaignBatch {
    registry: Arc<dyn CampaignRegistry>,
    learners: Arc<dyn LearnerProvider>,
    engine: SegmentationEngine,
    reporting: ReportingConfig,
}

impl CampaignBatch {
    pub fn new(
        registry: Arc<dyn CampaignRegistry>,
        learners: Arc<dyn LearnerProvider>,
        engine: SegmentationEngine,
        reporting: ReportingConfig,
    ) -> Self {
        Self {
            registry,
            learners,
            engine,
            reporting,
        }
    }

    /// Every campaign name in the registry, in registry order.
    pub fn campaign_names(&self) -> CampaignResult<Vec<String>> {
        Ok(self.registry.campaigns()?.into_iter().map(|c| c.name).collect())
    }

    /// Segments each selected campaign in turn. Outcomes are ordered by campaign name.
    pub fn segments(&self, names: &[String], scheme: SchemeChoice) -> CampaignResult<Vec<CampaignOutcome>> {
        let campaigns = self.registry.campaigns()?;
        let catalog = self.registry.catalog()?;
        let outcomes: Vec<CampaignOutcome> = unique(names)
            .into_iter()
            .map(|name| self.segment_one(&campaigns, &catalog, &name, scheme))
            .collect();
        log_batch(&outcomes);
        Ok(outcomes)
    }

    /// Segments each selected campaign on its own blocking task. Results are
    /// recombined by campaign name, so completion order does not matter.
    pub async fn segments_concurrent(
        &self,
        names: &[String],
        scheme: SchemeChoice,
    ) -> CampaignResult<Vec<CampaignOutcome>> {
        let campaigns = Arc::new(self.registry.campaigns()?);
        let catalog = Arc::new(self.registry.catalog()?);
        let results: Arc<DashMap<String, CampaignOutcome>> = Arc::new(DashMap::new());

        let mut handles: Vec<(String, JoinHandle<()>)> = Vec::new();
        for name in unique(names) {
            let batch = self.clone();
            let campaigns = campaigns.clone();
            let catalog = catalog.clone();
            let results = results.clone();
            let task_name = name.clone();
            let handle = tokio::task::spawn_blocking(move || {
                let outcome = batch.segment_one(&campaigns, &catalog, &task_name, scheme);
                results.insert(task_name, outcome);
            });
            handles.push((name, handle));
        }

        for (name, handle) in handles {
            if let Err(e) = handle.await {
                error!(campaign = %name, error = %e, "Segmentation task failed");
                results.insert(
                    name.clone(),
                    CampaignOutcome::skipped(
                        &name,
                        Diagnostic::new(&name, DiagnosticKind::DataSource, format!("segmentation task failed: {e}")),
                    ),
                );
            }
        }

        let mut outcomes: Vec<CampaignOutcome> = results.iter().map(|r| r.value().clone()).collect();
        outcomes.sort_by(|a, b| a.campaign.cmp(&b.campaign));
        log_batch(&outcomes);
        Ok(outcomes)
    }

    /// Campaign metrics and leaderboards. Campaigns that cannot be resolved
    /// are left out with a diagnostic.
    pub fn summary(&self, names: &[String]) -> CampaignResult<SummaryReport> {
        let campaigns = self.registry.campaigns()?;
        let catalog = self.registry.catalog()?;
        let mut metrics = Vec::new();
        let mut diagnostics = Vec::new();

        for name in unique(names) {
            match self.cohort(&campaigns, &catalog, &name) {
                Ok((campaign, learners)) => metrics.push(CampaignMetrics::compute(
                    campaign,
                    &learners,
                    &catalog,
                    self.engine.config().missing_catalog_policy,
                )),
                Err(e) => diagnostics.push(diagnostic_for(&name, &e)),
            }
        }

        Ok(SummaryReport {
            summary: DashboardSummary::new(metrics, self.reporting.leaderboard_size),
            diagnostics,
        })
    }

    pub fn activity(&self, names: &[String]) -> CampaignResult<ActivityReport> {
        let campaigns = self.registry.campaigns()?;
        let catalog = self.registry.catalog()?;
        let mut activity = Vec::new();
        let mut diagnostics = Vec::new();

        for name in unique(names) {
            match self.cohort(&campaigns, &catalog, &name) {
                Ok((_, learners)) => activity.push(CampaignActivity {
                    daily: daily_acquisition(&learners, &self.reporting.rolling_windows),
                    by_country: acquisition_by_country(&learners),
                    campaign: name,
                }),
                Err(e) => diagnostics.push(diagnostic_for(&name, &e)),
            }
        }

        Ok(ActivityReport {
            campaigns: activity,
            diagnostics,
        })
    }

    fn cohort<'a>(
        &self,
        campaigns: &'a [Campaign],
        catalog: &AppCatalog,
        name: &str,
    ) -> CampaignResult<(&'a Campaign, Vec<Learner>)> {
        let campaign = find_campaign(campaigns, name)?;
        let filter = CohortFilter::for_campaign(campaign, catalog)?;
        let learners = self.learners.learners(&filter)?;
        Ok((campaign, learners))
    }

    fn scheme_for(&self, campaign: &Campaign, choice: SchemeChoice) -> CampaignResult<BucketScheme> {
        match choice {
            SchemeChoice::Decile => Ok(BucketScheme::Decile),
            SchemeChoice::Quartile => match self.registry.cut_points(&campaign.language)? {
                Some(cut_points) => Ok(BucketScheme::Quartile { cut_points }),
                None => Err(CampaignError::MissingCutPoints(campaign.language.clone())),
            },
        }
    }

    fn segment_one(
        &self,
        campaigns: &[Campaign],
        catalog: &AppCatalog,
        name: &str,
        choice: SchemeChoice,
    ) -> CampaignOutcome {
        let (campaign, learners) = match self.cohort(campaigns, catalog, name) {
            Ok(found) => found,
            Err(e) => return CampaignOutcome::skipped(name, diagnostic_for(name, &e)),
        };
        let scheme = match self.scheme_for(campaign, choice) {
            Ok(scheme) => scheme,
            Err(e) => {
                warn!(campaign = %name, language = %campaign.language, error = %e, "Skipping quartile segmentation");
                return CampaignOutcome::skipped(name, diagnostic_for(name, &e));
            }
        };

        let segmentation = self
            .engine
            .segment(&CohortInput {
                cohort: name,
                learners: &learners,
                catalog,
                total_cost_usd: campaign.total_cost_usd,
                scheme,
            })
            .rounded(self.reporting.share_decimals, self.reporting.cost_decimals);

        CampaignOutcome {
            campaign: name.to_string(),
            segmentation: Some(segmentation),
            diagnostics: Vec::new(),
        }
    }
}

fn unique(names: &[String]) -> BTreeSet<String> {
    names.iter().cloned().collect()
}

fn log_batch(outcomes: &[CampaignOutcome]) {
    let failed = outcomes.iter().filter(|o| o.segmentation.is_none()).count();
    if failed > 0 {
        metrics::counter!("reporting.batch.failed").increment(failed as u64);
    }
    info!(campaigns = outcomes.len(), failed, "Campaign batch complete");
}
