//! Campaign Insights — reading acquisition reports for learner campaigns.
//!
//! Loads a registry/warehouse snapshot and prints JSON tables for the
//! charting layer.

use campaign_core::config::{AppConfig, MissingCatalogPolicy, ShareDenominator};
use campaign_reporting::{CampaignBatch, SchemeChoice, Snapshot};
use campaign_segmentation::SegmentationEngine;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "campaign-insights")]
#[command(about = "Reading acquisition reports for learner campaigns")]
#[command(version)]
struct Cli {
    /// Snapshot file with campaigns, apps, cut points and learners (overrides config)
    #[arg(long, global = true, env = "CAMPAIGN_INSIGHTS__DATA__SNAPSHOT_PATH")]
    snapshot: Option<String>,

    /// Handling of learners whose app has no known total levels (overrides config)
    #[arg(long, global = true, value_enum)]
    missing_catalog: Option<MissingCatalogArg>,

    /// Denominator for bucket learner shares (overrides config)
    #[arg(long, global = true, value_enum)]
    share_denominator: Option<ShareDenominatorArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// LA, LAC, RA and RAC per campaign with top-N leaderboards
    Summary {
        /// Campaign names (default: every campaign)
        #[arg(short, long)]
        campaign: Vec<String>,
    },

    /// Learners and reading acquisition cost by progress bucket
    Segments {
        /// Campaign names (default: every campaign)
        #[arg(short, long)]
        campaign: Vec<String>,

        /// Bucket by the language's quartile cut points instead of deciles
        #[arg(long, default_value_t = false)]
        quartiles: bool,

        /// Segment campaigns one at a time
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },

    /// Daily learners acquired with rolling means, and learners by country
    Activity {
        /// Campaign names (default: every campaign)
        #[arg(short, long)]
        campaign: Vec<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MissingCatalogArg {
    Exclude,
    SubstituteAverage,
}

impl From<MissingCatalogArg> for MissingCatalogPolicy {
    fn from(arg: MissingCatalogArg) -> Self {
        match arg {
            MissingCatalogArg::Exclude => Self::Exclude,
            MissingCatalogArg::SubstituteAverage => Self::SubstituteAverage,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ShareDenominatorArg {
    ClassifiedOnly,
    FullCohort,
}

impl From<ShareDenominatorArg> for ShareDenominator {
    fn from(arg: ShareDenominatorArg) -> Self {
        match arg {
            ShareDenominatorArg::ClassifiedOnly => Self::ClassifiedOnly,
            ShareDenominatorArg::FullCohort => Self::FullCohort,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays a clean JSON document.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campaign_insights=info,campaign_reporting=info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(path) = cli.snapshot {
        config.data.snapshot_path = path;
    }
    if let Some(policy) = cli.missing_catalog {
        config.segmentation.missing_catalog_policy = policy.into();
    }
    if let Some(denominator) = cli.share_denominator {
        config.segmentation.share_denominator = denominator.into();
    }

    info!(
        snapshot = %config.data.snapshot_path,
        missing_catalog_policy = ?config.segmentation.missing_catalog_policy,
        share_denominator = ?config.segmentation.share_denominator,
        "Configuration loaded"
    );

    let snapshot = Arc::new(Snapshot::from_path(&config.data.snapshot_path)?);
    let batch = CampaignBatch::new(
        snapshot.clone(),
        snapshot,
        SegmentationEngine::new(config.segmentation.clone()),
        config.reporting.clone(),
    );

    match cli.command {
        Commands::Summary { campaign } => {
            let names = selection(&batch, campaign)?;
            print_json(&batch.summary(&names)?)?;
        }
        Commands::Segments {
            campaign,
            quartiles,
            sequential,
        } => {
            let names = selection(&batch, campaign)?;
            let scheme = if quartiles {
                SchemeChoice::Quartile
            } else {
                SchemeChoice::Decile
            };
            let outcomes = if sequential || !config.reporting.concurrent {
                batch.segments(&names, scheme)?
            } else {
                batch.segments_concurrent(&names, scheme).await?
            };
            print_json(&outcomes)?;
        }
        Commands::Activity { campaign } => {
            let names = selection(&batch, campaign)?;
            print_json(&batch.activity(&names)?)?;
        }
    }

    Ok(())
}

/// An empty selection means every campaign in the registry.
fn selection(batch: &CampaignBatch, requested: Vec<String>) -> anyhow::Result<Vec<String>> {
    if requested.is_empty() {
        Ok(batch.campaign_names()?)
    } else {
        Ok(requested)
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
