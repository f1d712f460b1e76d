use serde::{Deserialize, Serialize};

/// Root application configuration. Loaded from an optional
/// `campaign-insights.toml` and environment variables with the prefix
/// `CAMPAIGN_INSIGHTS__`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub segmentation: SegmentationConfig,
    #[serde(default)]
    pub reporting: ReportingConfig,
    #[serde(default)]
    pub data: DataConfig,
}

/// What to do with a learner whose app has no known content size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingCatalogPolicy {
    /// Drop the learner from classification.
    #[default]
    Exclude,
    /// Use the mean content size across apps with a known size.
    SubstituteAverage,
}

/// Denominator used for a bucket's learner share.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareDenominator {
    /// Only learners that received a bucket.
    #[default]
    ClassifiedOnly,
    /// Every learner in the cohort, including excluded ones.
    FullCohort,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SegmentationConfig {
    #[serde(default)]
    pub missing_catalog_policy: MissingCatalogPolicy,
    #[serde(default)]
    pub share_denominator: ShareDenominator,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportingConfig {
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,
    #[serde(default = "default_rolling_windows")]
    pub rolling_windows: Vec<usize>,
    #[serde(default = "default_share_decimals")]
    pub share_decimals: u32,
    #[serde(default = "default_cost_decimals")]
    pub cost_decimals: u32,
    #[serde(default = "default_concurrent")]
    pub concurrent: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
}

// Default functions
fn default_leaderboard_size() -> usize {
    10
}
fn default_rolling_windows() -> Vec<usize> {
    vec![7, 30]
}
fn default_share_decimals() -> u32 {
    2
}
fn default_cost_decimals() -> u32 {
    2
}
fn default_concurrent() -> bool {
    true
}
fn default_snapshot_path() -> String {
    "data/snapshot.json".to_string()
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            leaderboard_size: default_leaderboard_size(),
            rolling_windows: default_rolling_windows(),
            share_decimals: default_share_decimals(),
            cost_decimals: default_cost_decimals(),
            concurrent: default_concurrent(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the optional config file and environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("campaign-insights").required(false))
            .add_source(
                config::Environment::with_prefix("CAMPAIGN_INSIGHTS")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("reporting.rolling_windows"),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
