use thiserror::Error;

pub type CampaignResult<T> = Result<T, CampaignError>;

#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No catalog entry with known total levels for app {app_id}")]
    MissingCatalogEntry { app_id: String },

    #[error("Cut points must be strictly increasing, got ({q1}, {q2}, {q3})")]
    InvalidCutPoints { q1: u32, q2: u32, q3: u32 },

    #[error("No quartile cut points registered for language {0}")]
    MissingCutPoints(String),

    #[error("No app registered for language {0}")]
    UnknownLanguage(String),

    #[error("Unknown campaign: {0}")]
    UnknownCampaign(String),

    #[error("Data source error: {0}")]
    DataSource(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
