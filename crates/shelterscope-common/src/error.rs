use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShelterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid GeoJSON in {source_name}: {reason}")]
    InvalidGeoJson { source_name: String, reason: String },

    #[error("Layer file not found: {0}")]
    LayerNotFound(String),

    #[error("Population value missing for site '{site}' and no fill policy allows substitution")]
    MissingPopulationValue { site: String },

    #[error("Site table has no 'score' column; run the scorer first (site '{0}')")]
    MissingScore(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ShelterError>;
