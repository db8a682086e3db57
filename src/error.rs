//! Error types for the Samarth Q&A service.

use thiserror::Error;

/// Main error type for Samarth operations.
#[derive(Error, Debug)]
pub enum SamarthError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("{0}")]
    Analytics(#[from] AnalyticsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Dataset loading and refresh errors (Data Manager).
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Unknown dataset '{0}'")]
    UnknownDataset(String),

    #[error("Sample file not found: {0}")]
    SampleNotFound(String),

    #[error("Failed to parse {dataset} row: {message}")]
    Parse { dataset: String, message: String },

    #[error("Remote fetch failed for '{dataset}': {message}")]
    RemoteFetch { dataset: String, message: String },

    #[error("Dataset '{0}' contains no records")]
    Empty(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Domain errors raised by the Analytics Engine.
///
/// These mean the request was well-formed but unanswerable with the
/// current data; the REST layer maps them to a client-facing 400.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Could not find state matching '{query}'. Available states: {available}")]
    UnknownState { query: String, available: String },

    #[error("Could not find crop matching '{query}'. Available crops: {available}")]
    UnknownCrop { query: String, available: String },

    #[error("Could not find region matching '{query}'. Available regions: {available}")]
    UnknownRegion { query: String, available: String },

    #[error("No rainfall data found for the requested states.")]
    NoRainfallData,

    #[error("No production data found for the requested crop/year.")]
    NoProductionData,

    #[error("{state} has no {crop} production records in {year}.")]
    NoRecordsForState {
        state: String,
        crop: String,
        year: i32,
    },

    #[error("No production data found for the selected region/crop.")]
    EmptySeries,

    #[error("No rainfall data found for the selected region.")]
    NoRegionRainfall,
}

/// Result type alias for Samarth operations.
pub type Result<T> = std::result::Result<T, SamarthError>;
