//! Error types for company lookup and stock analysis operations

use analyst_llm::LLMError;
use analyst_utils::EnvError;
use thiserror::Error;

/// Errors raised by the directory, data sources and analysis pipeline
#[derive(Debug, Error)]
pub enum AnalystError {
    /// Market data could not be retrieved for the ticker
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// The reasoning backend failed or returned nothing usable
    #[error("Reasoning backend error: {0}")]
    BackendError(String),

    /// The exchange company list could not be fetched
    #[error("Company source error: {0}")]
    SourceError(String),

    /// Two records share one ticker
    #[error("Duplicate ticker in directory: {0}")]
    DuplicateTicker(String),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// Technical indicator calculation error
    #[error("Technical indicator error: {0}")]
    IndicatorError(String),

    /// Prompt template error
    #[error("Prompt error: {0}")]
    PromptError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File system error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for analyst operations
pub type Result<T> = std::result::Result<T, AnalystError>;

impl From<LLMError> for AnalystError {
    fn from(err: LLMError) -> Self {
        AnalystError::BackendError(err.to_string())
    }
}

impl From<EnvError> for AnalystError {
    fn from(err: EnvError) -> Self {
        AnalystError::ConfigError(err.to_string())
    }
}

impl From<minijinja::Error> for AnalystError {
    fn from(err: minijinja::Error) -> Self {
        AnalystError::PromptError(err.to_string())
    }
}
