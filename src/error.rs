//! Error types for dropout risk prediction

use thiserror::Error;
use uuid::Uuid;

/// Errors that abort a single student's prediction
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("missing required feature `{field}` for student {student_id}")]
    MissingFeature { student_id: Uuid, field: &'static str },

    #[error("student {0} not found")]
    StudentNotFound(Uuid),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("data source failure: {0:#}")]
    Source(#[from] anyhow::Error),
}

/// Errors raised while loading or validating engine configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("weight `{name}` must be finite and non-negative (got {value})")]
    InvalidWeight { name: &'static str, value: f64 },

    #[error("weights must sum to 1.0 (got {0})")]
    InvalidWeights(f64),

    #[error("thresholds must satisfy 0 <= medium < high <= 100 (got medium {medium}, high {high})")]
    InvalidThresholds { medium: f64, high: f64 },

    #[error("lookback_days must be between 1 and {max} (got {value})")]
    InvalidLookback { value: i64, max: i64 },
}
