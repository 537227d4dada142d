//! Dropout risk prediction engine.
//!
//! Converts five behavioral indicators per student into a 0-100 dropout
//! score, a risk level and a list of recommended actions:
//! feature collection → normalization and weighting → recommendations →
//! identity enrichment.

pub mod collector;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod offline;
pub mod predictor;
pub mod recommend;
pub mod report;
pub mod risk;
pub mod sources;

pub use config::EngineConfig;
pub use error::{ConfigError, PredictionError};
pub use models::{FeatureSet, RiskLevel, RiskPrediction};
pub use predictor::{PredictionOrchestrator, PredictionOutcome, PredictionRequest};
pub use risk::RiskScorer;
pub use sources::DataSources;
