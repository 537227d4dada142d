//! Engine configuration.
//!
//! All values are fixed at construction and shared read-only by every
//! prediction. `Default` reproduces the production constants; a JSON file can
//! override any subset of them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Longest trailing activity window accepted, in days.
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scoring: ScoringConfig,
    pub defaults: FeatureDefaults,
    /// Trailing window for library and chatbot activity counts
    pub lookback_days: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: Weights,
    pub thresholds: Thresholds,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub attendance: f64,
    pub performance: f64,
    pub library: f64,
    pub chatbot: f64,
    pub last_login: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            attendance: 0.30,
            performance: 0.25,
            library: 0.20,
            chatbot: 0.15,
            last_login: 0.10,
        }
    }
}

impl Weights {
    fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("attendance", self.attendance),
            ("performance", self.performance),
            ("library", self.library),
            ("chatbot", self.chatbot),
            ("last_login", self.last_login),
        ]
    }

    pub fn total(&self) -> f64 {
        self.attendance + self.performance + self.library + self.chatbot + self.last_login
    }
}

/// Lower bounds of the MEDIUM and HIGH risk bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub high: f64,
    pub medium: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            high: 70.0,
            medium: 40.0,
        }
    }
}

/// Values substituted when a feature lookup has no data or fails.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureDefaults {
    pub attendance_rate: f64,
    pub avg_performance_score: f64,
    pub library_access_count: u64,
    pub chatbot_interaction_count: u64,
    pub days_since_never_logged_in: u64,
    pub days_since_login_unavailable: u64,
}

impl Default for FeatureDefaults {
    fn default() -> Self {
        Self {
            attendance_rate: 75.0,
            avg_performance_score: 60.0,
            library_access_count: 10,
            chatbot_interaction_count: 5,
            days_since_never_logged_in: 30,
            days_since_login_unavailable: 7,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            defaults: FeatureDefaults::default(),
            lookback_days: 30,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file, falling back to defaults for
    /// omitted keys.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
            return Err(ConfigError::InvalidLookback {
                value: self.lookback_days,
                max: MAX_LOOKBACK_DAYS,
            });
        }
        self.scoring.validate()
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in self.weights.named() {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }

        let total = self.weights.total();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigError::InvalidWeights(total));
        }

        let Thresholds { high, medium } = self.thresholds;
        let ordered = 0.0 <= medium && medium < high && high <= 100.0;
        if !(medium.is_finite() && high.is_finite() && ordered) {
            return Err(ConfigError::InvalidThresholds { medium, high });
        }

        Ok(())
    }
}
