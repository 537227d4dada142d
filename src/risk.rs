use chrono::{DateTime, Duration, Utc};

use crate::config::{ScoringConfig, Thresholds, Weights, MAX_LOOKBACK_DAYS};
use crate::error::PredictionError;
use crate::models::{FeatureSet, NormalizedMetrics, RiskAssessment, RiskLevel};

/// Weighted rule-based dropout scorer.
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    config: ScoringConfig,
}

impl RiskScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(&self, features: &FeatureSet) -> Result<RiskAssessment, PredictionError> {
        let metrics = normalize(features)?;
        let dropout_score = weighted_score(&metrics, &self.config.weights);
        let risk_level = classify(dropout_score, &self.config.thresholds);

        tracing::debug!(
            student_id = %features.student_id,
            dropout_score,
            risk_level = risk_level.as_str(),
            "scored student"
        );

        Ok(RiskAssessment {
            dropout_score,
            risk_level,
            metrics,
        })
    }
}

fn require<T: Copy>(
    value: Option<T>,
    features: &FeatureSet,
    field: &'static str,
) -> Result<T, PredictionError> {
    value.ok_or(PredictionError::MissingFeature {
        student_id: features.student_id,
        field,
    })
}

pub fn normalize(features: &FeatureSet) -> Result<NormalizedMetrics, PredictionError> {
    let attendance_rate = require(features.attendance_rate, features, "attendance_rate")?;
    let performance = require(
        features.avg_performance_score,
        features,
        "avg_performance_score",
    )?;
    let library = require(features.library_access_count, features, "library_access_count")?;
    let chatbot = require(
        features.chatbot_interaction_count,
        features,
        "chatbot_interaction_count",
    )?;
    let days = require(
        features.days_since_last_login,
        features,
        "days_since_last_login",
    )?;

    Ok(NormalizedMetrics {
        attendance_metric: inverse_percentage(attendance_rate),
        performance_metric: inverse_percentage(performance),
        library_metric: library_metric(library),
        chatbot_metric: chatbot_metric(chatbot),
        last_login_metric: last_login_metric(days),
    })
}

pub fn inverse_percentage(value: f64) -> f64 {
    if value.is_nan() {
        return 100.0;
    }
    100.0 - value.clamp(0.0, 100.0)
}

pub fn library_metric(access_count: u64) -> f64 {
    let count = access_count as f64;
    let metric = match access_count {
        0..=4 => 80.0 + (5.0 - count) * 4.0,
        5..=14 => 80.0 - (count - 5.0) * 4.0,
        _ => (40.0 - (count - 15.0) * 2.0).max(0.0),
    };
    metric.clamp(0.0, 100.0)
}

pub fn chatbot_metric(interaction_count: u64) -> f64 {
    let count = interaction_count as f64;
    let metric = match interaction_count {
        0..=2 => 70.0 + (3.0 - count) * 10.0,
        3..=9 => 70.0 - (count - 3.0) * 6.0,
        _ => (28.0 - (count - 10.0) * 2.0).max(0.0),
    };
    metric.clamp(0.0, 100.0)
}

pub fn last_login_metric(days_since_last_login: u64) -> f64 {
    let days = days_since_last_login as f64;
    let metric = match days_since_last_login {
        0..=3 => days * 6.67,
        4..=7 => 20.0 + (days - 3.0) * 7.5,
        _ => (50.0 + (days - 7.0) * 5.0).min(100.0),
    };
    metric.clamp(0.0, 100.0)
}

pub fn weighted_score(metrics: &NormalizedMetrics, weights: &Weights) -> f64 {
    let score = weights.attendance * metrics.attendance_metric
        + weights.performance * metrics.performance_metric
        + weights.library * metrics.library_metric
        + weights.chatbot * metrics.chatbot_metric
        + weights.last_login * metrics.last_login_metric;
    score.clamp(0.0, 100.0)
}

pub fn classify(dropout_score: f64, thresholds: &Thresholds) -> RiskLevel {
    if dropout_score >= thresholds.high {
        RiskLevel::High
    } else if dropout_score >= thresholds.medium {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Start of the trailing activity window ending at `now`. The window is
/// clamped to `1..=MAX_LOOKBACK_DAYS` days.
pub fn lookback_start(now: DateTime<Utc>, lookback_days: i64) -> DateTime<Utc> {
    let days = lookback_days.clamp(1, MAX_LOOKBACK_DAYS);
    now.checked_sub_signed(Duration::days(days))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Whole days elapsed since `last_login`, never negative.
pub fn days_since(now: DateTime<Utc>, last_login: DateTime<Utc>) -> u64 {
    (now - last_login).num_days().max(0) as u64
}
