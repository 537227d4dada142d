//! Scoring of feature rows supplied as CSV, without any data sources.

use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{FeatureSet, NormalizedMetrics, RiskLevel};
use crate::recommend::RecommendationGenerator;
use crate::risk::RiskScorer;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineScore {
    pub user_id: Uuid,
    pub dropout_score: f64,
    pub risk_level: RiskLevel,
    pub metrics: NormalizedMetrics,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowFailure {
    /// 1-based data row, header excluded
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OfflineReport {
    pub scores: Vec<OfflineScore>,
    pub failures: Vec<RowFailure>,
}

/// Score every row of a feature CSV. Rows with blank cells or malformed values
/// are reported individually; the remaining rows still score.
pub fn score_csv(
    path: &Path,
    scorer: &RiskScorer,
    recommender: &RecommendationGenerator,
) -> anyhow::Result<OfflineReport> {
    let reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    score_reader(reader, scorer, recommender)
}

pub fn score_reader<R: std::io::Read>(
    mut reader: csv::Reader<R>,
    scorer: &RiskScorer,
    recommender: &RecommendationGenerator,
) -> anyhow::Result<OfflineReport> {
    let mut report = OfflineReport::default();

    for (index, result) in reader.deserialize::<FeatureSet>().enumerate() {
        let row = index + 1;
        let features = match result {
            Ok(features) => features,
            Err(err) => {
                report.failures.push(RowFailure {
                    row,
                    reason: err.to_string(),
                });
                continue;
            }
        };

        match scorer.score(&features) {
            Ok(assessment) => report.scores.push(OfflineScore {
                user_id: features.student_id,
                dropout_score: assessment.dropout_score,
                risk_level: assessment.risk_level,
                recommendations: recommender.recommend(&assessment.metrics, assessment.risk_level),
                metrics: assessment.metrics,
            }),
            Err(err) => report.failures.push(RowFailure {
                row,
                reason: err.to_string(),
            }),
        }
    }

    Ok(report)
}
