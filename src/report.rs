use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::{PredictionResponse, RiskLevel, RiskPrediction};

/// Predictions ordered from highest to lowest dropout score.
pub fn rank_by_score(predictions: &[RiskPrediction]) -> Vec<&RiskPrediction> {
    let mut ranked: Vec<&RiskPrediction> = predictions.iter().collect();
    ranked.sort_by(|a, b| {
        b.dropout_score
            .partial_cmp(&a.dropout_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}

pub fn render_text(response: &PredictionResponse, limit: usize) -> String {
    let mut output = String::new();

    if response.predictions.is_empty() {
        let _ = writeln!(output, "No predictions produced.");
    } else {
        let _ = writeln!(output, "Students by dropout risk:");
        for prediction in rank_by_score(&response.predictions).into_iter().take(limit) {
            let _ = writeln!(
                output,
                "- {} ({}) score {:.2} [{}]",
                prediction.user_info.full_name,
                prediction.user_info.email,
                prediction.dropout_score,
                prediction.risk_level.as_str()
            );
            for recommendation in &prediction.recommendations {
                let _ = writeln!(output, "    * {recommendation}");
            }
        }
    }

    for failure in &response.failures {
        let _ = writeln!(output, "! {}: {}", failure.user_id, failure.reason);
    }

    output
}

pub fn build_report(response: &PredictionResponse, generated_at: DateTime<Utc>) -> String {
    let summary = response.summary();
    let mut output = String::new();

    let _ = writeln!(output, "# Dropout Risk Report");
    let _ = writeln!(
        output,
        "Generated {} for {} students",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        summary.total
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk Mix");
    let _ = writeln!(output, "- HIGH: {}", summary.high);
    let _ = writeln!(output, "- MEDIUM: {}", summary.medium);
    let _ = writeln!(output, "- LOW: {}", summary.low);
    if summary.failed > 0 {
        let _ = writeln!(output, "- not scored: {}", summary.failed);
    }
    let _ = writeln!(output, "- mean score: {:.2}", summary.mean_score);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Highest Risk Students");

    let at_risk: Vec<&RiskPrediction> = rank_by_score(&response.predictions)
        .into_iter()
        .filter(|p| p.risk_level != RiskLevel::Low)
        .take(10)
        .collect();

    if at_risk.is_empty() {
        let _ = writeln!(output, "No students above LOW risk.");
    } else {
        for prediction in at_risk {
            let _ = writeln!(
                output,
                "- {} ({}) score {:.2} [{}]: {}",
                prediction.user_info.full_name,
                prediction.user_info.email,
                prediction.dropout_score,
                prediction.risk_level.as_str(),
                prediction.recommendations.join("; ")
            );
        }
    }

    if !response.failures.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Not Scored");
        for failure in &response.failures {
            let _ = writeln!(output, "- {}: {}", failure.user_id, failure.reason);
        }
    }

    output
}
