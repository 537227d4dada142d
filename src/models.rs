use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Scheduling state of a student session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Scheduled,
    Completed,
    NoShow,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "SCHEDULED",
            SessionStatus::Completed => "COMPLETED",
            SessionStatus::NoShow => "NO_SHOW",
            SessionStatus::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceSummary {
    pub average_score: Option<f64>,
    pub samples: i64,
}

/// Behavioral indicators for one student.
///
/// Every field must be present before scoring. Fields are optional here so that
/// incomplete rows from outside the collector are rejected by the scorer rather
/// than silently defaulted. In CSV input a blank `days_since_last_login` cell
/// means the value is missing, not that the student never logged in.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeatureSet {
    pub student_id: Uuid,
    pub attendance_rate: Option<f64>,
    pub avg_performance_score: Option<f64>,
    pub library_access_count: Option<u64>,
    pub chatbot_interaction_count: Option<u64>,
    pub days_since_last_login: Option<u64>,
}

impl FeatureSet {
    pub fn complete(
        student_id: Uuid,
        attendance_rate: f64,
        avg_performance_score: f64,
        library_access_count: u64,
        chatbot_interaction_count: u64,
        days_since_last_login: u64,
    ) -> Self {
        Self {
            student_id,
            attendance_rate: Some(attendance_rate),
            avg_performance_score: Some(avg_performance_score),
            library_access_count: Some(library_access_count),
            chatbot_interaction_count: Some(chatbot_interaction_count),
            days_since_last_login: Some(days_since_last_login),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

/// Per-indicator risk contributions, each on a 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedMetrics {
    pub attendance_metric: f64,
    pub performance_metric: f64,
    pub library_metric: f64,
    pub chatbot_metric: f64,
    pub last_login_metric: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub dropout_score: f64,
    pub risk_level: RiskLevel,
    pub metrics: NormalizedMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskPrediction {
    pub user_id: Uuid,
    pub dropout_score: f64,
    pub risk_level: RiskLevel,
    pub metrics: NormalizedMetrics,
    pub recommendations: Vec<String>,
    pub calculated_at: DateTime<Utc>,
    pub user_info: UserInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PredictionKind {
    Single,
    Batch,
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionFailure {
    pub user_id: Uuid,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionResponse {
    pub predictions: Vec<RiskPrediction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<PredictionFailure>,
    #[serde(rename = "type")]
    pub kind: PredictionKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskSummary {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub failed: usize,
    pub mean_score: f64,
}

impl PredictionResponse {
    pub fn summary(&self) -> RiskSummary {
        let mut summary = RiskSummary {
            total: self.predictions.len() + self.failures.len(),
            failed: self.failures.len(),
            ..RiskSummary::default()
        };

        for prediction in &self.predictions {
            match prediction.risk_level {
                RiskLevel::High => summary.high += 1,
                RiskLevel::Medium => summary.medium += 1,
                RiskLevel::Low => summary.low += 1,
            }
        }

        if !self.predictions.is_empty() {
            let total_score: f64 = self.predictions.iter().map(|p| p.dropout_score).sum();
            summary.mean_score = total_score / self.predictions.len() as f64;
        }

        summary
    }
}
