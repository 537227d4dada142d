//! End-to-end prediction through the public API with in-memory sources

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dropout_risk::models::{PerformanceSummary, PredictionKind, SessionStatus, UserInfo};
use dropout_risk::sources::{IdentityStore, InteractionLog, PerformanceStore, SessionStore};
use dropout_risk::{
    DataSources, EngineConfig, PredictionError, PredictionOrchestrator, PredictionRequest,
    RiskLevel,
};
use uuid::Uuid;

struct Campus {
    users: HashMap<Uuid, UserInfo>,
    roster: Vec<Uuid>,
    last_login: HashMap<Uuid, DateTime<Utc>>,
    attendance: HashMap<Uuid, (u64, u64)>,
    scores: HashMap<Uuid, f64>,
    broken_sessions: bool,
}

impl Campus {
    fn new() -> Self {
        Self {
            users: HashMap::new(),
            roster: Vec::new(),
            last_login: HashMap::new(),
            attendance: HashMap::new(),
            scores: HashMap::new(),
            broken_sessions: false,
        }
    }

    fn enrol(&mut self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.users.insert(
            id,
            UserInfo {
                id,
                full_name: name.to_string(),
                email: format!("{}@campus.test", name.to_lowercase()),
            },
        );
        self.roster.push(id);
        id
    }
}

#[async_trait]
impl IdentityStore for Campus {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserInfo>> {
        Ok(self.users.get(&id).cloned())
    }

    async fn find_by_role(&self, _role: &str, _is_active: bool) -> anyhow::Result<Vec<Uuid>> {
        Ok(self.roster.clone())
    }

    async fn last_login(&self, id: Uuid) -> anyhow::Result<Option<DateTime<Utc>>> {
        Ok(self.last_login.get(&id).copied())
    }
}

#[async_trait]
impl SessionStore for Campus {
    async fn count_by_status(&self, student_id: Uuid, status: SessionStatus) -> anyhow::Result<u64> {
        if self.broken_sessions {
            anyhow::bail!("session store offline");
        }
        let (completed, no_show) = self.attendance.get(&student_id).copied().unwrap_or((0, 0));
        Ok(match status {
            SessionStatus::Completed => completed,
            SessionStatus::NoShow => no_show,
            _ => 0,
        })
    }
}

#[async_trait]
impl PerformanceStore for Campus {
    async fn aggregated_metrics(&self, student_id: Uuid) -> anyhow::Result<PerformanceSummary> {
        Ok(PerformanceSummary {
            average_score: self.scores.get(&student_id).copied(),
            samples: 1,
        })
    }
}

#[async_trait]
impl InteractionLog for Campus {
    async fn count_by_user(&self, _user_id: Uuid, _since: DateTime<Utc>) -> anyhow::Result<u64> {
        Ok(5)
    }
}

fn engine(campus: Campus) -> PredictionOrchestrator {
    PredictionOrchestrator::new(
        DataSources::from_store(Arc::new(campus)),
        &EngineConfig::default(),
    )
}

#[tokio::test]
async fn student_with_no_history_scores_on_defaults() {
    let mut campus = Campus::new();
    let id = campus.enrol("Noor");
    campus.last_login.insert(id, Utc::now() - Duration::days(7));

    let prediction = engine(campus).predict(id).await.unwrap();
    assert!((prediction.dropout_score - 43.2).abs() < 1e-9);
    assert_eq!(prediction.risk_level, RiskLevel::Medium);
    assert_eq!(
        prediction.recommendations,
        vec!["Student is performing well - Continue monitoring".to_string()]
    );
    assert_eq!(prediction.user_info.full_name, "Noor");
}

#[tokio::test]
async fn failing_attendance_source_degrades_to_default() {
    let mut campus = Campus::new();
    let id = campus.enrol("Avery");
    campus.attendance.insert(id, (0, 10));
    campus.broken_sessions = true;

    let prediction = engine(campus).predict(id).await.unwrap();
    assert_eq!(prediction.metrics.attendance_metric, 25.0);
}

#[tokio::test]
async fn whole_roster_response_serializes_to_expected_shape() {
    let mut campus = Campus::new();
    let struggling = campus.enrol("Kiara");
    campus.attendance.insert(struggling, (1, 9));
    campus.scores.insert(struggling, 20.0);
    let thriving = campus.enrol("Jules");
    campus.attendance.insert(thriving, (10, 0));
    campus.scores.insert(thriving, 95.0);
    campus.last_login.insert(thriving, Utc::now());

    let response = engine(campus)
        .execute(&PredictionRequest::All, false)
        .await
        .unwrap();
    assert_eq!(response.kind, PredictionKind::All);

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["type"], "ALL");
    assert!(json.get("failures").is_none());

    let predictions = json["predictions"].as_array().unwrap();
    assert_eq!(predictions.len(), 2);
    assert_eq!(predictions[0]["userId"], struggling.to_string());
    assert_eq!(predictions[0]["riskLevel"], "HIGH");
    assert_eq!(predictions[0]["metrics"]["attendanceMetric"], 90.0);
    assert_eq!(predictions[0]["userInfo"]["fullName"], "Kiara");
    assert_eq!(predictions[1]["riskLevel"], "LOW");
    assert!(predictions[1]["calculatedAt"].is_string());
}

#[tokio::test]
async fn single_request_for_unknown_student_fails() {
    let missing = Uuid::new_v4();
    let err = engine(Campus::new())
        .execute(&PredictionRequest::Single(missing), false)
        .await
        .unwrap_err();
    assert!(matches!(err, PredictionError::StudentNotFound(_)));
    assert_eq!(err.to_string(), format!("student {missing} not found"));
}
