//! Public entry point: single, batch and whole-roster predictions.

use chrono::Utc;
use futures::future::{join_all, try_join_all};
use uuid::Uuid;

use crate::collector::FeatureCollector;
use crate::config::EngineConfig;
use crate::error::PredictionError;
use crate::models::{PredictionFailure, PredictionKind, PredictionResponse, RiskPrediction};
use crate::recommend::RecommendationGenerator;
use crate::risk::RiskScorer;
use crate::sources::{DataSources, STUDENT_ROLE};

pub type PredictionOutcome = Result<RiskPrediction, PredictionError>;

/// What the caller asked to predict.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionRequest {
    Single(Uuid),
    Batch(Vec<Uuid>),
    All,
}

impl PredictionRequest {
    /// Build a request from loosely supplied options. Exactly one mode must be
    /// chosen and a batch must name at least one student.
    pub fn from_parts(
        student_id: Option<Uuid>,
        student_ids: Option<Vec<Uuid>>,
        all: bool,
    ) -> Result<Self, PredictionError> {
        match (student_id, student_ids, all) {
            (Some(id), None, false) => Ok(PredictionRequest::Single(id)),
            (None, Some(ids), false) if ids.is_empty() => Err(PredictionError::InvalidInput(
                "student id list must not be empty".to_string(),
            )),
            (None, Some(ids), false) => Ok(PredictionRequest::Batch(ids)),
            (None, None, true) => Ok(PredictionRequest::All),
            (None, None, false) => Err(PredictionError::InvalidInput(
                "provide a student id, a list of student ids, or request all students".to_string(),
            )),
            _ => Err(PredictionError::InvalidInput(
                "choose only one of a student id, a list of student ids, or all students"
                    .to_string(),
            )),
        }
    }

    pub fn kind(&self) -> PredictionKind {
        match self {
            PredictionRequest::Single(_) => PredictionKind::Single,
            PredictionRequest::Batch(_) => PredictionKind::Batch,
            PredictionRequest::All => PredictionKind::All,
        }
    }
}

pub struct PredictionOrchestrator {
    sources: DataSources,
    collector: FeatureCollector,
    scorer: RiskScorer,
    recommender: RecommendationGenerator,
}

impl PredictionOrchestrator {
    pub fn new(sources: DataSources, config: &EngineConfig) -> Self {
        Self {
            collector: FeatureCollector::new(sources.clone(), config),
            scorer: RiskScorer::new(config.scoring.clone()),
            recommender: RecommendationGenerator::new(),
            sources,
        }
    }

    pub async fn predict(&self, student_id: Uuid) -> PredictionOutcome {
        let features = self.collector.collect(student_id).await;
        let assessment = self.scorer.score(&features)?;
        let recommendations = self
            .recommender
            .recommend(&assessment.metrics, assessment.risk_level);

        let user_info = self
            .sources
            .identity
            .find_by_id(student_id)
            .await?
            .ok_or(PredictionError::StudentNotFound(student_id))?;

        Ok(RiskPrediction {
            user_id: student_id,
            dropout_score: assessment.dropout_score,
            risk_level: assessment.risk_level,
            metrics: assessment.metrics,
            recommendations,
            calculated_at: Utc::now(),
            user_info,
        })
    }

    /// Predict every student concurrently. Each student settles on its own, so
    /// one failure never discards the others. Output order matches input order.
    pub async fn predict_many(&self, student_ids: &[Uuid]) -> Vec<PredictionOutcome> {
        let outcomes = join_all(student_ids.iter().map(|id| self.predict(*id))).await;

        let failed = outcomes.iter().filter(|outcome| outcome.is_err()).count();
        tracing::info!(
            requested = student_ids.len(),
            failed,
            "batch prediction finished"
        );

        outcomes
    }

    /// Fail-fast batch: the first failing student aborts the whole call.
    pub async fn predict_many_strict(
        &self,
        student_ids: &[Uuid],
    ) -> Result<Vec<RiskPrediction>, PredictionError> {
        try_join_all(student_ids.iter().map(|id| self.predict(*id))).await
    }

    pub async fn active_students(&self) -> Result<Vec<Uuid>, PredictionError> {
        let ids = self.sources.identity.find_by_role(STUDENT_ROLE, true).await?;
        Ok(ids)
    }

    pub async fn predict_all(&self) -> Result<Vec<PredictionOutcome>, PredictionError> {
        let ids = self.active_students().await?;
        tracing::info!(students = ids.len(), "predicting all active students");
        Ok(self.predict_many(&ids).await)
    }

    /// Resolve a request into a response. A failing single prediction is
    /// returned as an error; batch failures are listed per student.
    pub async fn execute(
        &self,
        request: &PredictionRequest,
        strict: bool,
    ) -> Result<PredictionResponse, PredictionError> {
        let kind = request.kind();

        let ids = match request {
            PredictionRequest::Single(id) => {
                let prediction = self.predict(*id).await?;
                return Ok(PredictionResponse {
                    predictions: vec![prediction],
                    failures: Vec::new(),
                    kind,
                });
            }
            PredictionRequest::Batch(ids) => ids.clone(),
            PredictionRequest::All => self.active_students().await?,
        };

        if strict {
            let predictions = self.predict_many_strict(&ids).await?;
            return Ok(PredictionResponse {
                predictions,
                failures: Vec::new(),
                kind,
            });
        }

        let outcomes = self.predict_many(&ids).await;
        let mut predictions = Vec::new();
        let mut failures = Vec::new();

        for (id, outcome) in ids.iter().zip(outcomes) {
            match outcome {
                Ok(prediction) => predictions.push(prediction),
                Err(err) => {
                    tracing::warn!(student_id = %id, error = %err, "prediction failed");
                    failures.push(PredictionFailure {
                        user_id: *id,
                        reason: err.to_string(),
                    });
                }
            }
        }

        Ok(PredictionResponse {
            predictions,
            failures,
            kind,
        })
    }
}
