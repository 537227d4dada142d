//! Gathers the five behavioral indicators for one student.
//!
//! Lookups run concurrently and are isolated from each other: a failing source
//! is logged and replaced by its default while the rest complete normally.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::{EngineConfig, FeatureDefaults};
use crate::models::{FeatureSet, SessionStatus};
use crate::risk::{days_since, lookback_start};
use crate::sources::DataSources;

/// Outcome of a single feature lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    /// The source answered but holds no data for this student.
    Absent,
    Failed,
}

impl<T> Lookup<T> {
    fn or_defaults(self, when_absent: T, when_failed: T) -> T {
        match self {
            Lookup::Found(value) => value,
            Lookup::Absent => when_absent,
            Lookup::Failed => when_failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawFeatures {
    pub student_id: Uuid,
    pub attendance_rate: Lookup<f64>,
    pub avg_performance_score: Lookup<f64>,
    pub library_access_count: Lookup<u64>,
    pub chatbot_interaction_count: Lookup<u64>,
    pub days_since_last_login: Lookup<u64>,
}

impl RawFeatures {
    /// Resolve every lookup into a complete feature set.
    pub fn with_defaults(self, defaults: &FeatureDefaults) -> FeatureSet {
        FeatureSet::complete(
            self.student_id,
            self.attendance_rate
                .or_defaults(defaults.attendance_rate, defaults.attendance_rate),
            self.avg_performance_score.or_defaults(
                defaults.avg_performance_score,
                defaults.avg_performance_score,
            ),
            self.library_access_count.or_defaults(
                defaults.library_access_count,
                defaults.library_access_count,
            ),
            self.chatbot_interaction_count.or_defaults(
                defaults.chatbot_interaction_count,
                defaults.chatbot_interaction_count,
            ),
            self.days_since_last_login.or_defaults(
                defaults.days_since_never_logged_in,
                defaults.days_since_login_unavailable,
            ),
        )
    }
}

async fn settle<T, F>(student_id: Uuid, feature: &'static str, lookup: F) -> Lookup<T>
where
    F: Future<Output = anyhow::Result<Option<T>>>,
{
    match lookup.await {
        Ok(Some(value)) => Lookup::Found(value),
        Ok(None) => Lookup::Absent,
        Err(err) => {
            tracing::warn!(
                student_id = %student_id,
                feature,
                error = %format!("{err:#}"),
                "feature lookup failed, using default"
            );
            Lookup::Failed
        }
    }
}

pub struct FeatureCollector {
    sources: DataSources,
    defaults: FeatureDefaults,
    lookback_days: i64,
}

impl FeatureCollector {
    pub fn new(sources: DataSources, config: &EngineConfig) -> Self {
        Self {
            sources,
            defaults: config.defaults,
            lookback_days: config.lookback_days,
        }
    }

    pub async fn collect(&self, student_id: Uuid) -> FeatureSet {
        self.collect_at(student_id, Utc::now()).await
    }

    pub async fn collect_at(&self, student_id: Uuid, now: DateTime<Utc>) -> FeatureSet {
        self.lookup_all(student_id, now)
            .await
            .with_defaults(&self.defaults)
    }

    pub async fn lookup_all(&self, student_id: Uuid, now: DateTime<Utc>) -> RawFeatures {
        let since = lookback_start(now, self.lookback_days);
        let sources = &self.sources;

        let attendance = settle(student_id, "attendance_rate", async {
            let (completed, no_show) = tokio::try_join!(
                sources
                    .sessions
                    .count_by_status(student_id, SessionStatus::Completed),
                sources
                    .sessions
                    .count_by_status(student_id, SessionStatus::NoShow),
            )?;
            let scheduled = completed + no_show;
            if scheduled == 0 {
                return anyhow::Ok(None);
            }
            anyhow::Ok(Some(completed as f64 * 100.0 / scheduled as f64))
        });

        let performance = settle(student_id, "avg_performance_score", async {
            let summary = sources.performance.aggregated_metrics(student_id).await?;
            anyhow::Ok(summary.average_score)
        });

        let library = settle(
            student_id,
            "library_access_count",
            sources.library.access_count(student_id, since),
        );

        let chatbot = settle(student_id, "chatbot_interaction_count", async {
            let count = sources.interactions.count_by_user(student_id, since).await?;
            anyhow::Ok(Some(count))
        });

        let last_login = settle(student_id, "days_since_last_login", async {
            let last_login = sources.identity.last_login(student_id).await?;
            anyhow::Ok(last_login.map(|at| days_since(now, at)))
        });

        let (attendance, performance, library, chatbot, last_login) =
            tokio::join!(attendance, performance, library, chatbot, last_login);

        RawFeatures {
            student_id,
            attendance_rate: attendance,
            avg_performance_score: performance,
            library_access_count: library,
            chatbot_interaction_count: chatbot,
            days_since_last_login: last_login,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sources::testing::{FixedLibrary, MemoryStore, RecordingLibrary, StudentRecord};

    fn collector(store: MemoryStore) -> FeatureCollector {
        FeatureCollector::new(
            DataSources::from_store(Arc::new(store)),
            &EngineConfig::default(),
        )
    }

    #[test]
    fn defaults_map_absent_and_failed_lookups() {
        let student_id = Uuid::new_v4();
        let raw = RawFeatures {
            student_id,
            attendance_rate: Lookup::Absent,
            avg_performance_score: Lookup::Failed,
            library_access_count: Lookup::Absent,
            chatbot_interaction_count: Lookup::Failed,
            days_since_last_login: Lookup::Absent,
        };
        assert_eq!(
            raw.clone().with_defaults(&FeatureDefaults::default()),
            FeatureSet::complete(student_id, 75.0, 60.0, 10, 5, 30)
        );

        let raw = RawFeatures {
            days_since_last_login: Lookup::Failed,
            ..raw
        };
        assert_eq!(
            raw.with_defaults(&FeatureDefaults::default()).days_since_last_login,
            Some(7)
        );
    }

    #[tokio::test]
    async fn collects_recorded_activity() {
        let now = Utc::now();
        let mut store = MemoryStore::default();
        let mut record = StudentRecord::new("Avery Lee");
        record.completed = 3;
        record.no_show = 1;
        record.average_score = Some(82.5);
        record.interactions = 12;
        record.last_login = Some(now - Duration::days(4));
        let id = store.insert(record);

        let features = collector(store).collect_at(id, now).await;
        assert_eq!(features, FeatureSet::complete(id, 75.0, 82.5, 10, 12, 4));
    }

    #[tokio::test]
    async fn student_without_history_gets_defaults() {
        let mut store = MemoryStore::default();
        let id = store.insert(StudentRecord::new("Jules Moreno"));

        let raw = collector(store).lookup_all(id, Utc::now()).await;
        assert_eq!(raw.attendance_rate, Lookup::Absent);
        assert_eq!(raw.avg_performance_score, Lookup::Absent);
        assert_eq!(raw.library_access_count, Lookup::Absent);
        assert_eq!(raw.chatbot_interaction_count, Lookup::Found(0));
        assert_eq!(raw.days_since_last_login, Lookup::Absent);

        let features = raw.with_defaults(&FeatureDefaults::default());
        assert_eq!(features, FeatureSet::complete(id, 75.0, 60.0, 10, 0, 30));
    }

    #[tokio::test]
    async fn one_failing_source_does_not_block_the_others() {
        let now = Utc::now();
        let mut store = MemoryStore::default();
        let mut record = StudentRecord::new("Kiara Patel");
        record.completed = 1;
        record.no_show = 1;
        record.average_score = Some(40.0);
        record.interactions = 2;
        record.last_login = Some(now - Duration::days(1));
        let id = store.insert(record);
        store.fail("sessions");
        store.fail("login");

        let raw = collector(store).lookup_all(id, now).await;
        assert_eq!(raw.attendance_rate, Lookup::Failed);
        assert_eq!(raw.days_since_last_login, Lookup::Failed);
        assert_eq!(raw.avg_performance_score, Lookup::Found(40.0));
        assert_eq!(raw.chatbot_interaction_count, Lookup::Found(2));

        let features = raw.with_defaults(&FeatureDefaults::default());
        assert_eq!(features, FeatureSet::complete(id, 75.0, 40.0, 10, 2, 7));
    }

    #[tokio::test]
    async fn every_source_failing_still_yields_complete_features() {
        let mut store = MemoryStore::default();
        let id = store.insert(StudentRecord::new("Sam Ortiz"));
        for lookup in ["sessions", "performance", "chatbot", "login"] {
            store.fail(lookup);
        }

        let features = collector(store).collect(id).await;
        assert_eq!(features, FeatureSet::complete(id, 75.0, 60.0, 10, 5, 7));
    }

    #[tokio::test]
    async fn tracked_library_overrides_placeholder() {
        let mut store = MemoryStore::default();
        let id = store.insert(StudentRecord::new("Rin Sato"));
        let sources = DataSources::from_store(Arc::new(store)).with_library(Arc::new(FixedLibrary(2)));
        let collector = FeatureCollector::new(sources, &EngineConfig::default());

        let features = collector.collect(id).await;
        assert_eq!(features.library_access_count, Some(2));
    }

    #[tokio::test]
    async fn activity_counts_use_trailing_window() {
        let now = Utc::now();
        let mut store = MemoryStore::default();
        let id = store.insert(StudentRecord::new("Mara Quinn"));
        let store = Arc::new(store);
        let library = Arc::new(RecordingLibrary::default());

        let sources = DataSources::from_store(store.clone()).with_library(library.clone());
        let features = FeatureCollector::new(sources, &EngineConfig::default())
            .collect_at(id, now)
            .await;
        assert_eq!(features.library_access_count, Some(7));

        let expected = now - Duration::days(30);
        assert_eq!(*store.chatbot_since.lock().unwrap(), vec![expected]);
        assert_eq!(*library.since.lock().unwrap(), vec![expected]);
    }

    #[tokio::test]
    async fn configured_lookback_reaches_sources() {
        let now = Utc::now();
        let mut store = MemoryStore::default();
        let id = store.insert(StudentRecord::new("Ike Obi"));
        let store = Arc::new(store);
        let library = Arc::new(RecordingLibrary::default());
        let config = EngineConfig {
            lookback_days: 14,
            ..EngineConfig::default()
        };

        let sources = DataSources::from_store(store.clone()).with_library(library.clone());
        FeatureCollector::new(sources, &config).collect_at(id, now).await;

        let expected = now - Duration::days(14);
        assert_eq!(*store.chatbot_since.lock().unwrap(), vec![expected]);
        assert_eq!(*library.since.lock().unwrap(), vec![expected]);
    }
}
