//! Collaborator interfaces the engine reads student activity from.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{PerformanceSummary, SessionStatus, UserInfo};

pub const STUDENT_ROLE: &str = "student";

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserInfo>>;

    async fn find_by_role(&self, role: &str, is_active: bool) -> anyhow::Result<Vec<Uuid>>;

    /// `None` when the user has never logged in.
    async fn last_login(&self, id: Uuid) -> anyhow::Result<Option<DateTime<Utc>>>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn count_by_status(&self, student_id: Uuid, status: SessionStatus) -> anyhow::Result<u64>;
}

#[async_trait]
pub trait PerformanceStore: Send + Sync {
    async fn aggregated_metrics(&self, student_id: Uuid) -> anyhow::Result<PerformanceSummary>;
}

#[async_trait]
pub trait InteractionLog: Send + Sync {
    async fn count_by_user(&self, user_id: Uuid, since: DateTime<Utc>) -> anyhow::Result<u64>;
}

#[async_trait]
pub trait LibraryActivity: Send + Sync {
    /// `None` when access is not tracked for this student.
    async fn access_count(&self, student_id: Uuid, since: DateTime<Utc>) -> anyhow::Result<Option<u64>>;
}

/// Library access is not recorded yet; every student gets the configured
/// default, so the library contribution does not discriminate between students.
#[derive(Debug, Clone, Copy, Default)]
pub struct UntrackedLibrary;

#[async_trait]
impl LibraryActivity for UntrackedLibrary {
    async fn access_count(&self, _student_id: Uuid, _since: DateTime<Utc>) -> anyhow::Result<Option<u64>> {
        Ok(None)
    }
}

/// The set of collaborators one engine instance reads from.
#[derive(Clone)]
pub struct DataSources {
    pub identity: Arc<dyn IdentityStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub performance: Arc<dyn PerformanceStore>,
    pub interactions: Arc<dyn InteractionLog>,
    pub library: Arc<dyn LibraryActivity>,
}

impl DataSources {
    /// Use one backing store for every tracked source. Library access stays
    /// untracked until replaced with [`DataSources::with_library`].
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: IdentityStore + SessionStore + PerformanceStore + InteractionLog + 'static,
    {
        Self {
            identity: store.clone(),
            sessions: store.clone(),
            performance: store.clone(),
            interactions: store,
            library: Arc::new(UntrackedLibrary),
        }
    }

    pub fn with_library(mut self, library: Arc<dyn LibraryActivity>) -> Self {
        self.library = library;
        self
    }
}
