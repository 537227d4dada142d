use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{PerformanceSummary, SessionStatus, UserInfo};
use crate::sources::{IdentityStore, InteractionLog, PerformanceStore, SessionStore, STUDENT_ROLE};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

struct SeedStudent {
    id: &'static str,
    full_name: &'static str,
    email: &'static str,
    role: &'static str,
    last_login_days: Option<i64>,
    completed: usize,
    no_show: usize,
    scores: &'static [f64],
    interactions: usize,
}

const SEED_USERS: &[SeedStudent] = &[
    SeedStudent {
        id: "3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2",
        full_name: "Avery Lee",
        email: "avery.lee@campus.example.edu",
        role: STUDENT_ROLE,
        last_login_days: Some(1),
        completed: 9,
        no_show: 1,
        scores: &[88.0, 92.5, 79.0],
        interactions: 14,
    },
    SeedStudent {
        id: "0c22f1f1-9184-4fd4-9b21-28c68a6a89dc",
        full_name: "Jules Moreno",
        email: "jules.moreno@campus.example.edu",
        role: STUDENT_ROLE,
        last_login_days: Some(6),
        completed: 5,
        no_show: 3,
        scores: &[61.0, 55.5],
        interactions: 4,
    },
    SeedStudent {
        id: "d5a0a1a2-2a3c-44c2-8f73-60b7897a9dd2",
        full_name: "Kiara Patel",
        email: "kiara.patel@campus.example.edu",
        role: STUDENT_ROLE,
        last_login_days: Some(24),
        completed: 1,
        no_show: 6,
        scores: &[32.0],
        interactions: 0,
    },
    SeedStudent {
        id: "8e1c6a3b-5f0d-4c52-9a7e-2b4d6f8a1c3e",
        full_name: "Noor Haddad",
        email: "noor.haddad@campus.example.edu",
        role: STUDENT_ROLE,
        last_login_days: None,
        completed: 0,
        no_show: 0,
        scores: &[],
        interactions: 0,
    },
    SeedStudent {
        id: "5b9e2d47-1a6c-4f38-b0d2-7c3e9f1a4b86",
        full_name: "Dana Brooks",
        email: "dana.brooks@campus.example.edu",
        role: "advisor",
        last_login_days: Some(0),
        completed: 0,
        no_show: 0,
        scores: &[],
        interactions: 0,
    },
];

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let now = Utc::now();

    for student in SEED_USERS {
        let last_login = student.last_login_days.map(|days| now - Duration::days(days));
        let student_id: Uuid = sqlx::query(
            r#"
            INSERT INTO dropout_risk.users (id, full_name, email, role, is_active, last_login_at)
            VALUES ($1, $2, $3, $4, TRUE, $5)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name, last_login_at = EXCLUDED.last_login_at
            RETURNING id
            "#,
        )
        .bind(Uuid::parse_str(student.id)?)
        .bind(student.full_name)
        .bind(student.email)
        .bind(student.role)
        .bind(last_login)
        .fetch_one(pool)
        .await?
        .get("id");

        let statuses = std::iter::repeat(SessionStatus::Completed)
            .take(student.completed)
            .chain(std::iter::repeat(SessionStatus::NoShow).take(student.no_show));
        for (n, status) in statuses.enumerate() {
            sqlx::query(
                r#"
                INSERT INTO dropout_risk.sessions (id, student_id, status, scheduled_at, source_key)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (source_key) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(student_id)
            .bind(status.as_str())
            .bind(now - Duration::days(n as i64 * 3 + 1))
            .bind(format!("seed-session-{}-{n}", student.email))
            .execute(pool)
            .await?;
        }

        for (n, score) in student.scores.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO dropout_risk.simulation_metrics (id, student_id, score, recorded_at, source_key)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (source_key) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(student_id)
            .bind(*score)
            .bind(now - Duration::days(n as i64 * 7 + 2))
            .bind(format!("seed-metric-{}-{n}", student.email))
            .execute(pool)
            .await?;
        }

        for n in 0..student.interactions {
            sqlx::query(
                r#"
                INSERT INTO dropout_risk.chatbot_interactions (id, user_id, created_at, source_key)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (source_key) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(student_id)
            .bind(now - Duration::days(n as i64 % 28))
            .bind(format!("seed-chat-{}-{n}", student.email))
            .execute(pool)
            .await?;
        }
    }

    Ok(())
}

/// Postgres-backed collaborator for identity, sessions, metrics and chatbot logs.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_count(total: i64) -> anyhow::Result<u64> {
    u64::try_from(total).context("negative row count")
}

#[async_trait]
impl IdentityStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserInfo>> {
        let row = sqlx::query(
            "SELECT id, full_name, email FROM dropout_risk.users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to load user")?;

        Ok(row.map(|row| UserInfo {
            id: row.get("id"),
            full_name: row.get("full_name"),
            email: row.get("email"),
        }))
    }

    async fn find_by_role(&self, role: &str, is_active: bool) -> anyhow::Result<Vec<Uuid>> {
        let rows = sqlx::query(
            "SELECT id FROM dropout_risk.users \
             WHERE role = $1 AND is_active = $2 \
             ORDER BY full_name, id",
        )
        .bind(role)
        .bind(is_active)
        .fetch_all(&self.pool)
        .await
        .context("failed to list users by role")?;

        Ok(rows.into_iter().map(|row| row.get("id")).collect())
    }

    async fn last_login(&self, id: Uuid) -> anyhow::Result<Option<DateTime<Utc>>> {
        let row = sqlx::query("SELECT last_login_at FROM dropout_risk.users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to load last login")?;

        Ok(row.and_then(|row| row.get::<Option<DateTime<Utc>>, _>("last_login_at")))
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn count_by_status(&self, student_id: Uuid, status: SessionStatus) -> anyhow::Result<u64> {
        let total: i64 = sqlx::query(
            "SELECT COUNT(*) AS total FROM dropout_risk.sessions \
             WHERE student_id = $1 AND status = $2",
        )
        .bind(student_id)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to count {} sessions", status.as_str()))?
        .get("total");

        to_count(total)
    }
}

#[async_trait]
impl PerformanceStore for PgStore {
    async fn aggregated_metrics(&self, student_id: Uuid) -> anyhow::Result<PerformanceSummary> {
        let row = sqlx::query(
            "SELECT AVG(score) AS average_score, COUNT(*) AS samples \
             FROM dropout_risk.simulation_metrics WHERE student_id = $1",
        )
        .bind(student_id)
        .fetch_one(&self.pool)
        .await
        .context("failed to aggregate simulation metrics")?;

        Ok(PerformanceSummary {
            average_score: row.get("average_score"),
            samples: row.get("samples"),
        })
    }
}

#[async_trait]
impl InteractionLog for PgStore {
    async fn count_by_user(&self, user_id: Uuid, since: DateTime<Utc>) -> anyhow::Result<u64> {
        let total: i64 = sqlx::query(
            "SELECT COUNT(*) AS total FROM dropout_risk.chatbot_interactions \
             WHERE user_id = $1 AND created_at >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .context("failed to count chatbot interactions")?
        .get("total");

        to_count(total)
    }
}
