use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when interacting with the job store
#[derive(Debug, Error)]
pub enum JobStoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Analysis job lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

/// One analysis job row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisJob {
    pub id: Uuid,
    pub job_type: String,
    pub entity_id: Uuid,
    pub entity_type: String,
    pub status: JobStatus,
    pub priority: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Bookkeeping store for analysis jobs
///
/// Entity rows live in the hosted database; only this queue is local.
/// Jobs move queued -> running -> completed | failed; the submit path
/// enqueues and the analysis pipeline records the outcome.
pub struct JobStore {
    pool: PgPool,
}

impl JobStore {
    /// Create a new job store from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, JobStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new job store from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self, JobStoreError> {
        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
        )
        .await
    }

    /// Enqueue an analysis job for an entity
    ///
    /// Uses INSERT ... ON CONFLICT so re-submitting the same entity resets
    /// the existing job instead of failing.
    pub async fn enqueue(
        &self,
        job_type: &str,
        entity_id: Uuid,
        entity_type: &str,
        priority: i32,
    ) -> Result<Uuid, JobStoreError> {
        let query = r#"
            INSERT INTO analysis_jobs (job_type, entity_id, entity_type, status, priority, created_at)
            VALUES ($1, $2, $3, 'queued', $4, NOW())
            ON CONFLICT (entity_id, entity_type, job_type)
            DO UPDATE SET
                status = 'queued',
                priority = EXCLUDED.priority,
                error_message = NULL,
                created_at = NOW(),
                started_at = NULL,
                completed_at = NULL
            RETURNING id
        "#;

        let row = sqlx::query(query)
            .bind(job_type)
            .bind(entity_id)
            .bind(entity_type)
            .bind(priority)
            .fetch_one(&self.pool)
            .await?;

        let id: Uuid = row.get("id");

        tracing::debug!(
            "Enqueued {} job for {} {} (priority {})",
            job_type,
            entity_type,
            entity_id,
            priority
        );

        Ok(id)
    }

    /// Mark a job as running
    pub async fn mark_running(
        &self,
        entity_id: Uuid,
        entity_type: &str,
    ) -> Result<(), JobStoreError> {
        sqlx::query(
            r#"
            UPDATE analysis_jobs
            SET status = 'running', started_at = NOW()
            WHERE entity_id = $1 AND entity_type = $2
            "#,
        )
        .bind(entity_id)
        .bind(entity_type)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Mark a job as completed
    pub async fn mark_completed(
        &self,
        entity_id: Uuid,
        entity_type: &str,
    ) -> Result<(), JobStoreError> {
        sqlx::query(
            r#"
            UPDATE analysis_jobs
            SET status = 'completed', completed_at = NOW()
            WHERE entity_id = $1 AND entity_type = $2
            "#,
        )
        .bind(entity_id)
        .bind(entity_type)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Mark a job as failed with an error message
    pub async fn mark_failed(
        &self,
        entity_id: Uuid,
        entity_type: &str,
        error_message: &str,
    ) -> Result<(), JobStoreError> {
        sqlx::query(
            r#"
            UPDATE analysis_jobs
            SET status = 'failed', error_message = $3, completed_at = NOW()
            WHERE entity_id = $1 AND entity_type = $2
            "#,
        )
        .bind(entity_id)
        .bind(entity_type)
        .bind(error_message)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch the next queued job by priority, then age
    pub async fn next_queued(&self) -> Result<Option<AnalysisJob>, JobStoreError> {
        let query = r#"
            SELECT id, job_type, entity_id, entity_type, status, priority,
                   error_message, created_at, started_at, completed_at
            FROM analysis_jobs
            WHERE status = 'queued'
            ORDER BY priority DESC, created_at
            LIMIT 1
        "#;

        let row = sqlx::query(query).fetch_optional(&self.pool).await?;

        Ok(row.map(Self::row_to_job))
    }

    /// Fetch the job for an entity, if any
    pub async fn job_for_entity(
        &self,
        entity_id: Uuid,
        entity_type: &str,
    ) -> Result<Option<AnalysisJob>, JobStoreError> {
        let query = r#"
            SELECT id, job_type, entity_id, entity_type, status, priority,
                   error_message, created_at, started_at, completed_at
            FROM analysis_jobs
            WHERE entity_id = $1 AND entity_type = $2
        "#;

        let row = sqlx::query(query)
            .bind(entity_id)
            .bind(entity_type)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Self::row_to_job))
    }

    /// Counts by status, for the health endpoint
    pub async fn queue_stats(&self) -> Result<QueueStats, JobStoreError> {
        let query = r#"
            SELECT
                COUNT(*) as total,
                COUNT(*) FILTER (WHERE status = 'queued') as queued,
                COUNT(*) FILTER (WHERE status = 'running') as running,
                COUNT(*) FILTER (WHERE status = 'completed') as completed,
                COUNT(*) FILTER (WHERE status = 'failed') as failed
            FROM analysis_jobs
        "#;

        let row = sqlx::query(query).fetch_one(&self.pool).await?;

        Ok(QueueStats {
            total: row.get("total"),
            queued: row.get("queued"),
            running: row.get("running"),
            completed: row.get("completed"),
            failed: row.get("failed"),
        })
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, JobStoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }

    fn row_to_job(row: sqlx::postgres::PgRow) -> AnalysisJob {
        AnalysisJob {
            id: row.get("id"),
            job_type: row.get("job_type"),
            entity_id: row.get("entity_id"),
            entity_type: row.get("entity_type"),
            status: row.get("status"),
            priority: row.get("priority"),
            error_message: row.get("error_message"),
            created_at: row.get("created_at"),
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
        }
    }
}

/// Job counts by status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStats {
    pub total: i64,
    pub queued: i64,
    pub running: i64,
    pub completed: i64,
    pub failed: i64,
}
