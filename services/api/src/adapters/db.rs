//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `CatalogStore`, `EnrollmentLedger` and `IdentityVerifier` ports from the
//! core crate. It handles all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use enrollment_core::domain::{Course, Enrollment, Identity, Progress};
use enrollment_core::ports::{
    CatalogStore, EnrollmentLedger, IdentityVerifier, PortError, PortResult,
};
use sqlx::{FromRow, PgPool};
use tracing::error;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the store ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct CourseRecord {
    id: Uuid,
    title: String,
    description: Option<String>,
    video_url: String,
    created_at: DateTime<Utc>,
}
impl CourseRecord {
    fn to_domain(self) -> PortResult<Course> {
        let id = self.id;
        Course::new(id, self.title, self.description, self.video_url, self.created_at)
            .map_err(|e| PortError::Unexpected(format!("Course {} is malformed: {}", id, e)))
    }
}

#[derive(FromRow)]
struct EnrollmentRecord {
    id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    progress: f64,
    created_at: DateTime<Utc>,
}
impl EnrollmentRecord {
    fn to_domain(self) -> PortResult<Enrollment> {
        let progress = Progress::from_percent(self.progress).ok_or_else(|| {
            PortError::Unexpected(format!("Enrollment {} has invalid progress", self.id))
        })?;
        Ok(Enrollment {
            id: self.id,
            user_id: self.user_id,
            course_id: self.course_id,
            progress,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct AuthSessionRecord {
    user_id: Uuid,
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl CatalogStore for DbAdapter {
    async fn list_courses(&self) -> PortResult<Vec<Course>> {
        let records = sqlx::query_as::<_, CourseRecord>(
            "SELECT id, title, description, video_url, created_at FROM courses",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn get_course(&self, course_id: Uuid) -> PortResult<Course> {
        let record = sqlx::query_as::<_, CourseRecord>(
            "SELECT id, title, description, video_url, created_at FROM courses WHERE id = $1",
        )
        .bind(course_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Course {} not found", course_id)),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        record.to_domain()
    }

    async fn ping(&self) -> PortResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database health check failed: {}", e);
                unexpected(e)
            })?;
        Ok(())
    }
}

#[async_trait]
impl EnrollmentLedger for DbAdapter {
    async fn insert_enrollment(&self, enrollment: Enrollment) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO enrollments (id, user_id, course_id, progress, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(enrollment.id)
        .bind(enrollment.user_id)
        .bind(enrollment.course_id)
        .bind(enrollment.progress.percent())
        .bind(enrollment.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => PortError::Conflict(format!(
                "User {} is already enrolled in course {}",
                enrollment.user_id, enrollment.course_id
            )),
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                PortError::NotFound(format!("Course {} not found", enrollment.course_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(())
    }

    async fn find_enrollment(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<Option<Enrollment>> {
        let record = sqlx::query_as::<_, EnrollmentRecord>(
            "SELECT id, user_id, course_id, progress, created_at FROM enrollments WHERE user_id = $1 AND course_id = $2",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        record.map(|r| r.to_domain()).transpose()
    }

    async fn set_progress(&self, enrollment_id: Uuid, progress: Progress) -> PortResult<()> {
        let result = sqlx::query("UPDATE enrollments SET progress = $1 WHERE id = $2")
            .bind(progress.percent())
            .bind(enrollment_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Enrollment {} not found",
                enrollment_id
            )));
        }
        Ok(())
    }

    async fn list_enrollments_for_user(&self, user_id: Uuid) -> PortResult<Vec<Enrollment>> {
        let records = sqlx::query_as::<_, EnrollmentRecord>(
            "SELECT id, user_id, course_id, progress, created_at FROM enrollments WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }
}

#[async_trait]
impl IdentityVerifier for DbAdapter {
    async fn verify_bearer(&self, token: &str) -> PortResult<Identity> {
        let record = sqlx::query_as::<_, AuthSessionRecord>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        record
            .map(|r| Identity { user_id: r.user_id })
            .ok_or(PortError::Unauthorized)
    }
}
