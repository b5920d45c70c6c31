//! crates/enrollment_core/src/service.rs
//!
//! The enrollment service: lists the catalog, enrolls users into courses and
//! records playback progress, enforcing the ledger invariants on top of the ports.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Course, Enrollment, EnrollmentReceipt, Identity, Progress, RequestContext};
use crate::ports::{CatalogStore, EnrollmentLedger, PortError};

/// Tagged failure kinds of the enrollment service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid course id: {0}")]
    InvalidCourseId(String),
    #[error("Invalid progress: {0}")]
    InvalidProgress(String),
    #[error("Course {0} not found")]
    CourseNotFound(Uuid),
    #[error("Already enrolled in course {0}")]
    DuplicateEnrollment(Uuid),
    #[error("Not enrolled in course {0}")]
    NotEnrolled(Uuid),
    #[error("{0}")]
    StoreFailure(String),
}

impl From<PortError> for ServiceError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::Unauthorized => ServiceError::Unauthorized,
            PortError::NotFound(msg) | PortError::Conflict(msg) | PortError::Unexpected(msg) => {
                ServiceError::StoreFailure(msg)
            }
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Clone)]
pub struct EnrollmentService {
    catalog: Arc<dyn CatalogStore>,
    ledger: Arc<dyn EnrollmentLedger>,
}

impl EnrollmentService {
    pub fn new(catalog: Arc<dyn CatalogStore>, ledger: Arc<dyn EnrollmentLedger>) -> Self {
        Self { catalog, ledger }
    }

    /// Lists the whole catalog. The catalog is public, so no identity is required.
    pub async fn list_courses(&self) -> ServiceResult<Vec<Course>> {
        Ok(self.catalog.list_courses().await?)
    }

    pub async fn health(&self) -> ServiceResult<()> {
        Ok(self.catalog.ping().await?)
    }

    /// Enrolls the caller into `course_id` with zero progress.
    pub async fn enroll(
        &self,
        ctx: &RequestContext,
        course_id: &str,
    ) -> ServiceResult<EnrollmentReceipt> {
        let identity = require_identity(ctx)?;
        let course_id = parse_course_id(course_id)?;

        match self.catalog.get_course(course_id).await {
            Ok(_) => {}
            Err(PortError::NotFound(_)) => return Err(ServiceError::CourseNotFound(course_id)),
            Err(e) => return Err(e.into()),
        }

        if self
            .ledger
            .find_enrollment(identity.user_id, course_id)
            .await?
            .is_some()
        {
            return Err(ServiceError::DuplicateEnrollment(course_id));
        }

        let enrollment = Enrollment::start(identity.user_id, course_id, Utc::now());
        let enrolled_at = enrollment.created_at;
        match self.ledger.insert_enrollment(enrollment).await {
            Ok(()) => {}
            // Lost a race against a concurrent enroll for the same pair.
            Err(PortError::Conflict(_)) => return Err(ServiceError::DuplicateEnrollment(course_id)),
            Err(e) => {
                warn!("Failed to persist enrollment for user {}: {}", identity.user_id, e);
                return Err(e.into());
            }
        }

        info!("User {} enrolled in course {}", identity.user_id, course_id);
        Ok(EnrollmentReceipt {
            course_id,
            enrolled_at,
        })
    }

    /// Records the latest playback position. Each report overwrites the previous value.
    pub async fn report_progress(
        &self,
        ctx: &RequestContext,
        course_id: &str,
        played_fraction: f64,
    ) -> ServiceResult<()> {
        let identity = require_identity(ctx)?;
        let course_id = parse_course_id(course_id)?;
        let progress = Progress::from_played_fraction(played_fraction).ok_or_else(|| {
            ServiceError::InvalidProgress(format!("{} is not a finite fraction", played_fraction))
        })?;

        let enrollment = self
            .ledger
            .find_enrollment(identity.user_id, course_id)
            .await?
            .ok_or(ServiceError::NotEnrolled(course_id))?;

        self.ledger.set_progress(enrollment.id, progress).await?;
        Ok(())
    }

    /// Lists the caller's enrollments together with their progress.
    pub async fn my_enrollments(&self, ctx: &RequestContext) -> ServiceResult<Vec<Enrollment>> {
        let identity = require_identity(ctx)?;
        Ok(self.ledger.list_enrollments_for_user(identity.user_id).await?)
    }
}

fn require_identity(ctx: &RequestContext) -> ServiceResult<Identity> {
    ctx.identity.ok_or(ServiceError::Unauthorized)
}

fn parse_course_id(raw: &str) -> ServiceResult<Uuid> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::InvalidCourseId("courseId is required".to_string()));
    }
    Uuid::parse_str(trimmed)
        .map_err(|_| ServiceError::InvalidCourseId(format!("'{}' is not a valid course id", trimmed)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryCatalog, InMemoryLedger};

    struct Fixture {
        catalog: Arc<InMemoryCatalog>,
        ledger: Arc<InMemoryLedger>,
        service: EnrollmentService,
        course: Course,
    }

    fn fixture() -> Fixture {
        let course = Course::new(
            Uuid::new_v4(),
            "Intro",
            Some("First steps".to_string()),
            "http://x/v1",
            Utc::now(),
        )
        .unwrap();
        let catalog = Arc::new(InMemoryCatalog::new(vec![course.clone()]));
        let ledger = Arc::new(InMemoryLedger::new());
        let service = EnrollmentService::new(catalog.clone(), ledger.clone());
        Fixture {
            catalog,
            ledger,
            service,
            course,
        }
    }

    fn user() -> RequestContext {
        RequestContext::authenticated(Identity {
            user_id: Uuid::new_v4(),
        })
    }

    #[tokio::test]
    async fn list_courses_returns_catalog_contents() {
        let f = fixture();
        let second = Course::new(Uuid::new_v4(), "Advanced", None, "http://x/v2", Utc::now()).unwrap();
        f.catalog.add(second.clone());

        let courses = f.service.list_courses().await.unwrap();
        assert_eq!(courses, vec![f.course.clone(), second]);
    }

    #[tokio::test]
    async fn list_courses_surfaces_store_failure() {
        let f = fixture();
        f.catalog.fail_reads("connection refused");

        let err = f.service.list_courses().await.unwrap_err();
        assert!(matches!(err, ServiceError::StoreFailure(msg) if msg == "connection refused"));
    }

    #[tokio::test]
    async fn enroll_creates_one_enrollment_with_zero_progress() {
        let f = fixture();
        let ctx = user();

        let receipt = f.service.enroll(&ctx, &f.course.id.to_string()).await.unwrap();
        assert_eq!(receipt.course_id, f.course.id);

        let stored = f.ledger.enrollments();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].user_id, ctx.identity.unwrap().user_id);
        assert_eq!(stored[0].course_id, f.course.id);
        assert_eq!(stored[0].progress, Progress::ZERO);
        assert_eq!(stored[0].created_at, receipt.enrolled_at);
    }

    #[tokio::test]
    async fn enroll_without_identity_is_unauthorized_and_writes_nothing() {
        let f = fixture();

        let err = f
            .service
            .enroll(&RequestContext::anonymous(), &f.course.id.to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized));
        assert!(f.ledger.enrollments().is_empty());
    }

    #[tokio::test]
    async fn enroll_twice_is_rejected_as_duplicate() {
        let f = fixture();
        let ctx = user();
        let id = f.course.id.to_string();

        f.service.enroll(&ctx, &id).await.unwrap();
        let err = f.service.enroll(&ctx, &id).await.unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateEnrollment(c) if c == f.course.id));
        assert_eq!(f.ledger.enrollments().len(), 1);
    }

    #[tokio::test]
    async fn two_users_can_enroll_in_the_same_course() {
        let f = fixture();
        let id = f.course.id.to_string();

        f.service.enroll(&user(), &id).await.unwrap();
        f.service.enroll(&user(), &id).await.unwrap();
        assert_eq!(f.ledger.enrollments().len(), 2);
    }

    #[tokio::test]
    async fn enroll_rejects_malformed_and_unknown_courses() {
        let f = fixture();
        let ctx = user();

        let err = f.service.enroll(&ctx, "  ").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCourseId(_)));

        let err = f.service.enroll(&ctx, "c1").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCourseId(_)));

        let unknown = Uuid::new_v4();
        let err = f.service.enroll(&ctx, &unknown.to_string()).await.unwrap_err();
        assert!(matches!(err, ServiceError::CourseNotFound(c) if c == unknown));

        assert!(f.ledger.enrollments().is_empty());
    }

    #[tokio::test]
    async fn enroll_surfaces_ledger_write_failure_message() {
        let f = fixture();
        f.ledger.fail_writes("connection reset by peer");

        let err = f
            .service
            .enroll(&user(), &f.course.id.to_string())
            .await
            .unwrap_err();
        assert!(matches!(&err, ServiceError::StoreFailure(msg) if msg == "connection reset by peer"));
        assert_eq!(err.to_string(), "connection reset by peer");
    }

    #[tokio::test]
    async fn report_progress_sets_latest_clamped_value() {
        let f = fixture();
        let ctx = user();
        let id = f.course.id.to_string();
        f.service.enroll(&ctx, &id).await.unwrap();

        f.service.report_progress(&ctx, &id, 0.4).await.unwrap();
        assert_eq!(f.ledger.enrollments()[0].progress.percent(), 40.0);

        // Latest report wins, even when it moves backwards.
        f.service.report_progress(&ctx, &id, 0.1).await.unwrap();
        assert_eq!(f.ledger.enrollments()[0].progress.percent(), 10.0);

        f.service.report_progress(&ctx, &id, 3.0).await.unwrap();
        assert_eq!(f.ledger.enrollments()[0].progress, Progress::COMPLETE);
    }

    #[tokio::test]
    async fn report_progress_clamps_overflowing_fraction_to_complete() {
        let f = fixture();
        let ctx = user();
        let id = f.course.id.to_string();
        f.service.enroll(&ctx, &id).await.unwrap();

        f.service.report_progress(&ctx, &id, 1e307).await.unwrap();
        assert_eq!(f.ledger.enrollments()[0].progress, Progress::COMPLETE);
    }

    #[tokio::test]
    async fn report_progress_requires_an_enrollment() {
        let f = fixture();

        let err = f
            .service
            .report_progress(&user(), &f.course.id.to_string(), 0.5)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotEnrolled(c) if c == f.course.id));
    }

    #[tokio::test]
    async fn report_progress_rejects_anonymous_and_non_finite_input() {
        let f = fixture();
        let ctx = user();
        let id = f.course.id.to_string();
        f.service.enroll(&ctx, &id).await.unwrap();

        let err = f
            .service
            .report_progress(&RequestContext::anonymous(), &id, 0.5)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized));

        let err = f.service.report_progress(&ctx, &id, f64::NAN).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidProgress(_)));
        assert_eq!(f.ledger.enrollments()[0].progress, Progress::ZERO);
    }

    #[tokio::test]
    async fn my_enrollments_only_lists_the_callers_rows() {
        let f = fixture();
        let me = user();
        let id = f.course.id.to_string();
        f.service.enroll(&me, &id).await.unwrap();
        f.service.enroll(&user(), &id).await.unwrap();

        let mine = f.service.my_enrollments(&me).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].user_id, me.identity.unwrap().user_id);

        let err = f
            .service
            .my_enrollments(&RequestContext::anonymous())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized));
    }
}
