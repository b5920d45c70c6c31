//! crates/enrollment_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or
//! credential verifiers.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Course, Enrollment, Identity, Progress};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Read path over the persistent collection of courses.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Returns every course in store-native order.
    async fn list_courses(&self) -> PortResult<Vec<Course>>;

    async fn get_course(&self, course_id: Uuid) -> PortResult<Course>;

    /// Checks that the backing store is reachable.
    async fn ping(&self) -> PortResult<()>;
}

/// The persistent collection of enrollments.
///
/// Implementations must reject a second enrollment for the same
/// `(user_id, course_id)` pair with [`PortError::Conflict`].
#[async_trait]
pub trait EnrollmentLedger: Send + Sync {
    async fn insert_enrollment(&self, enrollment: Enrollment) -> PortResult<()>;

    async fn find_enrollment(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<Option<Enrollment>>;

    async fn set_progress(&self, enrollment_id: Uuid, progress: Progress) -> PortResult<()>;

    async fn list_enrollments_for_user(&self, user_id: Uuid) -> PortResult<Vec<Enrollment>>;
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Resolves a bearer credential to a verified identity.
    /// Unknown or expired credentials yield [`PortError::Unauthorized`].
    async fn verify_bearer(&self, token: &str) -> PortResult<Identity>;
}
