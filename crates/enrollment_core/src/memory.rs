//! crates/enrollment_core/src/memory.rs
//!
//! In-memory implementations of the ports, used by tests and local demos.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Course, Enrollment, Identity, Progress};
use crate::ports::{CatalogStore, EnrollmentLedger, IdentityVerifier, PortError, PortResult};

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

//=========================================================================================
// Catalog
//=========================================================================================

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    courses: Mutex<Vec<Course>>,
    failure: Mutex<Option<String>>,
}

impl InMemoryCatalog {
    pub fn new(courses: Vec<Course>) -> Self {
        Self {
            courses: Mutex::new(courses),
            failure: Mutex::new(None),
        }
    }

    pub fn add(&self, course: Course) {
        locked(&self.courses).push(course);
    }

    /// Makes every subsequent read fail with the given message.
    pub fn fail_reads(&self, message: impl Into<String>) {
        *locked(&self.failure) = Some(message.into());
    }

    fn check(&self) -> PortResult<()> {
        match locked(&self.failure).as_ref() {
            Some(message) => Err(PortError::Unexpected(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn list_courses(&self) -> PortResult<Vec<Course>> {
        self.check()?;
        Ok(locked(&self.courses).clone())
    }

    async fn get_course(&self, course_id: Uuid) -> PortResult<Course> {
        self.check()?;
        locked(&self.courses)
            .iter()
            .find(|c| c.id == course_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Course {} not found", course_id)))
    }

    async fn ping(&self) -> PortResult<()> {
        self.check()
    }
}

//=========================================================================================
// Ledger
//=========================================================================================

#[derive(Debug, Default)]
pub struct InMemoryLedger {
    enrollments: Mutex<Vec<Enrollment>>,
    write_failure: Mutex<Option<String>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with the given message.
    pub fn fail_writes(&self, message: impl Into<String>) {
        *locked(&self.write_failure) = Some(message.into());
    }

    /// Snapshot of all stored enrollments in insertion order.
    pub fn enrollments(&self) -> Vec<Enrollment> {
        locked(&self.enrollments).clone()
    }

    fn check_writable(&self) -> PortResult<()> {
        match locked(&self.write_failure).as_ref() {
            Some(message) => Err(PortError::Unexpected(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl EnrollmentLedger for InMemoryLedger {
    async fn insert_enrollment(&self, enrollment: Enrollment) -> PortResult<()> {
        self.check_writable()?;
        let mut enrollments = locked(&self.enrollments);
        if enrollments
            .iter()
            .any(|e| e.user_id == enrollment.user_id && e.course_id == enrollment.course_id)
        {
            return Err(PortError::Conflict(format!(
                "User {} is already enrolled in course {}",
                enrollment.user_id, enrollment.course_id
            )));
        }
        enrollments.push(enrollment);
        Ok(())
    }

    async fn find_enrollment(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<Option<Enrollment>> {
        Ok(locked(&self.enrollments)
            .iter()
            .find(|e| e.user_id == user_id && e.course_id == course_id)
            .cloned())
    }

    async fn set_progress(&self, enrollment_id: Uuid, progress: Progress) -> PortResult<()> {
        self.check_writable()?;
        let mut enrollments = locked(&self.enrollments);
        let enrollment = enrollments
            .iter_mut()
            .find(|e| e.id == enrollment_id)
            .ok_or_else(|| PortError::NotFound(format!("Enrollment {} not found", enrollment_id)))?;
        enrollment.progress = progress;
        Ok(())
    }

    async fn list_enrollments_for_user(&self, user_id: Uuid) -> PortResult<Vec<Enrollment>> {
        Ok(locked(&self.enrollments)
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }
}

//=========================================================================================
// Identity
//=========================================================================================

/// Verifies bearer tokens against a fixed token table.
#[derive(Debug, Default)]
pub struct StaticIdentityVerifier {
    tokens: HashMap<String, Uuid>,
    failure: Mutex<Option<String>>,
}

impl StaticIdentityVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, user_id: Uuid) -> Self {
        self.tokens.insert(token.into(), user_id);
        self
    }

    /// Makes every subsequent verification fail as if the backing store were down.
    pub fn fail_verification(&self, message: impl Into<String>) {
        *locked(&self.failure) = Some(message.into());
    }
}

#[async_trait]
impl IdentityVerifier for StaticIdentityVerifier {
    async fn verify_bearer(&self, token: &str) -> PortResult<Identity> {
        if let Some(message) = locked(&self.failure).as_ref() {
            return Err(PortError::Unexpected(message.clone()));
        }
        self.tokens
            .get(token)
            .map(|user_id| Identity { user_id: *user_id })
            .ok_or(PortError::Unauthorized)
    }
}
