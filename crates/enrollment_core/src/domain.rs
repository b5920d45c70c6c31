//! crates/enrollment_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Raised when a store record does not satisfy the domain invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("course title must not be empty")]
    EmptyTitle,
    #[error("course video url must not be empty")]
    EmptyVideoUrl,
}

/// A catalog entry describing one learning unit and its video locator.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub video_url: String,
    pub created_at: DateTime<Utc>,
}

impl Course {
    /// Builds a course, rejecting blank titles and video locators.
    pub fn new(
        id: Uuid,
        title: impl Into<String>,
        description: Option<String>,
        video_url: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        let video_url = video_url.into();
        if title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if video_url.trim().is_empty() {
            return Err(ValidationError::EmptyVideoUrl);
        }
        Ok(Self {
            id,
            title,
            description,
            video_url,
            created_at,
        })
    }
}

/// Playback progress as a percentage, always within `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Progress(f64);

impl Progress {
    pub const ZERO: Progress = Progress(0.0);
    pub const COMPLETE: Progress = Progress(100.0);

    /// Clamps a percentage into range. Returns `None` for NaN and infinities.
    pub fn from_percent(percent: f64) -> Option<Self> {
        if !percent.is_finite() {
            return None;
        }
        Some(Self(percent.clamp(0.0, 100.0)))
    }

    /// Converts the fraction of the video played (0.0..=1.0) into a percentage.
    /// Any finite fraction is accepted; a product that overflows clamps by sign.
    pub fn from_played_fraction(fraction: f64) -> Option<Self> {
        if !fraction.is_finite() {
            return None;
        }
        Some(Self((fraction * 100.0).clamp(0.0, 100.0)))
    }

    pub fn percent(self) -> f64 {
        self.0
    }
}

/// A record linking one user to one course with a progress value.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrollment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub progress: Progress,
    pub created_at: DateTime<Utc>,
}

impl Enrollment {
    /// A fresh enrollment starts with zero progress.
    pub fn start(user_id: Uuid, course_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            course_id,
            progress: Progress::ZERO,
            created_at: now,
        }
    }
}

/// A verified reference to an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity {
    pub user_id: Uuid,
}

/// Per-call credential carrier. The identity is `None` when the caller
/// supplied no credential or the verifier rejected it.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub identity: Option<Identity>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self { identity: None }
    }

    pub fn authenticated(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }
}

/// Confirmation returned after a successful enrollment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentReceipt {
    pub course_id: Uuid,
    pub enrolled_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_rejects_blank_title_and_video() {
        let now = Utc::now();
        assert_eq!(
            Course::new(Uuid::new_v4(), "  ", None, "http://x/v1", now),
            Err(ValidationError::EmptyTitle)
        );
        assert_eq!(
            Course::new(Uuid::new_v4(), "Intro", None, "", now),
            Err(ValidationError::EmptyVideoUrl)
        );
        assert!(Course::new(Uuid::new_v4(), "Intro", None, "http://x/v1", now).is_ok());
    }

    #[test]
    fn progress_is_clamped_to_percentage_range() {
        assert_eq!(Progress::from_played_fraction(0.25).map(Progress::percent), Some(25.0));
        assert_eq!(Progress::from_played_fraction(1.7), Some(Progress::COMPLETE));
        assert_eq!(Progress::from_played_fraction(-0.2), Some(Progress::ZERO));
        assert_eq!(Progress::from_played_fraction(f64::NAN), None);
        assert_eq!(Progress::from_percent(f64::INFINITY), None);
    }

    #[test]
    fn huge_finite_fractions_clamp_instead_of_overflowing() {
        assert_eq!(Progress::from_played_fraction(1e307), Some(Progress::COMPLETE));
        assert_eq!(Progress::from_played_fraction(-1e307), Some(Progress::ZERO));
        assert_eq!(Progress::from_played_fraction(f64::MAX), Some(Progress::COMPLETE));
        assert_eq!(Progress::from_played_fraction(f64::NEG_INFINITY), None);
    }

    #[test]
    fn new_enrollment_has_zero_progress() {
        let user = Uuid::new_v4();
        let course = Uuid::new_v4();
        let enrollment = Enrollment::start(user, course, Utc::now());
        assert_eq!(enrollment.progress, Progress::ZERO);
        assert_eq!(enrollment.user_id, user);
        assert_eq!(enrollment.course_id, course);
    }
}
