//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use enrollment_core::{EnrollmentService, IdentityVerifier};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: EnrollmentService,
    pub verifier: Arc<dyn IdentityVerifier>,
}
