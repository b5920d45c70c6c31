pub mod domain;
pub mod memory;
pub mod ports;
pub mod service;

pub use domain::{
    Course, Enrollment, EnrollmentReceipt, Identity, Progress, RequestContext, ValidationError,
};
pub use ports::{CatalogStore, EnrollmentLedger, IdentityVerifier, PortError, PortResult};
pub use service::{EnrollmentService, ServiceError, ServiceResult};
