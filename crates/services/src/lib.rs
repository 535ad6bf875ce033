#![forbid(unsafe_code)]

pub mod app_services;
pub mod enrollment_service;
pub mod error;
pub mod progress_service;
pub mod snapshot;

pub use lms_core::Clock;

pub use app_services::CourseServices;
pub use enrollment_service::EnrollmentService;
pub use error::{EnrollmentError, ProgressError};
pub use progress_service::ProgressService;
pub use snapshot::StudentProgressService;
