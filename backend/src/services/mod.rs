//! Business logic services.

pub mod attendance_service;
pub mod audit_service;
pub mod auth_service;
pub mod leave_service;
pub mod metrics_service;
pub mod resident_service;
pub mod scheduler_service;
pub mod staff_user_service;
pub mod transport_service;
