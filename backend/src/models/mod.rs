//! Database models (SQLx).

pub mod attendance;
pub mod audit_log;
pub mod leave_request;
pub mod resident;
pub mod staff_user;
pub mod transport_request;
