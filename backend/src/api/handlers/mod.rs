pub mod admin;
pub mod attendance;
pub mod auth;
pub mod health;
pub mod leave;
pub mod resident_portal;
pub mod residents;
pub mod transport;
