//! Shelter operations backend: resident leave and transportation requests,
//! staff review queues, attendance, and the admin audit trail.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod telemetry;
