//! Services behind the HTTP handlers.

pub mod agent;
pub mod auth;
pub mod cookies;
