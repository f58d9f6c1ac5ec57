//! Domain models shared across Warden crates.

pub mod agent;
pub mod auth;
