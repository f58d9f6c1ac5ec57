//! # warden_core
//!
//! Core security logic for Warden: credential hashing, JWT and random
//! tokens, agent guardrails, the agent action log and the user-store seam.

pub mod audit;
pub mod auth;
pub mod guardrail;
pub mod models;
pub mod notify;
pub mod users;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
