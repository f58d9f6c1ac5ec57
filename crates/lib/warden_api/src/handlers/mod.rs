//! Request handlers.

pub mod agent;
pub mod auth;
pub mod csrf;
