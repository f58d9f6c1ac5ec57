//! OTP delivery seam.
//!
//! Sending e-mail is an external concern; [`LogNotifier`] only records that a
//! code went out.

use async_trait::async_trait;
use tracing::info;

use crate::auth::AuthError;

/// Delivers one-time passwords to users.
#[async_trait]
pub trait OtpNotifier: Send + Sync {
    async fn send_otp(&self, email: &str, otp: &str) -> Result<(), AuthError>;
}

/// Notifier that logs the delivery without the code itself.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl OtpNotifier for LogNotifier {
    async fn send_otp(&self, email: &str, otp: &str) -> Result<(), AuthError> {
        info!(email, digits = otp.len(), "password reset code issued");
        Ok(())
    }
}
