//! API server configuration.

use thiserror::Error;
use warden_core::auth::password::DEFAULT_HASH_COST;

/// Configuration errors. These are deployment mistakes and abort startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET (or AUTH_SECRET) must be set")]
    MissingSecret,

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Production mode: cookies get the `Secure` flag.
    pub production: bool,
    /// bcrypt cost for new password hashes.
    pub password_hash_cost: u32,
    /// Users allowed to run admin-only operations.
    pub admin_user_ids: Vec<String>,
    /// Allowed CORS origin; `None` allows any.
    pub cors_origin: Option<String>,
}

impl ApiConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable                     | Default              |
    /// |------------------------------|----------------------|
    /// | `BIND_ADDR`                  | `127.0.0.1:3100`     |
    /// | `JWT_SECRET` / `AUTH_SECRET` | required             |
    /// | `APP_ENV`                    | `development`        |
    /// | `PASSWORD_HASH_COST`         | `12`                 |
    /// | `ADMIN_USER_IDS`             | empty                |
    /// | `CORS_ORIGIN`                | any                  |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let jwt_secret = non_empty("JWT_SECRET")
            .or_else(|| non_empty("AUTH_SECRET"))
            .ok_or(ConfigError::MissingSecret)?;

        let password_hash_cost = match non_empty("PASSWORD_HASH_COST") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|cost| (4..=31).contains(cost))
                .ok_or(ConfigError::InvalidValue {
                    name: "PASSWORD_HASH_COST",
                    value: raw,
                })?,
            None => DEFAULT_HASH_COST,
        };

        let admin_user_ids = non_empty("ADMIN_USER_IDS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:3100".into()),
            jwt_secret,
            production: non_empty("APP_ENV")
                .is_some_and(|env| env.eq_ignore_ascii_case("production")),
            password_hash_cost,
            admin_user_ids,
            cors_origin: non_empty("CORS_ORIGIN"),
        })
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admin_user_ids.iter().any(|id| id == user_id)
    }
}
