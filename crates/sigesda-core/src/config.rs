//! Configuration module
//!
//! Client configuration for the reservation core: where the SIGESDA backend
//! lives, how to authenticate against it, and the reservation policy knobs.
//! Values come from the environment (a `.env` file is honoured).

use std::env;

use crate::models::Role;
use crate::policy::{parse_role_list, CreationPolicy};
use crate::validation::{ReservationRules, DEFAULT_MAX_DURATION_HOURS};

// Common constants
const API_URL: &str = "http://localhost:3000";
const API_VERSION: &str = "v1";
const HTTP_TIMEOUT_SECS: u64 = 30;

/// Reservation policy settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReservationConfig {
    pub creation_policy: CreationPolicy,
    pub max_duration_hours: i64,
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            creation_policy: CreationPolicy::default(),
            max_duration_hours: DEFAULT_MAX_DURATION_HOURS,
        }
    }
}

impl ReservationConfig {
    pub fn rules(&self) -> ReservationRules {
        ReservationRules::with_max_duration_hours(self.max_duration_hours)
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub api_url: String,
    pub api_token: Option<String>,
    pub api_version: String,
    pub http_timeout_secs: u64,
    pub reservation: ReservationConfig,
}

impl Config {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let auto_confirm_roles: Vec<Role> = match lookup("RESERVATION_AUTO_CONFIRM_ROLES") {
            Some(value) => parse_role_list(&value).map_err(|e| {
                anyhow::anyhow!("RESERVATION_AUTO_CONFIRM_ROLES is invalid: {}", e)
            })?,
            None => Vec::new(),
        };

        let config = Config {
            environment,
            api_url: lookup("SIGESDA_API_URL")
                .or_else(|| lookup("API_URL"))
                .unwrap_or_else(|| API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_token: lookup("SIGESDA_API_TOKEN").filter(|s| !s.is_empty()),
            api_version: lookup("SIGESDA_API_VERSION").unwrap_or_else(|| API_VERSION.to_string()),
            http_timeout_secs: match lookup("SIGESDA_HTTP_TIMEOUT_SECS") {
                Some(v) => v
                    .parse()
                    .map_err(|_| anyhow::anyhow!("SIGESDA_HTTP_TIMEOUT_SECS must be a valid number"))?,
                None => HTTP_TIMEOUT_SECS,
            },
            reservation: ReservationConfig {
                creation_policy: CreationPolicy::new(auto_confirm_roles),
                max_duration_hours: lookup("RESERVATION_MAX_DURATION_HOURS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_MAX_DURATION_HOURS),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "SIGESDA_API_URL must be an http:// or https:// URL"
            ));
        }

        if self.is_production() {
            if !self.api_url.starts_with("https://") {
                return Err(anyhow::anyhow!("SIGESDA_API_URL must use https in production"));
            }
            if self.api_token.is_none() {
                return Err(anyhow::anyhow!(
                    "SIGESDA_API_TOKEN must be set in production"
                ));
            }
        }

        if self.http_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "SIGESDA_HTTP_TIMEOUT_SECS must be greater than zero"
            ));
        }

        if self.reservation.max_duration_hours <= 0 {
            return Err(anyhow::anyhow!(
                "RESERVATION_MAX_DURATION_HOURS must be greater than zero"
            ));
        }
        if ReservationRules::try_with_max_duration_hours(self.reservation.max_duration_hours)
            .is_none()
        {
            return Err(anyhow::anyhow!(
                "RESERVATION_MAX_DURATION_HOURS is out of range"
            ));
        }

        Ok(())
    }

    /// API version prefix, e.g. "/api/v1"
    pub fn api_prefix(&self) -> String {
        format!("/api/{}", self.api_version)
    }
}
