use crate::{errors, models::CleanupTarget, utils::regex_utils};
use config::{ConfigError, Environment};
use serde::Deserialize;
use std::time::Duration;
use validator::{Validate, ValidationErrors};

#[derive(Debug, Deserialize, Clone, PartialEq, Validate)]
pub struct Config {
    pub log_level: String,
    pub address: String,

    #[validate(url)]
    pub identity_url: String,
    #[validate(length(min = 1, message = "identity_anon_key must not be empty"))]
    pub identity_anon_key: String,
    #[validate(length(min = 1, message = "identity_service_key must not be empty"))]
    pub identity_service_key: String,
    #[validate(range(min = 1, message = "identity_timeout_secs must be at least 1"))]
    pub identity_timeout_secs: u64,

    pub database_url: String,

    pub s3_url: String,
    pub s3_region: String,
    pub s3_access_key: String,
    pub s3_secret_key: String,

    pub storage_buckets: String,
    pub owned_tables: String,
    pub owner_column: String,
    #[validate(range(min = 1, max = 64, message = "cleanup_concurrency must be between 1 and 64"))]
    pub cleanup_concurrency: usize,
    #[validate(range(min = 1, message = "cleanup_step_timeout_secs must be at least 1"))]
    pub cleanup_step_timeout_secs: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_builder(config::Config::builder())
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let s = Self::with_defaults(builder)?
            .add_source(Environment::with_prefix("PURGE"))
            .build()?;

        let config: Self = s.try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("log_level", "info")?
            .set_default("address", "0.0.0.0:7687")?
            .set_default("identity_timeout_secs", 30)?
            .set_default("s3_region", "us-east-1")?
            .set_default("s3_access_key", "none")?
            .set_default("s3_secret_key", "none")?
            .set_default("storage_buckets", "avatars,trade-screenshots")?
            .set_default("owned_tables", "trades,custom_currency_pairs,profiles")?
            .set_default("owner_column", "user_id")?
            .set_default("cleanup_concurrency", 4)
    }

    /// Field validation plus the cleanup target lists, which must parse.
    fn check(&self) -> Result<(), ConfigError> {
        self.validate()
            .map_err(|e| ConfigError::Message(errors::format_validation_errors(&e)))?;
        self.cleanup_targets()
            .map_err(|e| ConfigError::Message(errors::format_validation_errors(&e)))?;
        if !regex_utils::SQL_IDENTIFIER_REGEX.is_match(&self.owner_column) {
            return Err(ConfigError::Message(format!(
                "'{}' is not a valid owner column",
                self.owner_column
            )));
        }
        Ok(())
    }

    /// Buckets first, then tables, each in the order they are listed.
    pub fn cleanup_targets(&self) -> Result<Vec<CleanupTarget>, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut targets = Vec::new();

        for bucket in split_list(&self.storage_buckets) {
            match CleanupTarget::storage(bucket) {
                Ok(target) => targets.push(target),
                Err(e) => errors.add("storage_buckets", e),
            }
        }
        for table in split_list(&self.owned_tables) {
            match CleanupTarget::table(table) {
                Ok(target) => targets.push(target),
                Err(e) => errors.add("owned_tables", e),
            }
        }

        if errors.is_empty() {
            Ok(targets)
        } else {
            Err(errors)
        }
    }

    pub fn identity_timeout(&self) -> Duration {
        Duration::from_secs(self.identity_timeout_secs)
    }

    pub fn cleanup_step_timeout(&self) -> Option<Duration> {
        self.cleanup_step_timeout_secs.map(Duration::from_secs)
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
