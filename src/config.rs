use std::time::Duration;

use anyhow::{Context, Result};
use compute::ProrationBase;
use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File};
use moka::future::Cache;
use sea_orm::Database;
use serde::Deserialize;
use tracing::{debug, info};

use crate::schemas::AppState;

/// Runtime settings, layered from defaults, an optional `rentdesk.toml` and
/// `RENTDESK_*` environment variables. CLI flags are applied on top by the
/// caller.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    pub cache_ttl_secs: u64,
    pub cache_capacity: u64,
    pub request_timeout_secs: u64,
    pub late_fee: LateFeeSettings,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LateFeeSettings {
    /// `fixed30` or `calendar_month`
    pub proration: String,
}

impl Settings {
    /// Loads settings from `rentdesk.toml` (if present) and the environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = Self::defaults()?
            .add_source(File::with_name("rentdesk").required(false))
            .add_source(
                Environment::with_prefix("RENTDESK")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize::<Settings>()
            .context("Invalid configuration")?;

        // Fail at startup rather than on the first late payment
        settings.proration()?;
        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        Ok(Config::builder()
            .set_default("database_url", "sqlite://rentdesk.db?mode=rwc")?
            .set_default("bind_address", "0.0.0.0:3000")?
            .set_default("cache_ttl_secs", 300)?
            .set_default("cache_capacity", 1000)?
            .set_default("request_timeout_secs", 30)?
            .set_default("late_fee.proration", "fixed30")?)
    }

    pub fn proration(&self) -> Result<ProrationBase> {
        self.late_fee
            .proration
            .parse::<ProrationBase>()
            .context("Invalid late_fee.proration")
    }

    /// Applies values given on the command line.
    pub fn apply_overrides(&mut self, database_url: Option<String>, bind_address: Option<String>) {
        if let Some(database_url) = database_url {
            self.database_url = database_url;
        }
        if let Some(bind_address) = bind_address {
            self.bind_address = bind_address;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Connects to the database and builds the shared handler state.
pub async fn initialize_app_state(settings: &Settings) -> Result<AppState> {
    info!("Connecting to database: {}", settings.database_url);
    let db = Database::connect(&settings.database_url).await?;

    let cache = Cache::builder()
        .max_capacity(settings.cache_capacity)
        .time_to_live(Duration::from_secs(settings.cache_ttl_secs))
        .build();

    Ok(AppState {
        db,
        cache,
        proration: settings.proration()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_defaults() {
        let settings: Settings = Settings::defaults()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.bind_address, "0.0.0.0:3000");
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert_eq!(settings.proration().unwrap(), ProrationBase::FixedThirtyDays);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let toml = r#"
            bind_address = "127.0.0.1:8080"
            cache_capacity = 10

            [late_fee]
            proration = "calendar_month"
        "#;
        let settings: Settings = Settings::defaults()
            .unwrap()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.bind_address, "127.0.0.1:8080");
        assert_eq!(settings.cache_capacity, 10);
        assert_eq!(settings.cache_ttl_secs, 300);
        assert_eq!(settings.proration().unwrap(), ProrationBase::CalendarMonth);
    }

    #[test]
    fn test_cli_overrides() {
        let mut settings: Settings = Settings::defaults()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        settings.apply_overrides(Some("sqlite::memory:".to_string()), None);
        assert_eq!(settings.database_url, "sqlite::memory:");
        assert_eq!(settings.bind_address, "0.0.0.0:3000");
    }

    #[test]
    fn test_unknown_proration_is_rejected() {
        let toml = "[late_fee]\nproration = \"weekly\"";
        let settings: Settings = Settings::defaults()
            .unwrap()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert!(settings.proration().is_err());
    }
}
