//! Configuration loading.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `CAREDESK__*` environment variables (`CAREDESK__DASHBOARD__RECENT_BOOKINGS=10`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, Utc};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Which calendar decides what "today" means for appointment listings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CalendarBasis {
    /// UTC date at call time
    #[default]
    Utc,
    /// Host-local date at call time
    Local,
}

impl CalendarBasis {
    /// Today's date, evaluated now.
    pub fn today(self) -> NaiveDate {
        match self {
            CalendarBasis::Utc => Utc::now().date_naive(),
            CalendarBasis::Local => Local::now().date_naive(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file. In-memory when unset.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    /// How many of the newest bookings the dashboard shows
    pub recent_bookings: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self { recent_bookings: 5 }
    }
}

/// Top-level CareDesk settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CareDeskConfig {
    pub database: DatabaseConfig,
    pub dashboard: DashboardConfig,
    pub calendar: CalendarBasis,
    /// `tracing` filter directive (e.g., "info", "caredesk_core=debug")
    pub log_filter: String,
}

impl Default for CareDeskConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            dashboard: DashboardConfig::default(),
            calendar: CalendarBasis::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl CareDeskConfig {
    /// Load settings from an optional file plus the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("CAREDESK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?;

        let config: CareDeskConfig = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        tracing::info!(
            file = ?path,
            calendar = ?config.calendar,
            "configuration loaded"
        );
        Ok(config)
    }
}
