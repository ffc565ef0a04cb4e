//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading rate
//! schedules from YAML files.

use chrono::NaiveDate;
use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

use super::types::{RateConfig, RateTable, ScheduleMetadata};

/// Loads and provides access to a rate schedule.
///
/// The `ConfigLoader` reads YAML configuration files from a directory,
/// validates every rate file into a [`RateTable`], and selects the table
/// effective on a given date.
///
/// # Directory Structure
///
/// ```text
/// config/at-2025/
/// ├── schedule.yaml        # Schedule metadata
/// └── rates/
///     └── 2025-01-01.yaml  # Rate table effective from this date
/// ```
///
/// # Example
///
/// ```no_run
/// use travel_allowance_engine::config::ConfigLoader;
/// use chrono::NaiveDate;
///
/// let loader = ConfigLoader::load("./config/at-2025").unwrap();
/// let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
/// let table = loader.rate_table_for(date).unwrap();
/// println!("Domestic full day: {}", table.domestic().full_day_rate);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    schedule: ScheduleMetadata,
    /// Sorted oldest first.
    tables: Vec<RateTable>,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration directory (e.g., "./config/at-2025")
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - `schedule.yaml` or the `rates` directory is missing
    /// - Any file contains invalid YAML
    /// - Any rate table fails validation
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let schedule = Self::load_yaml::<ScheduleMetadata>(&path.join("schedule.yaml"))?;
        let tables = Self::load_rates(&path.join("rates"))?;

        Ok(Self::new(schedule, tables))
    }

    /// Creates a loader from already-validated tables.
    pub fn new(schedule: ScheduleMetadata, tables: Vec<RateTable>) -> Self {
        let mut tables = tables;
        tables.sort_by_key(|t| t.effective_date());
        Self { schedule, tables }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads and validates all rate files from the rates directory.
    fn load_rates(rates_dir: &Path) -> EngineResult<Vec<RateTable>> {
        let rates_dir_str = rates_dir.display().to_string();

        let entries = fs::read_dir(rates_dir).map_err(|_| EngineError::ConfigNotFound {
            path: rates_dir_str.clone(),
        })?;

        let mut tables = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: rates_dir_str.clone(),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                let rate_config = Self::load_yaml::<RateConfig>(&path)?;
                tables.push(RateTable::from_config(rate_config)?);
            }
        }

        if tables.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no rate files found)", rates_dir_str),
            });
        }

        Ok(tables)
    }

    /// Returns the schedule metadata.
    pub fn schedule(&self) -> &ScheduleMetadata {
        &self.schedule
    }

    /// Returns all rate tables, oldest first.
    pub fn tables(&self) -> &[RateTable] {
        &self.tables
    }

    /// Gets the rate table effective on a given date.
    ///
    /// Finds the most recent table whose effective date is on or before
    /// `date`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::RateTableNotFound`] when every table takes
    /// effect after `date`.
    pub fn rate_table_for(&self, date: NaiveDate) -> EngineResult<&RateTable> {
        self.tables
            .iter()
            .rfind(|t| t.effective_date() <= date)
            .ok_or(EngineError::RateTableNotFound { date })
    }
}
