//! Configuration loading and management for the travel allowance engine.
//!
//! This module loads rate schedules from YAML files: schedule metadata plus
//! one or more effective-dated rate tables holding per-jurisdiction rates,
//! tiering and deduction policies, vehicle rates, and overnight rules.
//!
//! # Example
//!
//! ```no_run
//! use travel_allowance_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/at-2025").unwrap();
//! println!("Loaded schedule: {}", config.schedule().name);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    CombinedDeduction, JurisdictionRates, MealDeductions, OvernightRules, RateConfig, RateTable,
    ScheduleMetadata, TieringPolicy, VehicleRates,
};
