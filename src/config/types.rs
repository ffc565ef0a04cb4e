//! Configuration types for travel allowance rate tables.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files, and the validated
//! [`RateTable`] the calculators consume.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Metadata about the rate schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleMetadata {
    /// Short identifier of the schedule (e.g., "AT-RK").
    pub code: String,
    /// The human-readable name of the schedule.
    pub name: String,
    /// The version or statutory year of the schedule.
    pub version: String,
    /// URL to the official rate documentation.
    pub source_url: String,
    /// ISO currency code all amounts are denominated in.
    pub currency: String,
}

/// How trip duration is turned into a count of full and partial days.
///
/// Selected per jurisdiction; the calculators never branch on the
/// jurisdiction itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TieringPolicy {
    /// Whole 24h blocks earn the full-day rate; the remainder earns the
    /// partial-day rate when it reaches `minimum_hours`.
    DayBucket {
        /// Shortest duration (or remainder) that earns a partial day.
        minimum_hours: Decimal,
        /// Length of a full day block.
        full_day_hours: Decimal,
    },
    /// Calendar-day apportionment: one or two travel days earn partial
    /// rates, every day between the first and last earns the full rate.
    MultiDay {
        /// Trips shorter than this earn nothing.
        minimum_hours: Decimal,
    },
    /// Whole 24h blocks earn the full-day rate; the remainder accrues
    /// `hourly_rate` per started hour once it exceeds `minimum_hours`,
    /// capped at the full-day rate.
    HourlyAccrual {
        /// Remainder hours that must be exceeded before accrual starts.
        minimum_hours: Decimal,
    },
}

/// Rule replacing per-meal deductions when several meals are provided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedDeduction {
    /// Number of deductible meals that triggers the combined rule.
    pub minimum_meals: u8,
    /// Share of the gross allowance that remains once triggered.
    pub retained_fraction: Decimal,
}

/// Deductions for employer-provided meals.
///
/// Fractions are applied to the jurisdiction's full-day rate, never to an
/// already-reduced allowance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealDeductions {
    /// Fraction of the full-day rate deducted for breakfast.
    pub breakfast: Decimal,
    /// Fraction of the full-day rate deducted for lunch.
    pub lunch: Decimal,
    /// Fraction of the full-day rate deducted for dinner.
    pub dinner: Decimal,
    /// When set, a provided breakfast neither deducts nor counts toward
    /// the combined rule.
    #[serde(default)]
    pub breakfast_exempt: bool,
    /// Optional combined-meal rule.
    #[serde(default)]
    pub combined: Option<CombinedDeduction>,
}

/// Rates and policies for one jurisdiction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JurisdictionRates {
    /// Display name of the jurisdiction (e.g., "Deutschland").
    pub name: String,
    /// Alternative names a destination may be entered under.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Allowance for a complete travel day.
    pub full_day_rate: Decimal,
    /// Allowance for a travel day not covering a full day.
    pub partial_day_rate: Decimal,
    /// Rate per started hour, used by hourly accrual tiering.
    #[serde(default)]
    pub hourly_rate: Option<Decimal>,
    /// Flat allowance per night.
    pub overnight_rate: Decimal,
    /// Duration tiering policy.
    pub tiering: TieringPolicy,
    /// Provided-meal deduction policy.
    pub deductions: MealDeductions,
}

impl JurisdictionRates {
    /// Returns true if `candidate` names this jurisdiction, ignoring case
    /// and surrounding whitespace.
    pub fn matches_name(&self, candidate: &str) -> bool {
        let candidate = candidate.trim().to_lowercase();
        self.name.to_lowercase() == candidate
            || self.aliases.iter().any(|a| a.to_lowercase() == candidate)
    }
}

/// Vehicle reimbursement rates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleRates {
    /// Base reimbursement per kilometer.
    pub rate_per_km: Decimal,
    /// Surcharge per kilometer for each eligible passenger.
    pub passenger_surcharge_per_km: Decimal,
    /// Passengers beyond this count earn no surcharge.
    pub max_surcharge_passengers: u32,
}

/// Rules for receipt-based overnight reimbursement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvernightRules {
    /// Amount removed per night from a receipt that bundles breakfast when
    /// breakfast was also marked as provided.
    pub breakfast_offset: Decimal,
}

/// A rate file as it appears on disk (`rates/<effective_date>.yaml`).
#[derive(Debug, Clone, Deserialize)]
pub struct RateConfig {
    /// The effective date for these rates.
    pub effective_date: NaiveDate,
    /// Key of the domestic jurisdiction.
    pub domestic: String,
    /// Key of the jurisdiction unknown destinations fall back to.
    pub fallback: String,
    /// Map of jurisdiction key to rates.
    pub jurisdictions: BTreeMap<String, JurisdictionRates>,
    /// Vehicle reimbursement rates.
    pub vehicle: VehicleRates,
    /// Receipt-based overnight rules.
    pub overnight: OvernightRules,
}

/// A validated, immutable rate table.
///
/// Construction through [`RateTable::from_config`] guarantees that the
/// domestic and fallback jurisdictions exist, so every jurisdiction lookup
/// resolves to a concrete entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateTable {
    effective_date: NaiveDate,
    domestic: String,
    fallback: String,
    jurisdictions: BTreeMap<String, JurisdictionRates>,
    vehicle: VehicleRates,
    overnight: OvernightRules,
}

impl RateTable {
    /// Validates a parsed rate file into a rate table.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRateTable`] when the domestic or
    /// fallback jurisdiction is missing, any rate is negative, a fraction
    /// lies outside `[0, 1]`, a full-day rate is below its partial-day rate,
    /// tiering thresholds are inconsistent, or hourly accrual lacks an
    /// `hourly_rate`.
    pub fn from_config(config: RateConfig) -> EngineResult<Self> {
        let effective_date = config.effective_date;
        let invalid = |message: String| EngineError::InvalidRateTable {
            effective_date,
            message,
        };

        if !config.jurisdictions.contains_key(&config.domestic) {
            return Err(invalid(format!(
                "domestic jurisdiction '{}' is missing",
                config.domestic
            )));
        }
        if !config.jurisdictions.contains_key(&config.fallback) {
            return Err(invalid(format!(
                "fallback jurisdiction '{}' is missing",
                config.fallback
            )));
        }

        for (key, rates) in &config.jurisdictions {
            validate_jurisdiction(key, rates).map_err(invalid)?;
        }

        let vehicle = &config.vehicle;
        if vehicle.rate_per_km < Decimal::ZERO || vehicle.passenger_surcharge_per_km < Decimal::ZERO
        {
            return Err(invalid("vehicle rates must not be negative".to_string()));
        }
        if config.overnight.breakfast_offset < Decimal::ZERO {
            return Err(invalid(
                "overnight breakfast offset must not be negative".to_string(),
            ));
        }

        Ok(Self {
            effective_date,
            domestic: config.domestic,
            fallback: config.fallback,
            jurisdictions: config.jurisdictions,
            vehicle: config.vehicle,
            overnight: config.overnight,
        })
    }

    /// Returns the date from which this table applies.
    pub fn effective_date(&self) -> NaiveDate {
        self.effective_date
    }

    /// Returns the key of the domestic jurisdiction.
    pub fn domestic_key(&self) -> &str {
        &self.domestic
    }

    /// Returns the key of the fallback jurisdiction.
    pub fn fallback_key(&self) -> &str {
        &self.fallback
    }

    /// Returns the domestic jurisdiction's rates.
    pub fn domestic(&self) -> &JurisdictionRates {
        &self.jurisdictions[&self.domestic]
    }

    /// Returns the fallback jurisdiction's rates.
    pub fn fallback(&self) -> &JurisdictionRates {
        &self.jurisdictions[&self.fallback]
    }

    /// Looks up a jurisdiction by key.
    pub fn get(&self, key: &str) -> Option<&JurisdictionRates> {
        self.jurisdictions.get(key)
    }

    /// Returns all jurisdictions, ordered by key.
    pub fn jurisdictions(&self) -> &BTreeMap<String, JurisdictionRates> {
        &self.jurisdictions
    }

    /// Returns the vehicle reimbursement rates.
    pub fn vehicle(&self) -> &VehicleRates {
        &self.vehicle
    }

    /// Returns the receipt-based overnight rules.
    pub fn overnight(&self) -> &OvernightRules {
        &self.overnight
    }
}

fn validate_jurisdiction(key: &str, rates: &JurisdictionRates) -> Result<(), String> {
    let unit = Decimal::ONE;
    let amounts = [
        ("full_day_rate", Some(rates.full_day_rate)),
        ("partial_day_rate", Some(rates.partial_day_rate)),
        ("hourly_rate", rates.hourly_rate),
        ("overnight_rate", Some(rates.overnight_rate)),
    ];
    for (field, value) in amounts {
        if value.is_some_and(|v| v < Decimal::ZERO) {
            return Err(format!("{key}: {field} must not be negative"));
        }
    }

    if rates.full_day_rate < rates.partial_day_rate {
        return Err(format!(
            "{key}: full_day_rate {} is below partial_day_rate {}",
            rates.full_day_rate, rates.partial_day_rate
        ));
    }

    let deductions = &rates.deductions;
    for (meal, fraction) in [
        ("breakfast", deductions.breakfast),
        ("lunch", deductions.lunch),
        ("dinner", deductions.dinner),
    ] {
        if fraction < Decimal::ZERO || fraction > unit {
            return Err(format!("{key}: {meal} deduction {fraction} is outside [0, 1]"));
        }
    }
    if let Some(combined) = &deductions.combined {
        if combined.minimum_meals < 2 {
            return Err(format!(
                "{key}: combined deduction needs at least 2 meals, got {}",
                combined.minimum_meals
            ));
        }
        if combined.retained_fraction < Decimal::ZERO || combined.retained_fraction > unit {
            return Err(format!(
                "{key}: retained fraction {} is outside [0, 1]",
                combined.retained_fraction
            ));
        }
    }

    match &rates.tiering {
        TieringPolicy::DayBucket {
            minimum_hours,
            full_day_hours,
        } => {
            if *minimum_hours < Decimal::ZERO || minimum_hours >= full_day_hours {
                return Err(format!(
                    "{key}: day bucket needs 0 <= minimum_hours < full_day_hours"
                ));
            }
        }
        TieringPolicy::MultiDay { minimum_hours } => {
            if *minimum_hours < Decimal::ZERO {
                return Err(format!("{key}: minimum_hours must not be negative"));
            }
        }
        TieringPolicy::HourlyAccrual { minimum_hours } => {
            if *minimum_hours < Decimal::ZERO {
                return Err(format!("{key}: minimum_hours must not be negative"));
            }
            if rates.hourly_rate.is_none() {
                return Err(format!("{key}: hourly accrual requires hourly_rate"));
            }
        }
    }

    Ok(())
}
