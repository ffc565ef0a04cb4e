//! Trip model and related types.
//!
//! This module defines the [`Trip`] record the engine computes allowances
//! for, its component types, and the [`TripBuilder`] that collects form
//! input into a validated trip.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Where a trip goes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Destination {
    /// A trip within the home jurisdiction.
    #[default]
    Domestic,
    /// A cross-border trip to the named country.
    Foreign {
        /// The country as entered (name, alias, or table key).
        country: String,
    },
}

/// A meal that may be provided by the employer or host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Meal {
    /// Breakfast.
    Breakfast,
    /// Lunch.
    Lunch,
    /// Dinner.
    Dinner,
}

impl Meal {
    /// All meals in the order of a travel day.
    pub const ALL: [Meal; 3] = [Meal::Breakfast, Meal::Lunch, Meal::Dinner];

    /// Returns the snake_case name of the meal.
    pub fn as_str(&self) -> &'static str {
        match self {
            Meal::Breakfast => "breakfast",
            Meal::Lunch => "lunch",
            Meal::Dinner => "dinner",
        }
    }
}

/// Which meals were provided free of charge during the trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MealsProvided {
    /// Breakfast was provided.
    pub breakfast: bool,
    /// Lunch was provided.
    pub lunch: bool,
    /// Dinner was provided.
    pub dinner: bool,
}

impl MealsProvided {
    /// Returns true if `meal` was provided.
    pub fn contains(&self, meal: Meal) -> bool {
        match meal {
            Meal::Breakfast => self.breakfast,
            Meal::Lunch => self.lunch,
            Meal::Dinner => self.dinner,
        }
    }

    /// Marks `meal` as provided.
    pub fn insert(&mut self, meal: Meal) {
        match meal {
            Meal::Breakfast => self.breakfast = true,
            Meal::Lunch => self.lunch = true,
            Meal::Dinner => self.dinner = true,
        }
    }

    /// Iterates over the provided meals.
    pub fn iter(&self) -> impl Iterator<Item = Meal> + '_ {
        Meal::ALL.into_iter().filter(|m| self.contains(*m))
    }
}

/// How lodging is reimbursed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OvernightMode {
    /// The jurisdiction's flat nightly rate times the number of nights.
    #[default]
    FlatRate,
    /// The amount on the lodging receipt.
    Receipt {
        /// Total receipt amount for the stay.
        amount: Decimal,
        /// The receipt price bundles breakfast.
        #[serde(default)]
        includes_breakfast: bool,
    },
}

/// Category of an out-of-pocket expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    /// Parking fees.
    Parking,
    /// Road and tunnel tolls.
    Tolls,
    /// Train, bus, or tram fares.
    PublicTransport,
    /// Business hospitality.
    Hospitality,
    /// Anything not covered elsewhere.
    Miscellaneous,
    /// Lodging paid outside the overnight allowance.
    Lodging,
}

impl ExpenseCategory {
    /// Returns the snake_case name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Parking => "parking",
            ExpenseCategory::Tolls => "tolls",
            ExpenseCategory::PublicTransport => "public_transport",
            ExpenseCategory::Hospitality => "hospitality",
            ExpenseCategory::Miscellaneous => "miscellaneous",
            ExpenseCategory::Lodging => "lodging",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An out-of-pocket expense with an optional supporting document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdHocExpense {
    /// The amount spent.
    pub amount: Decimal,
    /// Opaque reference to an attached receipt; never interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
}

/// Descriptive trip data carried through to exports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripDetails {
    /// Name of the person travelling.
    pub traveler: String,
    /// Project the trip is billed to.
    pub project: String,
    /// Place of departure.
    pub origin: String,
    /// Place of destination.
    pub destination_place: String,
    /// Intermediate stops.
    pub stops: Vec<String>,
}

/// One journey requiring reimbursement.
///
/// A trip is immutable once recorded; corrections replace the whole entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    /// Identifier of the trip.
    pub id: String,
    /// Where the trip goes.
    pub destination: Destination,
    /// Departure timestamp.
    pub departure: NaiveDateTime,
    /// Return timestamp as entered; may be earlier than departure on the
    /// same calendar day for trips that run past midnight.
    #[serde(rename = "return")]
    pub return_at: NaiveDateTime,
    /// Meals provided free of charge.
    #[serde(default)]
    pub meals_provided: MealsProvided,
    /// Kilometers driven in a private vehicle.
    #[serde(default)]
    pub distance_km: Decimal,
    /// Passengers carried in the vehicle.
    #[serde(default)]
    pub passenger_count: u32,
    /// Nights away from home.
    #[serde(default)]
    pub nights: u32,
    /// How lodging is reimbursed.
    #[serde(default)]
    pub overnight_mode: OvernightMode,
    /// Out-of-pocket expenses by category.
    #[serde(default)]
    pub expenses: BTreeMap<ExpenseCategory, AdHocExpense>,
    /// Descriptive data.
    #[serde(default)]
    pub details: TripDetails,
}

impl Trip {
    /// Checks that every monetary and distance input is non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NegativeInput`] naming the first negative field.
    pub fn validate(&self) -> EngineResult<()> {
        ensure_non_negative("distance_km", self.distance_km)?;

        if let OvernightMode::Receipt { amount, .. } = &self.overnight_mode {
            ensure_non_negative("overnight_receipt", *amount)?;
        }

        for (category, expense) in &self.expenses {
            ensure_non_negative(&format!("expenses.{}", category), expense.amount)?;
        }

        Ok(())
    }
}

fn ensure_non_negative(field: &str, value: Decimal) -> EngineResult<()> {
    if value < Decimal::ZERO {
        return Err(EngineError::NegativeInput {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

/// A trip under construction.
///
/// Collects raw form input, including values that may be out of range,
/// and turns it into a validated [`Trip`] with [`TripBuilder::build`].
///
/// # Example
///
/// ```
/// use travel_allowance_engine::models::{Destination, Meal, TripBuilder};
/// use chrono::NaiveDateTime;
/// use rust_decimal::Decimal;
///
/// let trip = TripBuilder::new("trip_001")
///     .destination(Destination::Domestic)
///     .departure(NaiveDateTime::parse_from_str("2025-03-10 08:00:00", "%Y-%m-%d %H:%M:%S").unwrap())
///     .return_at(NaiveDateTime::parse_from_str("2025-03-10 17:00:00", "%Y-%m-%d %H:%M:%S").unwrap())
///     .meal(Meal::Lunch)
///     .distance_km(Decimal::new(120, 0))
///     .build()
///     .unwrap();
///
/// assert!(trip.meals_provided.lunch);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TripBuilder {
    id: String,
    destination: Destination,
    departure: Option<NaiveDateTime>,
    return_at: Option<NaiveDateTime>,
    meals_provided: MealsProvided,
    distance_km: Decimal,
    passenger_count: i64,
    nights: i64,
    overnight_mode: OvernightMode,
    expenses: BTreeMap<ExpenseCategory, AdHocExpense>,
    details: TripDetails,
}

impl TripBuilder {
    /// Starts a domestic trip with the given ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Sets the destination.
    pub fn destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Sets the departure timestamp.
    pub fn departure(mut self, departure: NaiveDateTime) -> Self {
        self.departure = Some(departure);
        self
    }

    /// Sets the return timestamp.
    pub fn return_at(mut self, return_at: NaiveDateTime) -> Self {
        self.return_at = Some(return_at);
        self
    }

    /// Marks a meal as provided.
    pub fn meal(mut self, meal: Meal) -> Self {
        self.meals_provided.insert(meal);
        self
    }

    /// Replaces the provided-meal flags.
    pub fn meals(mut self, meals: MealsProvided) -> Self {
        self.meals_provided = meals;
        self
    }

    /// Sets the distance driven.
    pub fn distance_km(mut self, distance_km: Decimal) -> Self {
        self.distance_km = distance_km;
        self
    }

    /// Sets the passenger count as entered.
    pub fn passengers(mut self, passenger_count: i64) -> Self {
        self.passenger_count = passenger_count;
        self
    }

    /// Sets the number of nights as entered.
    pub fn nights(mut self, nights: i64) -> Self {
        self.nights = nights;
        self
    }

    /// Sets the overnight reimbursement mode.
    pub fn overnight(mut self, mode: OvernightMode) -> Self {
        self.overnight_mode = mode;
        self
    }

    /// Records an expense, replacing any earlier entry for the category.
    pub fn expense(
        mut self,
        category: ExpenseCategory,
        amount: Decimal,
        document: Option<String>,
    ) -> Self {
        self.expenses
            .insert(category, AdHocExpense { amount, document });
        self
    }

    /// Sets the descriptive details.
    pub fn details(mut self, details: TripDetails) -> Self {
        self.details = details;
        self
    }

    /// Validates the collected input and produces a trip.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidTrip`] if departure or return is missing
    /// - [`EngineError::NegativeInput`] if a count, distance, or amount is negative
    pub fn build(self) -> EngineResult<Trip> {
        let missing = |what: &str| EngineError::InvalidTrip {
            trip_id: self.id.clone(),
            message: format!("{} is required", what),
        };
        let departure = self.departure.ok_or_else(|| missing("departure"))?;
        let return_at = self.return_at.ok_or_else(|| missing("return"))?;

        let passenger_count =
            non_negative_count(&self.id, "passenger_count", self.passenger_count)?;
        let nights = non_negative_count(&self.id, "nights", self.nights)?;

        let trip = Trip {
            id: self.id,
            destination: self.destination,
            departure,
            return_at,
            meals_provided: self.meals_provided,
            distance_km: self.distance_km,
            passenger_count,
            nights,
            overnight_mode: self.overnight_mode,
            expenses: self.expenses,
            details: self.details,
        };
        trip.validate()?;

        Ok(trip)
    }
}

fn non_negative_count(trip_id: &str, field: &str, value: i64) -> EngineResult<u32> {
    if value < 0 {
        return Err(EngineError::NegativeInput {
            field: field.to_string(),
            value: Decimal::from(value),
        });
    }
    u32::try_from(value).map_err(|_| EngineError::InvalidTrip {
        trip_id: trip_id.to_string(),
        message: format!("{} {} is out of range", field, value),
    })
}
