//! HTTP API module for the travel allowance engine.
//!
//! A thin axum adapter over the calculators: trip calculation, period
//! summaries and CSV export, and rate table inspection.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{ExpenseRequest, PeriodRequest, RatesQuery, TripRequest, WindowRequest};
pub use response::{ApiError, RatesResponse};
pub use state::AppState;
