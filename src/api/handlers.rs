//! HTTP request handlers for the travel allowance API.
//!
//! This module contains the handler functions for all API endpoints. Each
//! request is self-contained: period endpoints build a fresh [`Period`]
//! from the submitted trips.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{calculate_trip, submit_trip, summarize_period};
use crate::config::ConfigLoader;
use crate::error::{EngineError, EngineResult};
use crate::models::{Period, PeriodSummary, ReportingWindow, Trip, TripResult};

use super::request::{PeriodRequest, RatesQuery, TripRequest};
use super::response::{ApiError, ApiErrorResponse, RatesResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/trips/calculate", post(calculate_trip_handler))
        .route("/periods/summary", post(period_summary_handler))
        .route("/periods/export", post(period_export_handler))
        .route("/rates", get(rates_handler))
        .with_state(state)
}

/// Handler for POST /trips/calculate.
///
/// Accepts one trip and returns its calculated reimbursement.
async fn calculate_trip_handler(
    State(state): State<AppState>,
    payload: Result<Json<TripRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing trip calculation request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };

    let start_time = Instant::now();
    match calculate_single(state.config(), request) {
        Ok(result) => {
            info!(
                correlation_id = %correlation_id,
                trip_id = %result.trip_id,
                jurisdiction = %result.jurisdiction,
                fallback = result.jurisdiction_fallback,
                total = %result.total,
                duration_us = start_time.elapsed().as_micros(),
                "Trip calculated successfully"
            );
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                Json(result),
            )
                .into_response()
        }
        Err(err) => engine_error_response(correlation_id, err),
    }
}

/// Handler for POST /periods/summary.
///
/// Calculates every submitted trip and totals those inside the window.
async fn period_summary_handler(
    State(state): State<AppState>,
    payload: Result<Json<PeriodRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing period summary request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };

    match summarize_request(state.config(), request) {
        Ok(summary) => {
            info!(
                correlation_id = %correlation_id,
                trips = summary.trip_count,
                fallbacks = summary.fallback_count,
                period_total = %summary.period_total,
                "Period summarized successfully"
            );
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                Json(summary),
            )
                .into_response()
        }
        Err(err) => engine_error_response(correlation_id, err),
    }
}

/// Handler for POST /periods/export.
///
/// Same input as the summary endpoint; responds with the export rows as CSV.
async fn period_export_handler(
    State(state): State<AppState>,
    payload: Result<Json<PeriodRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing period export request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };

    let exported = summarize_request(state.config(), request)
        .and_then(|summary| summary.to_csv().map(|csv| (summary, csv)));

    match exported {
        Ok((summary, csv)) => {
            info!(
                correlation_id = %correlation_id,
                rows = summary.rows.len(),
                "Period exported successfully"
            );
            let filename = format!(
                "attachment; filename=\"travel-allowances-{}-{}.csv\"",
                summary.window.start, summary.window.end
            );
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, filename),
                ],
                csv,
            )
                .into_response()
        }
        Err(err) => engine_error_response(correlation_id, err),
    }
}

/// Handler for GET /rates?date=YYYY-MM-DD.
///
/// Returns the rate table effective on the given date.
async fn rates_handler(
    State(state): State<AppState>,
    query: Result<Query<RatesQuery>, QueryRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();

    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => {
            warn!(
                correlation_id = %correlation_id,
                error = %rejection.body_text(),
                "Invalid rates query"
            );
            return (
                StatusCode::BAD_REQUEST,
                [(header::CONTENT_TYPE, "application/json")],
                Json(ApiError::validation_error(rejection.body_text())),
            )
                .into_response();
        }
    };

    let config = state.config();
    match config.rate_table_for(query.date) {
        Ok(table) => {
            info!(
                correlation_id = %correlation_id,
                date = %query.date,
                effective_date = %table.effective_date(),
                "Rate table served"
            );
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                Json(RatesResponse {
                    schedule: config.schedule(),
                    rate_table: table,
                }),
            )
                .into_response()
        }
        Err(err) => engine_error_response(correlation_id, err),
    }
}

fn calculate_single(config: &ConfigLoader, request: TripRequest) -> EngineResult<TripResult> {
    let trip = Trip::try_from(request)?;
    let table = config.rate_table_for(trip.departure.date())?;
    calculate_trip(&trip, table)
}

/// Builds a period from the submitted trips, each priced with the table
/// effective on its departure date, and totals the requested window.
fn summarize_request(config: &ConfigLoader, request: PeriodRequest) -> EngineResult<PeriodSummary> {
    let window = ReportingWindow::try_from(request.window)?;

    let mut period = Period::new();
    for trip_request in request.trips {
        let trip = Trip::try_from(trip_request)?;
        let table = config.rate_table_for(trip.departure.date())?;
        submit_trip(&mut period, trip, table)?;
    }

    summarize_period(&period, &window)
}

fn engine_error_response(correlation_id: Uuid, err: EngineError) -> Response {
    warn!(
        correlation_id = %correlation_id,
        error = %err,
        "Request rejected"
    );
    let api_error: ApiErrorResponse = err.into();
    (
        api_error.status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(api_error.error),
    )
        .into_response()
}

fn json_rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    (
        StatusCode::BAD_REQUEST,
        [(header::CONTENT_TYPE, "application/json")],
        Json(error),
    )
        .into_response()
}
