//! Response types for the travel allowance API.
//!
//! This module defines the error response structures and the mapping from
//! engine errors to HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::config::{RateTable, ScheduleMetadata};
use crate::error::EngineError;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// Response body for `/rates`.
#[derive(Debug, Serialize)]
pub struct RatesResponse<'a> {
    /// Metadata of the loaded schedule.
    pub schedule: &'a ScheduleMetadata,
    /// The table effective on the requested date.
    pub rate_table: &'a RateTable,
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }

    fn config_error(message: impl Into<String>, details: String) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: ApiError::with_details("CONFIG_ERROR", message, details),
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        match error {
            EngineError::ConfigNotFound { .. } => {
                Self::config_error("Configuration error", message)
            }
            EngineError::ConfigParseError { .. } => {
                Self::config_error("Configuration parse error", message)
            }
            EngineError::InvalidRateTable { .. } => {
                Self::config_error("Invalid rate table", message)
            }
            EngineError::RateTableNotFound { date } => Self::bad_request(ApiError::with_details(
                "RATE_TABLE_NOT_FOUND",
                message,
                format!("No configured rate table covers trips departing on {}", date),
            )),
            EngineError::InvalidRange { .. } => Self::bad_request(ApiError::with_details(
                "INVALID_RANGE",
                message,
                "The return must not precede the departure by more than a same-day clock wrap",
            )),
            EngineError::NegativeInput { field, .. } => Self::bad_request(ApiError::with_details(
                "NEGATIVE_INPUT",
                message,
                format!("Field '{}' must not be negative", field),
            )),
            EngineError::AmountOutOfRange { field } => Self::bad_request(ApiError::with_details(
                "AMOUNT_OUT_OF_RANGE",
                message,
                format!("Inputs make '{}' too large to represent", field),
            )),
            EngineError::ExportFailed { .. } => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::new("EXPORT_ERROR", message),
            },
            EngineError::InvalidTrip { .. } => {
                Self::bad_request(ApiError::new("INVALID_TRIP", message))
            }
            EngineError::InvalidWindow { .. } => {
                Self::bad_request(ApiError::new("INVALID_WINDOW", message))
            }
            EngineError::TripNotFound { .. } => Self {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new("TRIP_NOT_FOUND", message),
            },
        }
    }
}
