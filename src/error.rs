// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Service error types.
//!
//! Every variant renders to exactly the text the HTTP client sees, as a
//! `{"error": ...}` body with the matching status. Patient-identifying
//! fields never appear in these messages. Failure messages that a patient
//! may act on carry the business fallback phone number, so a software
//! failure never loses the lead entirely.

use crate::validator::ValidationError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by the intake endpoints.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Too many submissions. Please try again in 5 minutes or call {fallback_phone} directly.")]
    SubmissionRateLimited { fallback_phone: String },

    #[error("Error tracking rate limit exceeded")]
    ErrorTrackingRateLimited,

    #[error("{}", join_messages(.0))]
    Validation(Vec<ValidationError>),

    #[error("Invalid error tracking data")]
    InvalidErrorReport,

    #[error("Unable to process booking. Please call {fallback_phone} for immediate assistance.")]
    Processing { fallback_phone: String },

    #[error("Error tracking system unavailable")]
    ErrorTrackingUnavailable,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::SubmissionRateLimited { .. } | AppError::ErrorTrackingRateLimited => {
                StatusCode::TOO_MANY_REQUESTS
            }
            AppError::Validation(_) | AppError::InvalidErrorReport => StatusCode::BAD_REQUEST,
            AppError::Processing { .. } | AppError::ErrorTrackingUnavailable => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
