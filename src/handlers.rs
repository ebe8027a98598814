// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the lead intake service.
//!
//! Each submission walks a linear pipeline with short-circuit exits:
//! rate check → parse → validate → alert (best-effort) → respond. The
//! response to the patient depends only on validation; alert delivery
//! failures are logged and swallowed.
//!
//! Log fields are limited to operational context (city, service, error
//! kind, counts). Patient name, phone, and age never reach the logs.

use crate::config::Config;
use crate::error::AppError;
use crate::limiter::SlidingWindowLimiter;
use crate::notifier::{ButtonSource, PhoneClick, TelegramNotifier};
use crate::validator::{self, ValidationResult};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Channel tag attached to every form submission.
const LEAD_SOURCE: &str = "website";

/// Chance that a request triggers an opportunistic limiter sweep, so the
/// tracking maps cannot grow unbounded between background sweeps.
const SWEEP_PROBABILITY: f64 = 0.1;

/// Shared application state.
pub struct AppState {
    pub lead_limiter: SlidingWindowLimiter,
    pub error_limiter: SlidingWindowLimiter,
    pub notifier: TelegramNotifier,
    pub config: Config,
    pub daily: DailyCounters,
}

impl AppState {
    /// Build the state a running service needs from resolved configuration.
    pub fn from_config(config: Config) -> Result<Self, reqwest::Error> {
        let lead_limiter = SlidingWindowLimiter::new(
            config.rate_limit.max_submissions,
            config.rate_limit.submission_window(),
        );
        let error_limiter = SlidingWindowLimiter::new(
            config.rate_limit.max_error_reports,
            config.rate_limit.error_report_window(),
        );
        let notifier = TelegramNotifier::new(config.telegram.clone())?;

        Ok(Self {
            lead_limiter,
            error_limiter,
            notifier,
            config,
            daily: DailyCounters::default(),
        })
    }

    fn fallback_phone(&self) -> String {
        self.config.contact.main_phone.clone()
    }
}

/// Today's lead volume, reported and reset by the daily summary task.
#[derive(Debug, Default)]
pub struct DailyCounters {
    pub leads: AtomicU64,
    pub phone_clicks: AtomicU64,
}

impl DailyCounters {
    /// Snapshot and reset both counters.
    pub fn take(&self) -> (u64, u64) {
        (
            self.leads.swap(0, Ordering::Relaxed),
            self.phone_clicks.swap(0, Ordering::Relaxed),
        )
    }
}

/// Acknowledgment body for every successful intake.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/api/leads", post(submit_lead))
        .route("/api/error-tracking", post(track_error))
        .route("/api/phone-clicks", post(record_phone_click))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "booking-lead-gateway",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Booking form intake.
pub async fn submit_lead(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SuccessResponse>, AppError> {
    let client = client_id(&headers);

    if !state.lead_limiter.admit(&client).await {
        info!(client = %client, "lead submission rate limited");
        return Err(AppError::SubmissionRateLimited {
            fallback_phone: state.fallback_phone(),
        });
    }

    if rand::random::<f64>() < SWEEP_PROBABILITY {
        state.lead_limiter.sweep().await;
    }

    // The body is parsed by hand so a malformed payload maps to the generic
    // processing failure, with the fallback phone, not a bare 400.
    let raw: Value = serde_json::from_slice(&body).map_err(|err| {
        warn!(error = %err, "lead body was not valid JSON");
        AppError::Processing {
            fallback_phone: state.fallback_phone(),
        }
    })?;

    let fields = match validator::validate(&raw) {
        ValidationResult::Valid(fields) => fields,
        ValidationResult::Invalid(errors) => {
            debug!(error_count = errors.len(), "lead failed validation");
            return Err(AppError::Validation(errors));
        }
    };

    let lead = fields.into_lead(Utc::now(), LEAD_SOURCE);
    state.daily.leads.fetch_add(1, Ordering::Relaxed);

    // Fire-and-forget: the patient's acknowledgment never waits on Telegram.
    let alert_state = state.clone();
    tokio::spawn(async move {
        let delivered = alert_state.notifier.send_lead_alert(&lead).await;
        if delivered {
            info!(city = %lead.city, service = %lead.service, "lead alert delivered");
        } else {
            warn!(city = %lead.city, "lead alert not delivered");
        }
    });

    Ok(Json(SuccessResponse {
        success: true,
        message: "Lead captured successfully",
    }))
}

/// Client-side error report intake. Accepts operational context only;
/// patient fields have no place in this payload.
pub async fn track_error(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SuccessResponse>, AppError> {
    let client = client_id(&headers);

    if !state.error_limiter.admit(&client).await {
        info!(client = %client, "error report rate limited");
        return Err(AppError::ErrorTrackingRateLimited);
    }

    if rand::random::<f64>() < SWEEP_PROBABILITY {
        state.error_limiter.sweep().await;
    }

    let raw: Value = serde_json::from_slice(&body).map_err(|err| {
        warn!(error = %err, "error report body was not valid JSON");
        AppError::ErrorTrackingUnavailable
    })?;

    let kind = raw
        .get("errorType")
        .and_then(Value::as_str)
        .and_then(ErrorKind::parse);
    let city = raw
        .get("city")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let timestamp = raw
        .get("timestamp")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty());

    let (Some(kind), Some(city), Some(timestamp)) = (kind, city, timestamp) else {
        return Err(AppError::InvalidErrorReport);
    };

    let service = raw
        .get("service")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("unknown");
    let severity = raw
        .get("severity")
        .and_then(Value::as_str)
        .and_then(Severity::parse)
        .unwrap_or(Severity::Medium);
    let retry_count = raw.get("retryCount").and_then(Value::as_u64).unwrap_or(0);
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    // Truncated user agent and client address: enough for monitoring,
    // bounded for privacy.
    error!(
        error_type = %kind,
        city = %city,
        service = %service,
        severity = %severity,
        retry_count,
        timestamp = %timestamp,
        user_agent = %truncate(user_agent, 100),
        client = %truncate(&client, 15),
        "form submission error tracked"
    );

    Ok(Json(SuccessResponse {
        success: true,
        message: "Error tracked successfully",
    }))
}

/// "Call Now" button click intake. No patient fields are accepted; the
/// payload names the business number dialed and the button placement.
pub async fn record_phone_click(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<PhoneClickRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let client = client_id(&headers);

    if !state.lead_limiter.admit(&client).await {
        info!(client = %client, "phone click rate limited");
        return Err(AppError::SubmissionRateLimited {
            fallback_phone: state.fallback_phone(),
        });
    }

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let click = PhoneClick {
        phone_number: request
            .phone_number
            .unwrap_or_else(|| state.config.contact.main_phone.clone()),
        timestamp: Utc::now(),
        user_agent,
        source: request.source,
    };
    state.daily.phone_clicks.fetch_add(1, Ordering::Relaxed);

    let alert_state = state.clone();
    tokio::spawn(async move {
        if !alert_state.notifier.send_phone_click_alert(&click).await {
            warn!(source = %click.source, "phone click alert not delivered");
        }
    });

    Ok(Json(SuccessResponse {
        success: true,
        message: "Click recorded",
    }))
}

/// Phone click payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneClickRequest {
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default = "default_button_source")]
    pub source: ButtonSource,
}

fn default_button_source() -> ButtonSource {
    ButtonSource::PhoneButton
}

/// Client-side failure categories accepted by the error-tracking endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Validation,
    Server,
    Timeout,
    Unknown,
}

impl ErrorKind {
    fn parse(input: &str) -> Option<Self> {
        match input {
            "network" => Some(ErrorKind::Network),
            "validation" => Some(ErrorKind::Validation),
            "server" => Some(ErrorKind::Server),
            "timeout" => Some(ErrorKind::Timeout),
            "unknown" => Some(ErrorKind::Unknown),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Validation => "validation",
            ErrorKind::Server => "server",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Report severity; defaults to medium when absent or unrecognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    fn parse(input: &str) -> Option<Self> {
        match input {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client identity for rate limiting: forwarded-address headers, with a
/// shared fallback bucket for header-less clients. All such clients pool
/// into one quota; a known precision limitation, kept as-is.
fn client_id(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// Char-boundary-safe prefix.
fn truncate(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}
