// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the lead intake service.
//!
//! Everything is optional in the environment; hardcoded fallbacks keep a
//! development checkout runnable without secrets. Absent Telegram
//! credentials soft-disable alert delivery rather than failing startup.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Configuration for the lead intake service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Business contact surface shown to patients in failure messages
    #[serde(default)]
    pub contact: ContactConfig,

    /// Telegram bot credentials and endpoint
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Analytics measurement ids surfaced to the frontend
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

/// Sliding-window quotas for the two public intake endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum lead submissions per client in the trailing window (default: 10)
    #[serde(default = "default_max_submissions")]
    pub max_submissions: usize,

    /// Lead submission window in milliseconds (default: 300000, 5 minutes)
    #[serde(default = "default_submission_window_ms")]
    pub submission_window_ms: u64,

    /// Maximum error reports per client in the trailing window (default: 10)
    #[serde(default = "default_max_error_reports")]
    pub max_error_reports: usize,

    /// Error report window in milliseconds (default: 60000)
    #[serde(default = "default_error_report_window_ms")]
    pub error_report_window_ms: u64,
}

/// Business contact details used in patient-facing fallback messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactConfig {
    /// Primary business phone number (default: +91-9182296058)
    #[serde(default = "default_main_phone")]
    pub main_phone: String,

    /// Business email address
    #[serde(default = "default_business_email")]
    pub business_email: String,
}

/// Telegram delivery configuration.
///
/// A missing token or chat id disables delivery; the booking flow proceeds
/// without alerts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token for the Telegram Bot API
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Destination chat id for alerts
    #[serde(default)]
    pub chat_id: Option<String>,

    /// Bot API base URL (default: https://api.telegram.org)
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
}

/// Analytics measurement ids. Carried in configuration only; the service
/// itself emits no analytics events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Google Analytics measurement id
    #[serde(default)]
    pub ga_measurement_id: Option<String>,

    /// Microsoft Clarity project id
    #[serde(default)]
    pub clarity_project_id: Option<String>,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_submissions() -> usize {
    10
}

fn default_submission_window_ms() -> u64 {
    300_000 // 5 minutes
}

fn default_max_error_reports() -> usize {
    10
}

fn default_error_report_window_ms() -> u64 {
    60_000
}

fn default_main_phone() -> String {
    "+91-9182296058".to_string()
}

fn default_business_email() -> String {
    "doctorbookings2708@gmail.com".to_string()
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            rate_limit: RateLimitConfig::default(),
            contact: ContactConfig::default(),
            telegram: TelegramConfig::default(),
            analytics: AnalyticsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_submissions: default_max_submissions(),
            submission_window_ms: default_submission_window_ms(),
            max_error_reports: default_max_error_reports(),
            error_report_window_ms: default_error_report_window_ms(),
        }
    }
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            main_phone: default_main_phone(),
            business_email: default_business_email(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: default_telegram_api_base(),
        }
    }
}

impl RateLimitConfig {
    /// Trailing window for lead submissions
    pub fn submission_window(&self) -> Duration {
        Duration::from_millis(self.submission_window_ms)
    }

    /// Trailing window for error reports
    pub fn error_report_window(&self) -> Duration {
        Duration::from_millis(self.error_report_window_ms)
    }
}

impl Config {
    /// Resolve configuration from environment variables, falling back to the
    /// documented defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_or("BIND_ADDR", default_bind_addr()),
            rate_limit: RateLimitConfig {
                max_submissions: env_or("MAX_SUBMISSIONS", default_max_submissions()),
                submission_window_ms: env_or(
                    "SUBMISSION_WINDOW_MS",
                    default_submission_window_ms(),
                ),
                max_error_reports: env_or("MAX_ERROR_REPORTS", default_max_error_reports()),
                error_report_window_ms: env_or(
                    "ERROR_REPORT_WINDOW_MS",
                    default_error_report_window_ms(),
                ),
            },
            contact: ContactConfig {
                main_phone: env_or("MAIN_PHONE", default_main_phone()),
                business_email: env_or("BUSINESS_EMAIL", default_business_email()),
            },
            telegram: TelegramConfig {
                bot_token: env_opt("TELEGRAM_BOT_TOKEN"),
                chat_id: env_opt("TELEGRAM_CHAT_ID"),
                api_base: env_or("TELEGRAM_API_BASE", default_telegram_api_base()),
            },
            analytics: AnalyticsConfig {
                ga_measurement_id: env_opt("GA_MEASUREMENT_ID"),
                clarity_project_id: env_opt("CLARITY_PROJECT_ID"),
            },
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
