// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Booking Lead Gateway
//!
//! Lead intake service for a doorstep doctor-visit business serving Vizag,
//! Tirupati, and Kakinada:
//!
//! - Server-side re-validation of booking submissions (all field errors
//!   accumulated in one pass)
//! - Per-client sliding-window rate limiting, in memory
//! - Instant Telegram alerts to the business owner, best-effort and
//!   at-most-once
//! - Sanitized client-side error tracking, free of patient data
//!
//! Leads are never persisted: an accepted submission exists only long
//! enough to be validated and forwarded as an alert.

pub mod config;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod notifier;
pub mod validator;

pub use config::Config;
pub use error::AppError;
pub use limiter::SlidingWindowLimiter;
pub use notifier::{PhoneClick, TelegramNotifier};
pub use validator::{Lead, ValidationResult};
