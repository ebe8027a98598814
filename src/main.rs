// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Booking Lead Gateway service binary.
//!
//! Accepts booking-form submissions for doorstep doctor visits, validates
//! them, rate-limits abusive clients, and alerts the business owner over
//! Telegram. Nothing is persisted.
//!
//! ## Configuration
//!
//! Loaded from the environment (`.env` supported), all optional:
//!
//! - `BIND_ADDR`: server bind address (default: 0.0.0.0:8080)
//! - `MAX_SUBMISSIONS` / `SUBMISSION_WINDOW_MS`: lead quota (default: 10 per 5 minutes)
//! - `MAX_ERROR_REPORTS` / `ERROR_REPORT_WINDOW_MS`: error report quota (default: 10 per minute)
//! - `TELEGRAM_BOT_TOKEN` / `TELEGRAM_CHAT_ID`: alert credentials (absent = alerts disabled)
//! - `MAIN_PHONE` / `BUSINESS_EMAIL`: patient-facing contact fallbacks

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use booking_lead_gateway::config::Config;
use booking_lead_gateway::handlers::{router, AppState};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const DAILY_REPORT_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::from_env();
    info!(
        bind_addr = %config.bind_addr,
        max_submissions = config.rate_limit.max_submissions,
        submission_window_ms = config.rate_limit.submission_window_ms,
        alerts_enabled = config.telegram.bot_token.is_some() && config.telegram.chat_id.is_some(),
        "Starting booking lead gateway"
    );

    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::from_config(config)?);

    // Out-of-band sweep keeps limiter memory bounded even when traffic is
    // too sparse for the opportunistic per-request cleanup to fire.
    let sweep_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            sweep_state.lead_limiter.sweep().await;
            sweep_state.error_limiter.sweep().await;
        }
    });

    // Daily lead-volume summary for the business owner.
    let report_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(DAILY_REPORT_INTERVAL);
        // The first tick completes immediately; skip it so the report
        // covers a full day.
        interval.tick().await;
        loop {
            interval.tick().await;
            let (leads, phone_clicks) = report_state.daily.take();
            if !report_state
                .notifier
                .send_daily_report(leads, phone_clicks)
                .await
            {
                warn!(leads, phone_clicks, "daily report not delivered");
            }
        }
    });

    let app = router(state);

    let addr: SocketAddr = bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
