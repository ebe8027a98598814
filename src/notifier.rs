// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Telegram alert delivery.
//!
//! Outbound notifications are strictly best-effort: missing credentials,
//! transport errors, and non-2xx responses all collapse to a `false` return
//! so the booking flow is never blocked by the messaging integration.
//! One delivery attempt per alert, no retries, no re-queueing.

use crate::config::TelegramConfig;
use crate::validator::Lead;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Request timeout for the Bot API call. A hung Telegram endpoint must not
/// pin delivery tasks indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// IST (+05:30), the business's local time for alert timestamps.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 1800;

/// Telegram `sendMessage` payload.
#[derive(Debug, Serialize)]
struct BotMessage<'a> {
    chat_id: &'a str,
    text: String,
    parse_mode: &'static str,
}

/// Which "Call Now" button was clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonSource {
    Header,
    Sticky,
    Hero,
    Cta,
    PhoneButton,
}

impl ButtonSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ButtonSource::Header => "header",
            ButtonSource::Sticky => "sticky",
            ButtonSource::Hero => "hero",
            ButtonSource::Cta => "cta",
            ButtonSource::PhoneButton => "phone_button",
        }
    }
}

impl std::fmt::Display for ButtonSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A "Call Now" button click. High-intent, but carries no patient fields —
/// only the business number dialed and click metadata.
#[derive(Debug, Clone)]
pub struct PhoneClick {
    pub phone_number: String,
    pub timestamp: DateTime<Utc>,
    pub user_agent: String,
    pub source: ButtonSource,
}

/// Delivers owner alerts through the Telegram Bot API.
pub struct TelegramNotifier {
    client: reqwest::Client,
    config: TelegramConfig,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, config })
    }

    /// Instant alert for a new booking. The owner is expected to call the
    /// patient back within minutes, so this is the highest-value message.
    pub async fn send_lead_alert(&self, lead: &Lead) -> bool {
        self.deliver(format_lead_alert(lead)).await
    }

    /// Alert for a "Call Now" button click.
    pub async fn send_phone_click_alert(&self, click: &PhoneClick) -> bool {
        self.deliver(format_phone_click_alert(click)).await
    }

    /// Daily lead-volume summary. Counters are supplied by the caller; the
    /// service keeps them in memory for the current day only.
    pub async fn send_daily_report(&self, leads: u64, phone_clicks: u64) -> bool {
        self.deliver(format_daily_report(Utc::now(), leads, phone_clicks))
            .await
    }

    /// One POST to the Bot API. Every failure mode returns `false`.
    async fn deliver(&self, text: String) -> bool {
        let Some((token, chat_id)) = self.credentials() else {
            debug!("telegram credentials not configured, skipping alert");
            return false;
        };

        let url = format!(
            "{}/bot{}/sendMessage",
            self.config.api_base.trim_end_matches('/'),
            token
        );
        let message = BotMessage {
            chat_id,
            text,
            parse_mode: "Markdown",
        };

        match self.client.post(&url).json(&message).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!(status = %response.status(), "telegram API rejected alert");
                false
            }
            Err(err) => {
                warn!(error = %err, "telegram alert delivery failed");
                false
            }
        }
    }

    /// Both credentials, or `None` when delivery is soft-disabled.
    fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.config.bot_token, &self.config.chat_id) {
            (Some(token), Some(chat_id)) if !token.is_empty() && !chat_id.is_empty() => {
                Some((token, chat_id))
            }
            _ => None,
        }
    }
}

fn format_lead_alert(lead: &Lead) -> String {
    format!(
        "*NEW DOCTOR BOOKING*\n\n\
         *Patient:* {name}\n\
         *Age:* {age} years\n\
         *Phone:* {phone}\n\
         *Location:* {city}\n\
         *Service:* {service}\n\n\
         *Time:* {time}\n\
         *Source:* {source}\n\n\
         Call the patient back within 2 minutes.",
        name = lead.name,
        age = lead.age,
        phone = lead.phone,
        city = lead.city.as_str().to_uppercase(),
        service = lead.service,
        time = format_ist(lead.timestamp),
        source = lead.source,
    )
}

fn format_phone_click_alert(click: &PhoneClick) -> String {
    let device = if click.user_agent.contains("Mobile") {
        "Mobile"
    } else {
        "Desktop"
    };
    format!(
        "*PHONE BUTTON CLICKED*\n\n\
         *Number called:* {number}\n\
         *Button:* {source}\n\
         *Time:* {time}\n\
         *Device:* {device}\n\n\
         High-intent caller: be ready to answer, or call back if missed.",
        number = click.phone_number,
        source = click.source.as_str().to_uppercase(),
        time = format_ist(click.timestamp),
    )
}

fn format_daily_report(now: DateTime<Utc>, leads: u64, phone_clicks: u64) -> String {
    format!(
        "*DAILY REPORT — {date}*\n\n\
         *Form submissions:* {leads}\n\
         *Phone button clicks:* {phone_clicks}\n\
         *Total leads:* {total}\n\n\
         Patient details are never stored; follow up from the individual alerts.",
        date = format_ist_date(now),
        total = leads + phone_clicks,
    )
}

fn format_ist(timestamp: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(IST_OFFSET_SECS) {
        Some(offset) => timestamp
            .with_timezone(&offset)
            .format("%d/%m/%Y, %I:%M:%S %p IST")
            .to_string(),
        None => timestamp.to_rfc3339(),
    }
}

fn format_ist_date(timestamp: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(IST_OFFSET_SECS) {
        Some(offset) => timestamp
            .with_timezone(&offset)
            .format("%d/%m/%Y")
            .to_string(),
        None => timestamp.to_rfc3339(),
    }
}
