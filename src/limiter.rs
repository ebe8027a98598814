// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Sliding-window rate limiter for the public intake endpoints.
//!
//! Tracks per-client submission timestamps in memory: a client may make at
//! most `max_events` submissions in any trailing `window`. Expired entries
//! are trimmed on every admission check; a full sweep removes clients whose
//! windows have drained entirely.
//!
//! State is process-local and lost on restart. Restart briefly resets abuse
//! protection; accepted for a single-instance deployment.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Per-client sliding-window admission control.
///
/// The intake endpoints each own an instance with their own quota. Clients
/// are keyed by an opaque identifier string (a forwarded network address,
/// or the shared `"unknown"` bucket).
pub struct SlidingWindowLimiter {
    max_events: usize,
    window: Duration,
    clients: RwLock<HashMap<String, Vec<Instant>>>,
}

impl SlidingWindowLimiter {
    /// Create a limiter admitting at most `max_events` per client in any
    /// trailing `window`.
    pub fn new(max_events: usize, window: Duration) -> Self {
        Self {
            max_events,
            window,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Admission check against the trailing window ending now.
    pub async fn admit(&self, client_id: &str) -> bool {
        self.admit_at(client_id, Instant::now()).await
    }

    /// Admission check with an explicit `now`.
    ///
    /// The client's expired timestamps are trimmed first; at the limit the
    /// event is rejected without being recorded, otherwise `now` is appended
    /// and the event admitted. The write lock makes the read-modify-write
    /// atomic across overlapping requests for the same client.
    pub async fn admit_at(&self, client_id: &str, now: Instant) -> bool {
        let mut clients = self.clients.write().await;
        let events = clients.entry(client_id.to_string()).or_default();
        events.retain(|&t| now.duration_since(t) < self.window);

        if events.len() >= self.max_events {
            debug!(client = %client_id, "rate limit exceeded");
            return false;
        }

        events.push(now);
        true
    }

    /// Trim every tracked client, dropping those left with no in-window
    /// events. Bounds memory growth between requests, since no single
    /// request is guaranteed to touch a given client's entry again.
    pub async fn sweep(&self) {
        self.sweep_at(Instant::now()).await;
    }

    /// Sweep with an explicit `now`.
    pub async fn sweep_at(&self, now: Instant) {
        let mut clients = self.clients.write().await;
        clients.retain(|_, events| {
            events.retain(|&t| now.duration_since(t) < self.window);
            !events.is_empty()
        });
    }

    /// Number of clients currently tracked.
    pub async fn tracked_clients(&self) -> usize {
        self.clients.read().await.len()
    }
}
