use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitThresholds {
    pub failure_rate_threshold: f64,
    pub min_calls: u32,
    pub consecutive_failure_threshold: u32,
    pub window_seconds: i64,
    pub bucket_seconds: i64,
    pub cooldown_seconds: i64,
    pub half_open_max_probes: u32,
    pub half_open_success_close: u32,
}

/// Upper bound for `cooldown_seconds`, `window_seconds` and `bucket_seconds`.
pub const MAX_PERIOD_SECONDS: i64 = 86_400;

impl CircuitThresholds {
    pub fn cooldown(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cooldown_seconds.clamp(0, MAX_PERIOD_SECONDS))
    }
}

impl Default for CircuitThresholds {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 0.50,
            min_calls: 10,
            consecutive_failure_threshold: 5,
            window_seconds: 60,
            bucket_seconds: 10,
            cooldown_seconds: 30,
            half_open_max_probes: 1,
            half_open_success_close: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowBucket {
    pub epoch: i64,
    pub total: u32,
    pub failed: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub buckets: VecDeque<WindowBucket>,
    pub consecutive_failures: u32,
    pub opened_at: Option<DateTime<Utc>>,
    pub cooldown_until: Option<DateTime<Utc>>,
    pub probes_in_flight: u32,
    pub probe_success_streak: u32,
    pub updated_at: DateTime<Utc>,
}

impl CircuitSnapshot {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: CircuitState::Closed,
            buckets: VecDeque::new(),
            consecutive_failures: 0,
            opened_at: None,
            cooldown_until: None,
            probes_in_flight: 0,
            probe_success_streak: 0,
            updated_at: Utc::now(),
        }
    }

    /// (total, failed) over the buckets still inside the rolling window.
    pub fn window_counts(&self, thresholds: &CircuitThresholds, now: DateTime<Utc>) -> (u32, u32) {
        let oldest = oldest_live_epoch(thresholds, now);
        self.buckets
            .iter()
            .filter(|b| b.epoch >= oldest)
            .fold((0, 0), |(t, f), b| (t + b.total, f + b.failed))
    }
}

pub fn bucket_epoch(thresholds: &CircuitThresholds, now: DateTime<Utc>) -> i64 {
    now.timestamp().div_euclid(thresholds.bucket_seconds.max(1))
}

pub fn oldest_live_epoch(thresholds: &CircuitThresholds, now: DateTime<Utc>) -> i64 {
    let width = thresholds.bucket_seconds.max(1);
    let span = (thresholds.window_seconds / width).max(1);
    bucket_epoch(thresholds, now) - span + 1
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CircuitDecision {
    Allow,
    Probe,
    Reject(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Success,
    Failure,
}
