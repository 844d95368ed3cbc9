use crate::circuit::state::{
    bucket_epoch, oldest_live_epoch, CallOutcome, CircuitSnapshot, CircuitState, CircuitThresholds, WindowBucket,
};
use chrono::{DateTime, Utc};

/// Admits a trial call; an expired `Open` breaker moves to `HalfOpen` here.
pub fn begin_probe(mut snapshot: CircuitSnapshot, now: DateTime<Utc>) -> CircuitSnapshot {
    if snapshot.state == CircuitState::Open {
        snapshot.state = CircuitState::HalfOpen;
        snapshot.probe_success_streak = 0;
    }
    snapshot.probes_in_flight += 1;
    snapshot.updated_at = now;
    snapshot
}

pub fn apply_transition(
    mut snapshot: CircuitSnapshot,
    thresholds: &CircuitThresholds,
    outcome: CallOutcome,
    was_probe: bool,
    now: DateTime<Utc>,
) -> CircuitSnapshot {
    if was_probe {
        snapshot.probes_in_flight = snapshot.probes_in_flight.saturating_sub(1);
    }

    match snapshot.state {
        CircuitState::Closed => {
            record(&mut snapshot, thresholds, outcome, now);
            let (total, failed) = snapshot.window_counts(thresholds, now);
            let failure_rate = if total == 0 { 0.0 } else { failed as f64 / total as f64 };
            if snapshot.consecutive_failures >= thresholds.consecutive_failure_threshold
                || (total >= thresholds.min_calls && failure_rate > thresholds.failure_rate_threshold)
            {
                trip(&mut snapshot, thresholds, now);
            }
        }
        CircuitState::HalfOpen if was_probe => match outcome {
            CallOutcome::Failure => trip(&mut snapshot, thresholds, now),
            CallOutcome::Success => {
                snapshot.probe_success_streak += 1;
                if snapshot.probe_success_streak >= thresholds.half_open_success_close {
                    snapshot.state = CircuitState::Closed;
                    snapshot.buckets.clear();
                    snapshot.consecutive_failures = 0;
                    snapshot.probe_success_streak = 0;
                    snapshot.opened_at = None;
                    snapshot.cooldown_until = None;
                }
            }
        },
        // Results of calls admitted before the last state change.
        CircuitState::HalfOpen | CircuitState::Open => {}
    }

    snapshot.updated_at = now;
    snapshot
}

fn record(snapshot: &mut CircuitSnapshot, thresholds: &CircuitThresholds, outcome: CallOutcome, now: DateTime<Utc>) {
    let epoch = bucket_epoch(thresholds, now);
    let oldest = oldest_live_epoch(thresholds, now);
    while snapshot.buckets.front().is_some_and(|b| b.epoch < oldest) {
        snapshot.buckets.pop_front();
    }
    if snapshot.buckets.back().map(|b| b.epoch) != Some(epoch) {
        snapshot.buckets.push_back(WindowBucket {
            epoch,
            total: 0,
            failed: 0,
        });
    }
    if let Some(bucket) = snapshot.buckets.back_mut() {
        bucket.total += 1;
        if outcome == CallOutcome::Failure {
            bucket.failed += 1;
        }
    }

    match outcome {
        CallOutcome::Success => snapshot.consecutive_failures = 0,
        CallOutcome::Failure => snapshot.consecutive_failures += 1,
    }
}

fn trip(snapshot: &mut CircuitSnapshot, thresholds: &CircuitThresholds, now: DateTime<Utc>) {
    snapshot.state = CircuitState::Open;
    snapshot.opened_at = Some(now);
    snapshot.cooldown_until = Some(now + thresholds.cooldown());
    snapshot.buckets.clear();
    snapshot.consecutive_failures = 0;
    snapshot.probe_success_streak = 0;
}
