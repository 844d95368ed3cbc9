use crate::circuit::state::{CircuitDecision, CircuitSnapshot, CircuitState, CircuitThresholds};

pub fn pre_call_decision(
    snapshot: &CircuitSnapshot,
    thresholds: &CircuitThresholds,
    now: chrono::DateTime<chrono::Utc>,
) -> CircuitDecision {
    match snapshot.state {
        CircuitState::Closed => CircuitDecision::Allow,
        CircuitState::Open => {
            if !snapshot.cooldown_until.is_some_and(|t| now >= t) {
                CircuitDecision::Reject("circuit open".to_string())
            } else if snapshot.probes_in_flight < thresholds.half_open_max_probes {
                CircuitDecision::Probe
            } else {
                CircuitDecision::Reject("circuit open, probe in flight".to_string())
            }
        }
        CircuitState::HalfOpen => {
            if snapshot.probes_in_flight < thresholds.half_open_max_probes {
                CircuitDecision::Probe
            } else {
                CircuitDecision::Reject("half-open probe limit reached".to_string())
            }
        }
    }
}
