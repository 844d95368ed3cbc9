use crate::circuit::evaluator::pre_call_decision;
use crate::circuit::state::{CallOutcome, CircuitDecision, CircuitSnapshot, CircuitThresholds};
use crate::circuit::transitions::{apply_transition, begin_probe};
use crate::error::EngineError;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared breaker. Clones share one snapshot; the lock is never held across an await.
#[derive(Clone)]
pub struct CircuitBreaker {
    thresholds: Arc<CircuitThresholds>,
    inner: Arc<Mutex<CircuitSnapshot>>,
}

impl CircuitBreaker {
    pub fn new(name: &str, thresholds: CircuitThresholds) -> Self {
        Self {
            thresholds: Arc::new(thresholds),
            inner: Arc::new(Mutex::new(CircuitSnapshot::new(name))),
        }
    }

    pub fn thresholds(&self) -> &CircuitThresholds {
        &self.thresholds
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, CircuitSnapshot> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Runs `f` unless the breaker is open. Only infrastructure errors count as failures.
    pub async fn call<T, F, Fut>(&self, f: F) -> Result<T, EngineError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, EngineError>>,
    {
        let was_probe = {
            let mut snapshot = self.lock();
            let now = chrono::Utc::now();
            match pre_call_decision(&snapshot, &self.thresholds, now) {
                CircuitDecision::Allow => false,
                CircuitDecision::Probe => {
                    *snapshot = begin_probe(snapshot.clone(), now);
                    tracing::info!(breaker = %snapshot.name, "circuit half-open, admitting probe");
                    true
                }
                CircuitDecision::Reject(reason) => {
                    tracing::warn!(breaker = %snapshot.name, %reason, "call rejected");
                    return Err(EngineError::CircuitOpen);
                }
            }
        };

        let mut in_flight = InFlight {
            breaker: self,
            was_probe,
            finished: false,
        };
        let result = f().await;
        in_flight.finished = true;

        let outcome = match &result {
            Err(e) if e.is_infrastructure() => CallOutcome::Failure,
            _ => CallOutcome::Success,
        };
        self.finish(outcome, was_probe);
        result
    }

    fn finish(&self, outcome: CallOutcome, was_probe: bool) {
        let mut snapshot = self.lock();
        let before = snapshot.state;
        *snapshot = apply_transition(snapshot.clone(), &self.thresholds, outcome, was_probe, chrono::Utc::now());
        if before != snapshot.state {
            tracing::info!(
                breaker = %snapshot.name,
                from = ?before,
                to = ?snapshot.state,
                "circuit state changed"
            );
        }
    }
}

/// Releases the probe slot if the wrapped future is dropped before completing.
struct InFlight<'a> {
    breaker: &'a CircuitBreaker,
    was_probe: bool,
    finished: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.was_probe && !self.finished {
            let mut snapshot = self.breaker.lock();
            snapshot.probes_in_flight = snapshot.probes_in_flight.saturating_sub(1);
        }
    }
}
