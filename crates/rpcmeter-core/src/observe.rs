//! Per-call observation.
//!
//! [`CallObservation`] is a drop guard: whatever way the wrapped call ends
//! (return, error, panic, or the future being dropped), exactly one ops
//! increment and one pair of latency observations are recorded when it drops.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::family::FamilySet;
use crate::labels::{Identity, Status};

/// Families plus the identity labels of one wrapper.
#[derive(Debug, Clone)]
pub struct Instrument {
    families: Arc<FamilySet>,
    identity: Arc<Identity>,
}

impl Instrument {
    /// Bind `identity` to `families`.
    pub fn new(families: Arc<FamilySet>, identity: Identity) -> Self {
        Self {
            families,
            identity: Arc::new(identity),
        }
    }

    /// The families observations are recorded into.
    pub fn families(&self) -> &Arc<FamilySet> {
        &self.families
    }

    /// The identity labels.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Start timing a call to `endpoint`.
    pub fn start(&self, endpoint: impl Into<String>) -> CallObservation {
        CallObservation {
            families: self.families.clone(),
            identity: self.identity.clone(),
            endpoint: endpoint.into(),
            started: Instant::now(),
            status: None,
        }
    }
}

/// Timer for one in-flight call.
///
/// Records on drop. If no outcome was recorded the call counts as a failure.
pub struct CallObservation {
    families: Arc<FamilySet>,
    identity: Arc<Identity>,
    endpoint: String,
    started: Instant,
    status: Option<Status>,
}

impl CallObservation {
    /// Record the outcome of the call.
    pub fn record<T, E>(&mut self, result: &Result<T, E>) {
        self.status = Some(Status::from_result(result));
    }

    /// Await `fut`, record its outcome and pass the result through.
    ///
    /// Start the observation before building `fut`, so a call that panics
    /// while producing its future is still counted.
    pub async fn track<F, T, E>(mut self, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        let result = fut.await;
        self.record(&result);
        result
    }

    /// Endpoint label value.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Time since the call started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for CallObservation {
    fn drop(&mut self) {
        let elapsed = self.started.elapsed();
        let status = self.status.unwrap_or(Status::Failure);

        self.families
            .observe_latency(&self.identity, &self.endpoint, elapsed);
        self.families.count(&self.identity, &self.endpoint, status);
    }
}

impl std::fmt::Debug for CallObservation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallObservation")
            .field("endpoint", &self.endpoint)
            .field("elapsed", &self.elapsed())
            .field("status", &self.status)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::MetricGroup;
    use crate::naming::Naming;

    fn instrument() -> Instrument {
        let families = FamilySet::build(MetricGroup::Client, &Naming::default()).unwrap();
        Instrument::new(Arc::new(families), Identity::new("svc", "v1", "i1"))
    }

    fn ops(instrument: &Instrument, endpoint: &str, status: Status) -> u64 {
        instrument
            .families()
            .ops()
            .with_label_values(&instrument.identity().ops_values(endpoint, status))
            .get()
    }

    fn histogram_count(instrument: &Instrument, endpoint: &str) -> u64 {
        instrument
            .families()
            .histogram()
            .with_label_values(&instrument.identity().latency_values(endpoint))
            .get_sample_count()
    }

    #[test]
    fn test_guard_records_success() {
        let instrument = instrument();
        {
            let mut observation = instrument.start("Greeter.Hello");
            observation.record(&Ok::<(), ()>(()));
        }
        assert_eq!(ops(&instrument, "Greeter.Hello", Status::Success), 1);
        assert_eq!(ops(&instrument, "Greeter.Hello", Status::Failure), 0);
        assert_eq!(histogram_count(&instrument, "Greeter.Hello"), 1);
    }

    #[test]
    fn test_guard_without_outcome_is_failure() {
        let instrument = instrument();
        drop(instrument.start("Greeter.Hello"));
        assert_eq!(ops(&instrument, "Greeter.Hello", Status::Failure), 1);
        assert_eq!(histogram_count(&instrument, "Greeter.Hello"), 1);
    }

    #[test]
    fn test_guard_records_on_unwind() {
        let instrument = instrument();
        let cloned = instrument.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _observation = cloned.start("Greeter.Panic");
            panic!("handler blew up");
        }));
        assert!(result.is_err());
        assert_eq!(ops(&instrument, "Greeter.Panic", Status::Failure), 1);
    }

    #[tokio::test]
    async fn test_track_passes_result_through() {
        let instrument = instrument();

        let ok = instrument
            .start("a")
            .track(async { Ok::<_, String>(42) })
            .await;
        assert_eq!(ok, Ok(42));

        let err = instrument
            .start("a")
            .track(async { Err::<u32, _>("boom".to_string()) })
            .await;
        assert_eq!(err, Err("boom".to_string()));

        assert_eq!(ops(&instrument, "a", Status::Success), 1);
        assert_eq!(ops(&instrument, "a", Status::Failure), 1);
        assert_eq!(histogram_count(&instrument, "a"), 2);
    }

    #[tokio::test]
    async fn test_dropped_future_is_failure() {
        let instrument = instrument();
        let fut = instrument.start("slow").track(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<(), ()>(())
        });

        let timed_out = tokio::time::timeout(Duration::from_millis(10), fut).await;
        assert!(timed_out.is_err());
        assert_eq!(ops(&instrument, "slow", Status::Failure), 1);
        assert_eq!(ops(&instrument, "slow", Status::Success), 0);
    }
}
