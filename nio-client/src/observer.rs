//! Instrumentation hooks invoked after each check and list round trip.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::{Ns, Obj, Rel, UserId};

/// What a single check call looked like.
#[derive(Debug, Clone, Copy)]
pub struct CheckObservation<'a> {
    pub ns: &'a Ns,
    pub obj: &'a Obj,
    pub rel: &'a Rel,
    pub user_id: &'a UserId,
    pub elapsed: Duration,
    pub ok: bool,
    pub is_error: bool,
}

/// What a single list call looked like.
#[derive(Debug, Clone, Copy)]
pub struct ListObservation<'a> {
    pub ns: &'a Ns,
    pub rel: &'a Rel,
    pub user_id: &'a UserId,
    pub elapsed: Duration,
    pub is_error: bool,
}

/// Receives call observations. Runs synchronously on the calling task, so
/// implementations must be cheap and must not block.
pub trait CheckObserver: Send + Sync {
    fn observe_check(&self, _observation: &CheckObservation<'_>) {}

    fn observe_list(&self, _observation: &ListObservation<'_>) {}
}

/// Observer that does nothing. The client default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CheckObserver for NoopObserver {}

/// Logs every observation at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CheckObserver for TracingObserver {
    fn observe_check(&self, o: &CheckObservation<'_>) {
        debug!(
            ns = %o.ns,
            obj = %o.obj,
            rel = %o.rel,
            user_id = %o.user_id,
            elapsed_ms = o.elapsed.as_millis() as u64,
            ok = o.ok,
            is_error = o.is_error,
            "check"
        );
    }

    fn observe_list(&self, o: &ListObservation<'_>) {
        debug!(
            ns = %o.ns,
            rel = %o.rel,
            user_id = %o.user_id,
            elapsed_ms = o.elapsed.as_millis() as u64,
            is_error = o.is_error,
            "list"
        );
    }
}

/// Records call latency and outcome counts through the `metrics` facade.
///
/// User ids are left out of the labels to keep cardinality bounded.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObserver;

impl MetricsObserver {
    fn outcome(ok: bool, is_error: bool) -> &'static str {
        match (is_error, ok) {
            (true, _) => "error",
            (false, true) => "allowed",
            (false, false) => "denied",
        }
    }
}

impl CheckObserver for MetricsObserver {
    fn observe_check(&self, o: &CheckObservation<'_>) {
        let outcome = Self::outcome(o.ok, o.is_error);
        metrics::histogram!(
            "nio_check_duration_seconds",
            "ns" => o.ns.to_string(),
            "rel" => o.rel.to_string()
        )
        .record(o.elapsed.as_secs_f64());
        metrics::counter!(
            "nio_check_total",
            "ns" => o.ns.to_string(),
            "rel" => o.rel.to_string(),
            "outcome" => outcome
        )
        .increment(1);
    }

    fn observe_list(&self, o: &ListObservation<'_>) {
        let outcome = if o.is_error { "error" } else { "ok" };
        metrics::histogram!(
            "nio_list_duration_seconds",
            "ns" => o.ns.to_string(),
            "rel" => o.rel.to_string()
        )
        .record(o.elapsed.as_secs_f64());
        metrics::counter!(
            "nio_list_total",
            "ns" => o.ns.to_string(),
            "rel" => o.rel.to_string(),
            "outcome" => outcome
        )
        .increment(1);
    }
}

/// Runs an observer callback, containing any panic it raises.
pub(crate) fn notify(callback: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(callback)).is_err() {
        warn!("observer panicked; observation dropped");
    }
}
