use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tonic::Status;
use tracing::debug;

use crate::{
    config::ClientConfig,
    error::{NioError, Result},
    models::*,
    observer::{notify, CheckObservation, CheckObserver, ListObservation, NoopObserver},
    proto,
    transport::{CheckService, GrpcCheckService},
};

/// Client for the remote check service.
///
/// Holds only immutable state after construction and can be shared across
/// concurrent requests behind an `Arc`. No results are cached and no call is
/// retried.
#[derive(Clone)]
pub struct CheckClient {
    service: Arc<dyn CheckService>,
    observer: Arc<dyn CheckObserver>,
    timeout: Duration,
}

impl std::fmt::Debug for CheckClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckClient")
            .field("service", &"<CheckService>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CheckClient {
    pub fn new(service: Arc<dyn CheckService>) -> Self {
        Self {
            service,
            observer: Arc::new(NoopObserver),
            timeout: ClientConfig::default().timeout(),
        }
    }

    /// Client over a lazily connected gRPC channel.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let service = GrpcCheckService::connect_lazy(config)?;
        Ok(Self::new(Arc::new(service)).with_timeout(config.timeout()))
    }

    /// Client over an eagerly connected gRPC channel; fails if the service
    /// is unreachable.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let service = GrpcCheckService::connect(config).await?;
        Ok(Self::new(Arc::new(service)).with_timeout(config.timeout()))
    }

    /// Sets the observer called after each check and list.
    pub fn with_observer(mut self, observer: Arc<dyn CheckObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Bounds every call; an expired call fails with `DeadlineExceeded`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    // =============================================================================
    // Checks
    // =============================================================================

    /// Checks `rel` on `obj` at the epoch timestamp.
    pub async fn check(&self, ns: &Ns, obj: &Obj, rel: &Rel, user_id: &UserId) -> Result<Decision> {
        self.check_with_timestamp(ns, obj, rel, user_id, &Timestamp::epoch())
            .await
    }

    /// Checks `rel` on `obj` as of `ts`.
    ///
    /// `impossible` is denied without contacting the service. A grant without
    /// a principal is reported as [`NioError::EmptyPrincipal`].
    pub async fn check_with_timestamp(
        &self,
        ns: &Ns,
        obj: &Obj,
        rel: &Rel,
        user_id: &UserId,
        ts: &Timestamp,
    ) -> Result<Decision> {
        if rel.is_impossible() {
            return Ok(Decision::Denied(None));
        }

        let request = proto::CheckRequest {
            ns: ns.to_string(),
            obj: obj.to_string(),
            rel: rel.to_string(),
            user_id: user_id.to_string(),
            ts: ts.to_string(),
        };
        let begin = Instant::now();
        let response = self.bounded(self.service.check(request)).await;
        let elapsed = begin.elapsed();

        let decision = match response {
            Ok(response) => Self::decide(response),
            Err(status) => Err(NioError::transport(
                "check",
                format!("{ns},{obj},{rel},{user_id},{ts}"),
                status,
            )),
        };

        notify(|| {
            self.observer.observe_check(&CheckObservation {
                ns,
                obj,
                rel,
                user_id,
                elapsed,
                ok: decision.as_ref().is_ok_and(Decision::is_allowed),
                is_error: decision.is_err(),
            });
        });
        debug!(%ns, %obj, %rel, %ts, ?elapsed, "check completed");

        decision
    }

    fn decide(response: proto::CheckResponse) -> Result<Decision> {
        let principal = response
            .principal
            .map(|p| p.id)
            .filter(|id| !id.is_empty())
            .map(Principal::new);
        match (response.ok, principal) {
            (true, Some(principal)) => Ok(Decision::Allowed(principal)),
            (true, None) => Err(NioError::EmptyPrincipal),
            (false, principal) => Ok(Decision::Denied(principal)),
        }
    }

    // =============================================================================
    // Listing
    // =============================================================================

    /// Lists the objects in `ns` on which `user_id` holds `rel`, at the epoch timestamp.
    pub async fn list(&self, ns: &Ns, rel: &Rel, user_id: &UserId) -> Result<Vec<Obj>> {
        let request = proto::ListRequest {
            ns: ns.to_string(),
            rel: rel.to_string(),
            user_id: user_id.to_string(),
            ts: Timestamp::epoch().into_inner(),
        };
        let begin = Instant::now();
        let response = self.bounded(self.service.list(request)).await;
        let elapsed = begin.elapsed();

        notify(|| {
            self.observer.observe_list(&ListObservation {
                ns,
                rel,
                user_id,
                elapsed,
                is_error: response.is_err(),
            });
        });

        let response = response.map_err(|status| {
            NioError::transport("list", format!("{ns},{rel},{user_id}"), status)
        })?;
        Ok(response.objs.into_iter().map(Obj::new).collect())
    }

    // =============================================================================
    // Tuple Management
    // =============================================================================

    /// Adds `user_id` as holder of `rel` on `obj`.
    pub async fn add_one_user_id(&self, ns: &Ns, obj: &Obj, rel: &Rel, user_id: &UserId) -> Result<()> {
        let tuple = Tuple {
            ns: ns.clone(),
            obj: obj.clone(),
            rel: rel.clone(),
            user: TupleUser::UserId(user_id.clone()),
        };
        self.add_one("add_one_user_id", &tuple).await
    }

    /// Adds everyone in `user_set` as holder of `rel` on `obj`.
    pub async fn add_one_user_set(&self, ns: &Ns, obj: &Obj, rel: &Rel, user_set: &UserSet) -> Result<()> {
        let tuple = Tuple {
            ns: ns.clone(),
            obj: obj.clone(),
            rel: rel.clone(),
            user: TupleUser::UserSet(user_set.clone()),
        };
        self.add_one("add_one_user_set", &tuple).await
    }

    /// Makes `obj` inherit relations from `parent_obj` via the `parent` relation.
    pub async fn add_parent(&self, ns: &Ns, obj: &Obj, parent_ns: &Ns, parent_obj: &Obj) -> Result<()> {
        let user_set = UserSet {
            ns: parent_ns.clone(),
            obj: parent_obj.clone(),
            rel: Rel::unspecified(),
        };
        self.add_one_user_set(ns, obj, &Rel::parent(), &user_set).await
    }

    async fn add_one(&self, op: &'static str, tuple: &Tuple) -> Result<()> {
        debug!(%tuple, "{}", op);
        let request = proto::WriteRequest {
            add_tuples: vec![proto::Tuple::from(tuple)],
        };
        self.bounded(self.service.write(request))
            .await
            .map_err(|status| NioError::transport(op, tuple.to_string(), status))?;
        Ok(())
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = std::result::Result<T, Status>>,
    ) -> std::result::Result<T, Status> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(Status::deadline_exceeded(format!(
                "no response within {}ms",
                self.timeout.as_millis()
            ))),
        }
    }
}
