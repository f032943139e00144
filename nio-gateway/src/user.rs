//! Per-request identity handed to downstream handlers.

use async_trait::async_trait;
use nio_client::{CheckClient, Decision, NioError, Ns, Obj, Principal, Rel, Timestamp, UserId};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Check and list operations a [`User`] is built with.
#[async_trait]
pub trait RelationCheck: Send + Sync {
    async fn check(&self, ns: &Ns, obj: &Obj, rel: &Rel, user_id: &UserId) -> Result<Decision, NioError>;

    async fn list(&self, ns: &Ns, rel: &Rel, user_id: &UserId) -> Result<Vec<Obj>, NioError>;
}

/// Checks pinned to one consistency timestamp. Lists always run at epoch.
#[derive(Debug, Clone)]
pub struct PinnedCheck {
    client: Arc<CheckClient>,
    ts: Timestamp,
}

impl PinnedCheck {
    pub fn new(client: Arc<CheckClient>, ts: Timestamp) -> Self {
        Self { client, ts }
    }
}

#[async_trait]
impl RelationCheck for PinnedCheck {
    async fn check(&self, ns: &Ns, obj: &Obj, rel: &Rel, user_id: &UserId) -> Result<Decision, NioError> {
        self.client
            .check_with_timestamp(ns, obj, rel, user_id, &self.ts)
            .await
    }

    async fn list(&self, ns: &Ns, rel: &Rel, user_id: &UserId) -> Result<Vec<Obj>, NioError> {
        self.client.list(ns, rel, user_id).await
    }
}

/// Raised when string arguments cannot form a relation target.
///
/// This is a programming error in the caller and is never rendered as an
/// HTTP response.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("has_rel requires 1 to 3 arguments, got {0}")]
pub struct ContractViolation(pub usize);

/// What [`User::has_rel`] checks. Missing parts come from the user's binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelTarget {
    Rel(Rel),
    ObjRel(Obj, Rel),
    Full(Ns, Obj, Rel),
}

impl RelTarget {
    /// Builds a target from `[rel]`, `[obj, rel]` or `[ns, obj, rel]`.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self, ContractViolation> {
        match args {
            [rel] => Ok(Self::Rel(Rel::new(rel.as_ref()))),
            [obj, rel] => Ok(Self::ObjRel(Obj::new(obj.as_ref()), Rel::new(rel.as_ref()))),
            [ns, obj, rel] => Ok(Self::Full(
                Ns::new(ns.as_ref()),
                Obj::new(obj.as_ref()),
                Rel::new(rel.as_ref()),
            )),
            _ => Err(ContractViolation(args.len())),
        }
    }
}

impl From<Rel> for RelTarget {
    fn from(rel: Rel) -> Self {
        Self::Rel(rel)
    }
}

impl From<&str> for RelTarget {
    fn from(rel: &str) -> Self {
        Self::Rel(Rel::new(rel))
    }
}

impl From<(Obj, Rel)> for RelTarget {
    fn from((obj, rel): (Obj, Rel)) -> Self {
        Self::ObjRel(obj, rel)
    }
}

impl From<(Ns, Obj, Rel)> for RelTarget {
    fn from((ns, obj, rel): (Ns, Obj, Rel)) -> Self {
        Self::Full(ns, obj, rel)
    }
}

/// Identity resolved for one request, bound to the object the request targets.
#[derive(Clone)]
pub struct User {
    ns: Ns,
    obj: Obj,
    principal: Principal,
    checker: Arc<dyn RelationCheck>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("ns", &self.ns)
            .field("obj", &self.obj)
            .field("principal", &self.principal)
            .finish_non_exhaustive()
    }
}

impl User {
    pub fn new(ns: Ns, obj: Obj, principal: Principal, checker: Arc<dyn RelationCheck>) -> Self {
        Self {
            ns,
            obj,
            principal,
            checker,
        }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn ns(&self) -> &Ns {
        &self.ns
    }

    pub fn obj(&self) -> &Obj {
        &self.obj
    }

    /// Checks a further relation with this user's principal as the subject.
    pub async fn has_rel(&self, target: impl Into<RelTarget>) -> Result<bool, NioError> {
        let (ns, obj, rel) = match target.into() {
            RelTarget::Rel(rel) => (self.ns.clone(), self.obj.clone(), rel),
            RelTarget::ObjRel(obj, rel) => (self.ns.clone(), obj, rel),
            RelTarget::Full(ns, obj, rel) => (ns, obj, rel),
        };
        debug!(%ns, %obj, %rel, principal = %self.principal, "user check");
        let decision = self
            .checker
            .check(&ns, &obj, &rel, &UserId::from(&self.principal))
            .await?;
        Ok(decision.is_allowed())
    }

    /// Lists objects in `ns` on which this user's principal holds `rel`.
    pub async fn list(&self, ns: &Ns, rel: &Rel) -> Result<Vec<Obj>, NioError> {
        debug!(%ns, %rel, principal = %self.principal, "user list");
        self.checker
            .list(ns, rel, &UserId::from(&self.principal))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        checks: Mutex<Vec<(Ns, Obj, Rel, UserId)>>,
    }

    #[async_trait]
    impl RelationCheck for Recording {
        async fn check(&self, ns: &Ns, obj: &Obj, rel: &Rel, user_id: &UserId) -> Result<Decision, NioError> {
            self.checks
                .lock()
                .unwrap()
                .push((ns.clone(), obj.clone(), rel.clone(), user_id.clone()));
            Ok(Decision::Allowed(Principal::new(user_id.as_str())))
        }

        async fn list(&self, _ns: &Ns, _rel: &Rel, _user_id: &UserId) -> Result<Vec<Obj>, NioError> {
            Ok(vec![Obj::new("1")])
        }
    }

    fn user(checker: Arc<Recording>) -> User {
        User::new(
            Ns::new("article"),
            Obj::new("1"),
            Principal::new("alice"),
            checker,
        )
    }

    #[tokio::test]
    async fn test_single_relation_reuses_binding() {
        let checker = Arc::new(Recording::default());
        assert!(user(checker.clone()).has_rel("article.delete").await.unwrap());

        let checks = checker.checks.lock().unwrap();
        assert_eq!(
            checks[0],
            (
                Ns::new("article"),
                Obj::new("1"),
                Rel::new("article.delete"),
                UserId::new("alice")
            )
        );
    }

    #[tokio::test]
    async fn test_pair_reuses_namespace() {
        let checker = Arc::new(Recording::default());
        user(checker.clone())
            .has_rel((Obj::new("2"), Rel::new("article.get")))
            .await
            .unwrap();

        let checks = checker.checks.lock().unwrap();
        assert_eq!(checks[0].0, Ns::new("article"));
        assert_eq!(checks[0].1, Obj::new("2"));
    }

    #[tokio::test]
    async fn test_triple_overrides_everything() {
        let checker = Arc::new(Recording::default());
        let target = RelTarget::from_args(&["folder", "7", "folder.read"]).unwrap();
        user(checker.clone()).has_rel(target).await.unwrap();

        let checks = checker.checks.lock().unwrap();
        assert_eq!(checks[0].0, Ns::new("folder"));
        assert_eq!(checks[0].1, Obj::new("7"));
        assert_eq!(checks[0].2, Rel::new("folder.read"));
        assert_eq!(checks[0].3, UserId::new("alice"));
    }

    #[test]
    fn test_wrong_argument_count_is_contract_violation() {
        let none: [&str; 0] = [];
        assert_eq!(RelTarget::from_args(&none), Err(ContractViolation(0)));
        assert_eq!(
            RelTarget::from_args(&["a", "b", "c", "d"]),
            Err(ContractViolation(4))
        );
    }

    #[tokio::test]
    async fn test_list_uses_principal() {
        let checker = Arc::new(Recording::default());
        let objs = user(checker)
            .list(&Ns::new("article"), &Rel::new("article.get"))
            .await
            .unwrap();
        assert_eq!(objs, vec![Obj::new("1")]);
    }
}
