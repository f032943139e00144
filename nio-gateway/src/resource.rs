use async_trait::async_trait;
use axum::http::{request::Parts, Method};
use axum::response::Response;
use nio_client::{Ns, Obj, Rel};

/// The relation a request must hold on an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub ns: Ns,
    pub obj: Obj,
    pub rel: Rel,
}

impl Requirement {
    pub fn new(ns: impl Into<Ns>, obj: impl Into<Obj>, rel: impl Into<Rel>) -> Self {
        Self {
            ns: ns.into(),
            obj: obj.into(),
            rel: rel.into(),
        }
    }

    /// Requirement that is never met, for methods a resource does not support.
    pub fn impossible(ns: impl Into<Ns>, obj: impl Into<Obj>) -> Self {
        Self::new(ns, obj, Rel::impossible())
    }
}

/// A web-facing entity guarded by the gateway.
///
/// Implementations map every HTTP method to a requirement and map methods
/// they do not support to [`Requirement::impossible`].
pub trait Resource: Send + Sync + 'static {
    fn requires(&self, method: &Method) -> Requirement;

    /// Public resources are served to callers without a session, as the
    /// anonymous principal and without a check.
    fn is_public(&self) -> bool {
        false
    }
}

/// Result of resource extraction.
pub enum Extracted<R> {
    Resource(R),
    /// The extractor already produced the response.
    Handled(Response),
}

/// Builds a resource from the request, typically from path parameters.
///
/// An error is answered with 404.
#[async_trait]
pub trait Extract: Resource + Sized {
    async fn extract(parts: &mut Parts) -> anyhow::Result<Extracted<Self>>;
}
