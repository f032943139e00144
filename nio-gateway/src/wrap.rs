//! Authorization wrapper for axum handlers.
//!
//! Every wrapped request goes through the same steps: extract the resource,
//! resolve the required relation, authenticate from the session cookie,
//! apply an optional consistency timestamp, check, then dispatch.

use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use nio_client::{CheckClient, Decision, Principal, Timestamp, UserId};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::debug;

use crate::config::GatewayConfig;
use crate::observe::{observe, RequestInfo};
use crate::problem::{map_error, HandlerError, NotFound};
use crate::resource::{Extract, Extracted, Requirement, Resource};
use crate::user::{PinnedCheck, RelationCheck, User};

/// Future returned by wrapped handlers.
pub type WrappedFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Shared state of the authorization wrapper.
#[derive(Debug, Clone)]
pub struct Gateway {
    client: Arc<CheckClient>,
    config: Arc<GatewayConfig>,
}

impl Gateway {
    pub fn new(client: Arc<CheckClient>, config: GatewayConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn prefix(&self) -> &str {
        &self.config.prefix
    }

    fn checker(&self, ts: Timestamp) -> Arc<dyn RelationCheck> {
        Arc::new(PinnedCheck::new(self.client.clone(), ts))
    }
}

/// Wraps `handler` so it only runs for authorized requests.
///
/// The handler receives the request, the extracted resource and the
/// resolved [`User`]. The result can be mounted directly on an axum route:
///
/// ```rust,ignore
/// Router::new().route("/articles/:id", get(wrap::<ArticleResource, _, _>(gateway, get_article)))
/// ```
pub fn wrap<R, H, Fut>(
    gateway: Gateway,
    handler: H,
) -> impl Fn(Request) -> WrappedFuture + Clone + Send + Sync + 'static
where
    R: Extract,
    H: Fn(Request, R, User) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, HandlerError>> + Send + 'static,
{
    move |request: Request| {
        let gateway = gateway.clone();
        let handler = handler.clone();
        Box::pin(authorize::<R, H, Fut>(gateway, handler, request))
    }
}

async fn authorize<R, H, Fut>(gateway: Gateway, handler: H, request: Request) -> Response
where
    R: Extract,
    H: Fn(Request, R, User) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, HandlerError>> + Send + 'static,
{
    let (mut parts, body) = request.into_parts();
    let info = RequestInfo::from_parts(&parts);

    let resource = match R::extract(&mut parts).await {
        Ok(Extracted::Resource(resource)) => resource,
        Ok(Extracted::Handled(response)) => return response,
        Err(err) => {
            debug!(method = %info.method, uri = %info.uri, error = %format!("{err:#}"), "extract failed");
            let (response, _) = map_error(NotFound::from(err).into());
            return response;
        }
    };

    let requirement = resource.requires(&parts.method);
    debug!(
        ns = %requirement.ns,
        obj = %requirement.obj,
        rel = %requirement.rel,
        uri = %info.uri,
        "requires"
    );

    let jar = CookieJar::from_headers(&parts.headers);
    let config = gateway.config();

    let Some(token) = jar
        .get(&config.session_cookie)
        .map(|cookie| UserId::new(cookie.value()))
    else {
        if resource.is_public() {
            debug!(method = %info.method, uri = %info.uri, "no session cookie but public resource");
            let user = User::new(
                requirement.ns,
                requirement.obj,
                Principal::anonymous(),
                gateway.checker(Timestamp::epoch()),
            );
            let request = Request::from_parts(parts, body);
            return observe(info, handler(request, resource, user)).await;
        }
        return Redirect::to(&config.signin_uri(&info.uri)).into_response();
    };

    let ts = jar
        .get(&config.check_ts_cookie)
        .map_or_else(Timestamp::epoch, |cookie| Timestamp::from_hint(cookie.value()));
    debug!(%ts, "check timestamp");
    let checker = gateway.checker(ts);

    let request = Request::from_parts(parts, body);
    observe(
        info,
        check_and_dispatch(checker, token, requirement, resource, request, handler),
    )
    .await
}

async fn check_and_dispatch<R, H, Fut>(
    checker: Arc<dyn RelationCheck>,
    token: UserId,
    requirement: Requirement,
    resource: R,
    request: Request,
    handler: H,
) -> Result<Response, HandlerError>
where
    R: Resource,
    H: Fn(Request, R, User) -> Fut,
    Fut: Future<Output = Result<Response, HandlerError>>,
{
    let decision = checker
        .check(&requirement.ns, &requirement.obj, &requirement.rel, &token)
        .await
        .map_err(|e| anyhow::Error::new(e).context("check"))?;

    let principal = match decision {
        Decision::Allowed(principal) => principal,
        Decision::Denied(_) => return Ok((StatusCode::FORBIDDEN, "Forbidden").into_response()),
    };

    let user = User::new(requirement.ns, requirement.obj, principal, checker);
    handler(request, resource, user).await
}
