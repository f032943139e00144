//! HTTP authorization layer on top of [`nio_client`].
//!
//! Handlers are wrapped with [`wrap`], which resolves the resource a request
//! targets, authenticates the caller from the session cookie and checks the
//! required relation before the handler runs. Handlers receive a [`User`]
//! bound to the checked object for any further checks they need.
//!
//! ```rust,ignore
//! let gateway = Gateway::new(client, GatewayConfig::default());
//! let app = Router::new().route(
//!     "/articles/:id",
//!     get(wrap::<ArticleResource, _, _>(gateway.clone(), show_article)),
//! );
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing))]

pub mod config;
pub mod error;
pub mod observe;
pub mod problem;
pub mod resource;
pub mod user;
pub mod wrap;

pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use observe::{observe, Observation, RequestInfo};
pub use problem::{map_error, HandlerError, NotFound, Problem};
pub use resource::{Extract, Extracted, Requirement, Resource};
pub use user::{ContractViolation, PinnedCheck, RelTarget, RelationCheck, User};
pub use wrap::{wrap, Gateway, WrappedFuture};
