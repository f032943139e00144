//! Client for a Zanzibar-style relation-based authorization check service
//!
//! This crate talks to a remote check service that owns all relationship
//! tuples and decides every authorization question. It provides:
//! - Typed identifiers for namespaces, objects, relations, users and principals
//! - Checks, optionally pinned to a consistency timestamp
//! - Listing of objects a user holds a relation on
//! - Add-only tuple writes, including parent inheritance edges
//! - Instrumentation hooks for latency and outcome metrics
//!
//! # Core Concepts
//!
//! - **Tuple**: `user` has `rel` on `obj` in `ns`, where `user` is a concrete
//!   user id or a user set
//! - **Principal**: the subject the service names as the grantor, which may
//!   differ from the asking user (e.g. through group membership)
//! - **Timestamp**: consistency token; [`Timestamp::epoch`] asks for the
//!   weakest consistency
//!
//! # Example
//!
//! ```rust,no_run
//! use nio_client::{CheckClient, ClientConfig, Decision, Ns, Obj, Rel, UserId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CheckClient::from_config(&ClientConfig::from_env()?)?;
//!
//!     let decision = client
//!         .check(
//!             &Ns::new("article"),
//!             &Obj::new("42"),
//!             &Rel::new("article.get"),
//!             &UserId::new("session-token"),
//!         )
//!         .await?;
//!
//!     if let Decision::Allowed(principal) = decision {
//!         println!("granted via {principal}");
//!     }
//!     Ok(())
//! }
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::indexing_slicing))]

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod observer;
pub mod proto;
pub mod transport;

pub use client::*;
pub use config::*;
pub use error::*;
pub use models::*;
pub use observer::*;
pub use transport::{CheckService, GrpcCheckService};
