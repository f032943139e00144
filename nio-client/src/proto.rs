//! Generated messages and client for `nio.check.v1.CheckService`.
//!
//! Compiled from `proto/check.proto` by the build script.

#![allow(clippy::all, clippy::pedantic)]

use crate::models::{self, TupleUser};

tonic::include_proto!("nio.check.v1");

pub use check_service_client::CheckServiceClient;

impl From<&models::Tuple> for Tuple {
    fn from(tuple: &models::Tuple) -> Self {
        let user = match &tuple.user {
            TupleUser::UserId(user_id) => tuple::User::UserId(user_id.to_string()),
            TupleUser::UserSet(user_set) => tuple::User::UserSet(UserSet {
                ns: user_set.ns.to_string(),
                obj: user_set.obj.to_string(),
                rel: user_set.rel.to_string(),
            }),
        };
        Self {
            ns: tuple.ns.to_string(),
            obj: tuple.obj.to_string(),
            rel: tuple.rel.to_string(),
            user: Some(user),
        }
    }
}
