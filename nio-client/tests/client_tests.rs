//! Integration tests for the check client against a scripted check service

use async_trait::async_trait;
use nio_client::proto::{
    CheckRequest, CheckResponse, ListRequest, ListResponse, WriteRequest, WriteResponse,
};
use nio_client::{
    proto, CheckClient, CheckService, ClientConfig, Decision, NioError, Ns, Obj, Principal, Rel, Timestamp, UserId,
    UserSet,
};
use proptest::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tonic::Status;

/// Check service that answers from a fixed script and records every request.
#[derive(Default)]
struct ScriptedService {
    check_response: Option<CheckResponse>,
    delay: Option<Duration>,
    checks: Mutex<Vec<CheckRequest>>,
    writes: Mutex<Vec<WriteRequest>>,
}

impl ScriptedService {
    fn granting(principal: &str) -> Self {
        Self {
            check_response: Some(CheckResponse {
                ok: true,
                principal: Some(proto::Principal {
                    id: principal.to_string(),
                }),
            }),
            ..Self::default()
        }
    }

    fn check_count(&self) -> usize {
        self.checks.lock().unwrap().len()
    }
}

#[async_trait]
impl CheckService for ScriptedService {
    async fn check(&self, request: CheckRequest) -> Result<CheckResponse, Status> {
        self.checks.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.check_response
            .clone()
            .ok_or_else(|| Status::unavailable("no scripted response"))
    }

    async fn list(&self, _request: ListRequest) -> Result<ListResponse, Status> {
        Ok(ListResponse { objs: Vec::new() })
    }

    async fn write(&self, request: WriteRequest) -> Result<WriteResponse, Status> {
        self.writes.lock().unwrap().push(request);
        Ok(WriteResponse {})
    }
}

#[tokio::test]
async fn test_check_with_timestamp_forwards_timestamp() {
    let service = Arc::new(ScriptedService::granting("alice"));
    let client = CheckClient::new(service.clone());

    let decision = client
        .check_with_timestamp(
            &Ns::new("article"),
            &Obj::new("7"),
            &Rel::new("article.update"),
            &UserId::new("token"),
            &Timestamp::new("3:0000000000123"),
        )
        .await
        .unwrap();

    assert_eq!(decision, Decision::Allowed(Principal::new("alice")));
    let checks = service.checks.lock().unwrap();
    assert_eq!(checks.len(), 1);
    assert_eq!(checks[0].ts, "3:0000000000123");
    assert_eq!(checks[0].rel, "article.update");
}

#[tokio::test]
async fn test_empty_principal_id_counts_as_missing() {
    let service = Arc::new(ScriptedService {
        check_response: Some(CheckResponse {
            ok: true,
            principal: Some(proto::Principal { id: String::new() }),
        }),
        ..ScriptedService::default()
    });
    let client = CheckClient::new(service);

    let result = client
        .check(
            &Ns::new("article"),
            &Obj::new("7"),
            &Rel::new("article.get"),
            &UserId::new("token"),
        )
        .await;

    assert!(matches!(result, Err(NioError::EmptyPrincipal)));
}

#[tokio::test]
async fn test_slow_service_surfaces_deadline_exceeded() {
    let service = Arc::new(ScriptedService {
        delay: Some(Duration::from_millis(500)),
        ..ScriptedService::granting("alice")
    });
    let client = CheckClient::new(service).with_timeout(Duration::from_millis(20));

    let err = client
        .check(
            &Ns::new("article"),
            &Obj::new("7"),
            &Rel::new("article.get"),
            &UserId::new("token"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), Some(tonic::Code::DeadlineExceeded));
}

#[tokio::test]
async fn test_add_one_user_set_writes_exactly_one_tuple() {
    let service = Arc::new(ScriptedService::default());
    let client = CheckClient::new(service.clone());

    client
        .add_one_user_set(
            &Ns::new("article"),
            &Obj::new("7"),
            &Rel::new("viewer"),
            &UserSet::new("group", "editors", "member"),
        )
        .await
        .unwrap();

    let writes = service.writes.lock().unwrap();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].add_tuples.len(), 1);
    assert_eq!(
        writes[0].add_tuples[0].user,
        Some(proto::tuple::User::UserSet(proto::UserSet {
            ns: "group".into(),
            obj: "editors".into(),
            rel: "member".into(),
        }))
    );
}

#[tokio::test]
async fn test_client_is_shared_across_tasks() {
    let service = Arc::new(ScriptedService::granting("alice"));
    let client = Arc::new(CheckClient::new(service.clone()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .check(
                        &Ns::new("article"),
                        &Obj::new(i.to_string()),
                        &Rel::new("article.get"),
                        &UserId::new("token"),
                    )
                    .await
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().unwrap().is_allowed());
    }

    assert_eq!(service.check_count(), 8);
}

#[tokio::test]
async fn test_eager_connect_fails_for_unreachable_service() {
    let config = ClientConfig {
        endpoint: "http://127.0.0.1:1".to_string(),
        timeout_ms: 200,
    };

    let result = CheckClient::connect(&config).await;

    assert!(matches!(result, Err(NioError::Connect(_))));
}

#[tokio::test]
async fn test_invalid_endpoint_is_a_configuration_error() {
    let config = ClientConfig {
        endpoint: "not a uri".to_string(),
        ..ClientConfig::default()
    };

    assert!(matches!(
        CheckClient::connect(&config).await,
        Err(NioError::Configuration(_))
    ));
    assert!(matches!(
        CheckClient::from_config(&config),
        Err(NioError::Configuration(_))
    ));
}

proptest! {
    #[test]
    fn impossible_is_denied_without_rpc(
        ns in "[a-z]{1,12}",
        obj in "[a-z0-9]{1,12}",
        user in "[a-zA-Z0-9-]{1,24}",
        ts in "[0-9]:[0-9]{13}",
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let service = Arc::new(ScriptedService::granting("alice"));
        let client = CheckClient::new(service.clone());

        let decision = runtime.block_on(client.check_with_timestamp(
            &Ns::new(ns),
            &Obj::new(obj),
            &Rel::impossible(),
            &UserId::new(user),
            &Timestamp::new(ts),
        ));

        prop_assert_eq!(decision.unwrap(), Decision::Denied(None));
        prop_assert_eq!(service.check_count(), 0);
    }
}
