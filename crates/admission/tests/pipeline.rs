use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use gatehouse_admission::{AdmissionError, AdmissionPipeline, Rejection};
use gatehouse_rate_limit::{LimitConfig, LimitConfigError, LimitType};
use gatehouse_rbac::{
    Authorizer, ChannelAuditSink, Identity, InMemoryRepository, NewRole, NewUser, Operation,
    RoleStore, Rule, Scope, UserStore, ALL,
};

async fn viewer(repo: &InMemoryRepository) -> Identity {
    let user = repo
        .create_user(NewUser {
            name: "vera".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    let role = repo
        .create_role(NewRole {
            name: "cluster-view".into(),
            scope: Scope::Cluster,
            namespace: String::new(),
            rules: vec![Rule::new(ALL, Operation::View)],
        })
        .await
        .unwrap();
    repo.bind_user(role.id, user.id).await.unwrap();
    Identity::new(user.id, user.name)
}

fn pipeline(
    repo: Arc<InMemoryRepository>,
    limits: &[LimitConfig],
) -> (AdmissionPipeline, ChannelAuditSink) {
    let audit = ChannelAuditSink::default();
    let authorizer = Arc::new(Authorizer::new(repo, Arc::new(audit.clone())));
    let pipeline = AdmissionPipeline::new(limits, ["api"], authorizer).unwrap();
    (pipeline, audit)
}

#[tokio::test]
async fn allowed_request_returns_its_classification() {
    let repo = Arc::new(InMemoryRepository::new());
    let caller = viewer(&repo).await;
    let (pipeline, _) = pipeline(repo, &[]);

    let info = pipeline
        .admit("GET", "/api/v1/users/7", "10.0.0.1", Some(&caller))
        .await
        .unwrap();
    assert_eq!(info.resource, "users");
    assert_eq!(info.name, "7");
    assert_eq!(info.verb, "get");
}

#[tokio::test]
async fn authenticated_denial_is_forbidden() {
    let repo = Arc::new(InMemoryRepository::new());
    let caller = viewer(&repo).await;
    let (pipeline, _) = pipeline(repo, &[]);

    let rejection = pipeline
        .admit("DELETE", "/api/v1/namespaces/teamA/posts/3", "10.0.0.1", Some(&caller))
        .await
        .unwrap_err();
    assert_eq!(
        rejection,
        Rejection::Forbidden {
            user: "vera".into(),
            verb: "delete".into(),
            resource: "posts".into(),
            namespace: "teamA".into(),
        }
    );
}

#[tokio::test]
async fn missing_or_anonymous_caller_is_unauthenticated() {
    let repo = Arc::new(InMemoryRepository::new());
    let (pipeline, _) = pipeline(repo, &[]);

    let rejection = pipeline
        .admit("GET", "/api/v1/users", "10.0.0.1", None)
        .await
        .unwrap_err();
    assert_eq!(rejection, Rejection::Unauthenticated);

    let anonymous = Identity::default();
    let rejection = pipeline
        .admit("GET", "/api/v1/users", "10.0.0.1", Some(&anonymous))
        .await
        .unwrap_err();
    assert_eq!(rejection, Rejection::Unauthenticated);
}

#[tokio::test]
async fn non_resource_requests_skip_authorization() {
    let repo = Arc::new(InMemoryRepository::new());
    let (pipeline, audit) = pipeline(repo, &[]);
    let mut events = audit.subscribe();

    let info = pipeline.admit("GET", "/healthz", "10.0.0.1", None).await.unwrap();
    assert!(!info.is_resource_request);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn throttling_happens_before_classification_and_authorization() {
    let repo = Arc::new(InMemoryRepository::new());
    let caller = viewer(&repo).await;
    let (pipeline, audit) = pipeline(repo, &[LimitConfig::new(LimitType::Ip, 1, 1)]);
    let mut events = audit.subscribe();

    assert!(pipeline
        .admit("GET", "/api/v1/users", "10.0.0.1", Some(&caller))
        .await
        .is_ok());
    assert!(events.try_recv().unwrap().allowed);

    let rejection = pipeline
        .admit("GET", "/api/v1/users", "10.0.0.1", Some(&caller))
        .await
        .unwrap_err();
    assert_eq!(
        rejection,
        Rejection::TooManyRequests {
            key: "10.0.0.1".into(),
            limit_type: LimitType::Ip,
        }
    );
    assert!(events.try_recv().is_err());

    assert!(pipeline
        .admit("GET", "/api/v1/users", "10.0.0.2", Some(&caller))
        .await
        .is_ok());
}

#[tokio::test]
async fn caller_is_not_resolved_for_throttled_or_platform_requests() {
    let repo = Arc::new(InMemoryRepository::new());
    let caller = viewer(&repo).await;
    let (pipeline, _) = pipeline(repo, &[LimitConfig::new(LimitType::Server, 1, 1)]);
    let lookups = AtomicUsize::new(0);
    let (lookups_ref, caller_ref) = (&lookups, &caller);
    let resolve = move || async move {
        lookups_ref.fetch_add(1, Ordering::SeqCst);
        Ok::<_, Rejection>(Some(caller_ref.clone()))
    };

    let admitted = pipeline
        .admit_with("GET", "/healthz", "10.0.0.1", resolve)
        .await
        .unwrap();
    assert!(admitted.caller.is_none());

    let rejection = pipeline
        .admit_with("GET", "/api/v1/users", "10.0.0.1", resolve)
        .await
        .unwrap_err();
    assert!(matches!(rejection, Rejection::TooManyRequests { .. }));
    assert_eq!(lookups.load(Ordering::SeqCst), 0);
}

#[test]
fn invalid_limit_prevents_construction() {
    let repo = Arc::new(InMemoryRepository::new());
    let authorizer = Arc::new(Authorizer::with_tracing_audit(repo));
    let err = AdmissionPipeline::new(
        &[LimitConfig::new(LimitType::Server, 10, 5)],
        ["api"],
        authorizer,
    )
    .err()
    .unwrap();
    assert!(matches!(
        err,
        AdmissionError::Limit(LimitConfigError::QpsExceedsBurst { qps: 10, burst: 5 })
    ));
}
