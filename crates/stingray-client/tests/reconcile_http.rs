use std::time::Duration;

use assert_json_diff::assert_json_eq;
use serde_json::{Value, json};
use stingray_client::HttpTransport;
use stingray_config::ConnectionConfig;
use stingray_core::{
    Action, NodeAttributes, NodeMode, NodeState, PoolEndpoint, PoolOperation, PoolProperties,
    PoolState, ReconcileError, Reconciler,
};
use url::Url;
use wiremock::matchers::{basic_auth, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const POOL_PATH: &str = "/api/tm/3.0/config/active/pools/web";

fn conn(timeout_secs: u64) -> ConnectionConfig {
    ConnectionConfig {
        server: "127.0.0.1".into(),
        user: "admin".into(),
        password: "secret".into(),
        timeout_secs,
        ..ConnectionConfig::default()
    }
}

fn reconciler(server: &MockServer) -> Reconciler<HttpTransport> {
    reconciler_with_timeout(server, 3)
}

fn reconciler_with_timeout(server: &MockServer, timeout_secs: u64) -> Reconciler<HttpTransport> {
    let transport = HttpTransport::new(&conn(timeout_secs)).unwrap();
    let base = Url::parse(&server.uri()).unwrap();
    Reconciler::new(transport, PoolEndpoint::from_base_url(base, "3.0"))
}

fn web_pool() -> Value {
    json!({
        "properties": {
            "basic": {
                "note": "old",
                "nodes_table": [
                    {"node": "n0:80", "state": "active", "weight": 1, "priority": 1},
                    {"node": "n1:80", "state": "active", "weight": 1, "priority": 1}
                ]
            },
            "load_balancing": {"algorithm": "round_robin"}
        }
    })
}

async fn mount_get(server: &MockServer, status: u16, body: Value) {
    Mock::given(method("GET"))
        .and(path(POOL_PATH))
        .and(basic_auth("admin", "secret"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn pool_note_update_sends_merged_group() {
    let server = MockServer::start().await;
    mount_get(&server, 200, web_pool()).await;

    let mut updated = web_pool();
    updated["properties"]["basic"]["note"] = json!("new");
    let expected_body = json!({"properties": {"basic": updated["properties"]["basic"].clone()}});

    Mock::given(method("PUT"))
        .and(path(POOL_PATH))
        .and(header("content-type", "application/json"))
        .and(body_json(&expected_body))
        .respond_with(ResponseTemplate::new(200).set_body_json(&updated))
        .expect(1)
        .mount(&server)
        .await;

    let desired = PoolProperties::try_from(json!({"basic": {"note": "new"}})).unwrap();
    let outcome = reconciler(&server)
        .reconcile_pool("web", &desired, PoolState::Present, false)
        .await
        .unwrap();

    assert_json_eq!(
        serde_json::to_value(&outcome).unwrap(),
        json!({
            "changed": true,
            "msg": {
                "pool": "web",
                "action": "update_pool",
                "changes": [{"basic.note": {"before": "old", "after": "new"}}]
            },
            "data": updated
        })
    );
}

// For pool presence a 404 means "does not exist yet", not a fatal error.
#[tokio::test]
async fn missing_pool_is_created() {
    let server = MockServer::start().await;
    mount_get(&server, 404, json!({"error_id": "resource.not_found"})).await;

    Mock::given(method("PUT"))
        .and(path(POOL_PATH))
        .and(body_json(json!({"properties": {"basic": {}}})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"properties": {"basic": {"nodes_table": []}}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let outcome = reconciler(&server)
        .reconcile_pool("web", &PoolProperties::new(), PoolState::Present, false)
        .await
        .unwrap();
    assert!(outcome.changed);
    assert_eq!(outcome.record.action, Action::Create);
}

#[tokio::test]
async fn pool_delete_expects_no_content() {
    let server = MockServer::start().await;
    mount_get(&server, 200, web_pool()).await;

    Mock::given(method("DELETE"))
        .and(path(POOL_PATH))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = reconciler(&server)
        .reconcile_pool("web", &PoolProperties::new(), PoolState::Absent, false)
        .await
        .unwrap();
    assert_eq!(outcome.record.action, Action::Destroy);
    assert_eq!(outcome.snapshot, None);
}

#[tokio::test]
async fn unexpected_delete_status_is_rejected() {
    let server = MockServer::start().await;
    mount_get(&server, 200, web_pool()).await;

    Mock::given(method("DELETE"))
        .and(path(POOL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let err = reconciler(&server)
        .reconcile_pool("web", &PoolProperties::new(), PoolState::Absent, false)
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::RemoteRejected { status: 200, .. }));
}

#[tokio::test]
async fn check_mode_sends_only_get() {
    let server = MockServer::start().await;
    mount_get(&server, 200, web_pool()).await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = reconciler(&server)
        .reconcile_node(
            "web",
            "n1:80",
            &NodeAttributes::new(),
            NodeMode::SetState(NodeState::Draining),
            true,
        )
        .await
        .unwrap();
    assert!(outcome.changed);
    assert_json_eq!(
        serde_json::to_value(&outcome.record).unwrap(),
        json!({
            "pool": "web",
            "node": "n1:80",
            "action": "update_node",
            "changes": [{"state": {"before": "active", "after": "draining"}}]
        })
    );
}

#[tokio::test]
async fn node_create_appends_to_table() {
    let server = MockServer::start().await;
    mount_get(&server, 200, web_pool()).await;

    let mut table = web_pool()["properties"]["basic"]["nodes_table"].clone();
    table
        .as_array_mut()
        .unwrap()
        .push(json!({"node": "n2:80", "weight": 3}));
    let expected_body = json!({"properties": {"basic": {"nodes_table": table}}});

    Mock::given(method("PUT"))
        .and(path(POOL_PATH))
        .and(body_json(&expected_body))
        .respond_with(ResponseTemplate::new(200).set_body_json(&expected_body))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = reconciler(&server)
        .reconcile_node(
            "web",
            "n2:80",
            &NodeAttributes::new().with_weight(3),
            NodeMode::Present,
            false,
        )
        .await
        .unwrap();
    assert_eq!(outcome.record.action, Action::Create);
}

#[tokio::test]
async fn node_on_missing_pool_fails() {
    let server = MockServer::start().await;
    mount_get(&server, 404, json!({"error_id": "resource.not_found"})).await;

    let err = reconciler(&server)
        .reconcile_node("web", "n1:80", &NodeAttributes::new(), NodeMode::Absent, false)
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::ResourceNotFound { .. }));
    assert!(err.to_string().contains("node n1:80 in pool web"));
}

#[tokio::test]
async fn error_id_body_is_remote_error() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        403,
        json!({"error_id": "auth.denied", "error_text": "permission denied"}),
    )
    .await;

    let err = reconciler(&server)
        .run_pool_operation("web", &PoolOperation::Show, false)
        .await
        .unwrap_err();
    match err {
        ReconcileError::RemoteError {
            error_id,
            error_text,
            ..
        } => {
            assert_eq!(error_id, "auth.denied");
            assert_eq!(error_text, "permission denied");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(POOL_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(web_pool())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = reconciler_with_timeout(&server, 1)
        .run_pool_operation("web", &PoolOperation::Show, false)
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::Transport { .. }));
    let message = err.to_string();
    assert!(message.contains("timed out"), "{message}");
    assert!(message.contains(POOL_PATH), "{message}");
}
