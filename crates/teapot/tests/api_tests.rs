//! API integration tests.

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::{Value, json};
use std::sync::Arc;
use teapot::fleet::{Action, FleetClient, FleetConfig};
use tower::ServiceExt;

mod common;
use common::{
    FakeFleet, FleetCall, TEST_SECRET, test_app, test_app_with_auth, test_app_with_fleet,
};

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let mut builder = Request::builder().uri(uri).method(method);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_string(&json).unwrap())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app(FakeFleet::new());

    let response = send(app, Method::GET, "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_create_workstation() {
    let fleet = FakeFleet::new();
    let app = test_app(fleet.clone());

    let response = send(
        app,
        Method::POST,
        "/workstations",
        Some(json!({
            "name": "w1",
            "docker_image": "docker:///debian#wheezy",
            "cpu_weight": 10,
            "memory_mb": 512
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(body_bytes(response).await.is_empty());

    let created = fleet.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].process_guid, "w1");
    assert_eq!(created[0].cpu_weight, 10);
    assert_eq!(created[0].memory_mb, 512);
}

#[tokio::test]
async fn test_create_defaults_image() {
    let fleet = FakeFleet::new();
    let app = test_app(fleet.clone());

    let response = send(
        app,
        Method::POST,
        "/workstations",
        Some(json!({"name": "w1"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(fleet.created()[0].root_fs, "docker:///ubuntu#trusty");
}

#[tokio::test]
async fn test_create_invalid_lists_every_field() {
    let fleet = FakeFleet::new();
    let app = test_app(fleet.clone());

    let response = send(
        app,
        Method::POST,
        "/workstations",
        Some(json!({"name": "not valid", "docker_image": "ubuntu"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["name"], "InvalidWorkstation");
    let message = json["message"].as_str().unwrap();
    assert!(message.contains("name"));
    assert!(message.contains("docker_image"));
    assert!(fleet.calls().is_empty());
}

#[tokio::test]
async fn test_create_malformed_json() {
    let app = test_app(FakeFleet::new());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/workstations")
                .method(Method::POST)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["name"], "InvalidJSON");
}

#[tokio::test]
async fn test_create_accepts_body_without_content_type() {
    let fleet = FakeFleet::new();
    let app = test_app(fleet.clone());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/workstations")
                .method(Method::POST)
                .body(Body::from(r#"{"name":"w1","docker_image":"docker:///debian#wheezy"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(fleet.created().len(), 1);
    assert_eq!(fleet.created()[0].process_guid, "w1");
}

#[tokio::test]
async fn test_create_duplicate_skips_submission() {
    let fleet = FakeFleet::new();
    fleet.add_desired("w1", "docker:///debian#wheezy");
    let app = test_app(fleet.clone());

    let response = send(
        app,
        Method::POST,
        "/workstations",
        Some(json!({"name": "w1", "docker_image": "docker:///debian#wheezy"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["name"], "DuplicateWorkstation");
    assert_eq!(json["message"], "Unique constraint failed for: name");
    assert_eq!(
        fleet.calls(),
        vec![FleetCall::GetDesired("w1".to_string())]
    );
}

#[tokio::test]
async fn test_create_upstream_failure() {
    let fleet = FakeFleet::new();
    fleet.fail_with("UnknownError", "scheduler unavailable");
    let app = test_app(fleet);

    let response = send(
        app,
        Method::POST,
        "/workstations",
        Some(json!({"name": "w1"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["name"], "UpstreamError");
    assert_eq!(json["message"], "UnknownError: scheduler unavailable");
}

#[tokio::test]
async fn test_list_joins_actual_state() {
    let fleet = FakeFleet::new();
    fleet.add_desired("w1", "docker:///debian#wheezy");
    fleet.add_desired("w2", "docker:///ubuntu#trusty");
    fleet.add_actual("w2", "RUNNING", "10.0.0.2", 61000);
    let app = test_app(fleet);

    let response = send(app, Method::GET, "/workstations", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!([
            {"name": "w1", "docker_image": "docker:///debian#wheezy", "state": "STOPPED"},
            {"name": "w2", "docker_image": "docker:///ubuntu#trusty", "state": "RUNNING"}
        ])
    );
}

#[tokio::test]
async fn test_unreachable_fleet_hides_scheduler_url() {
    let fleet = FleetClient::new(&FleetConfig {
        url: "http://127.0.0.1:1".to_string(),
        timeout_secs: 2,
    })
    .unwrap();
    let app = test_app_with_fleet(Arc::new(fleet));

    let response = send(app, Method::GET, "/workstations", None).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["name"], "UpstreamError");
    let message = json["message"].as_str().unwrap();
    assert!(message.starts_with("fleet request failed"));
    assert!(!message.contains("127.0.0.1"));
    assert!(!message.contains("actual_lrps"));
}

#[tokio::test]
async fn test_list_empty() {
    let app = test_app(FakeFleet::new());

    let response = send(app, Method::GET, "/workstations", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_delete_missing_is_not_found() {
    let fleet = FakeFleet::new();
    let app = test_app(fleet.clone());

    let response = send(app, Method::DELETE, "/workstations/ghost", None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["name"], "WorkstationNotFound");
    assert_eq!(json["message"], "Workstation with name 'ghost' not found");
    assert_eq!(
        fleet.calls(),
        vec![FleetCall::DeleteDesired("ghost".to_string())]
    );
}

#[tokio::test]
async fn test_create_list_delete_scenario() {
    let fleet = FakeFleet::new();
    let app = test_app(fleet.clone());

    let response = send(
        app.clone(),
        Method::POST,
        "/workstations",
        Some(json!({"name": "w1", "docker_image": "docker:///debian#wheezy"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = fleet.created();
    assert_eq!(created.len(), 1);
    let setup = created[0].setup.as_ref().unwrap().flatten();
    assert!(
        setup
            .iter()
            .any(|a| matches!(a, Action::Download(d) if d.cache_key == "tea"))
    );
    let run = created[0].action.flatten();
    let run_paths = run
        .iter()
        .filter_map(|a| match a {
            Action::Run(run) => Some(run.path.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(run_paths, vec!["/bin/bash", "/tmp/tea"]);
    assert!(run.iter().any(|a| matches!(
        a,
        Action::Run(r) if r.args == vec!["-secret".to_string(), TEST_SECRET.to_string()]
    )));

    let response = send(app.clone(), Method::GET, "/workstations", None).await;
    let json = body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["name"], "w1");
    assert_eq!(json[0]["state"], "STOPPED");

    let response = send(app, Method::DELETE, "/workstations/w1", None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        fleet.count(|call| matches!(call, FleetCall::DeleteDesired(name) if name == "w1")),
        1
    );
}

#[tokio::test]
async fn test_add_key_unreachable_agent_is_upstream_error() {
    let fleet = FakeFleet::new();
    fleet.add_desired("w1", "docker:///debian#wheezy");
    let app = test_app(fleet);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/workstations/w1/add-key")
                .method(Method::POST)
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("ssh-rsa AAAA test@example"))
                .unwrap(),
        )
        .await
        .unwrap();

    // ssh-w1.apps.example.com does not resolve in tests.
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["name"], "UpstreamError");
}

#[tokio::test]
async fn test_basic_auth_required_when_configured() {
    let fleet = FakeFleet::new();
    let app = test_app_with_auth(fleet.clone(), "admin", "hunter2");

    let response = send(app.clone(), Method::GET, "/workstations", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    assert_eq!(body_json(response).await["name"], "Unauthorized");
    assert!(fleet.calls().is_empty());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/workstations")
                .method(Method::GET)
                .header(
                    header::AUTHORIZATION,
                    format!("Basic {}", STANDARD.encode("admin:hunter2")),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(app, Method::GET, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}
