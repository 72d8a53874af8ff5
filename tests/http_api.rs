use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use confhub::api::routes::create_router;
use confhub::logic::ReleaseOrchestrator;
use confhub::model::Release;
use confhub::notify::RecordingEmitter;
use confhub::store::memory::MemoryStore;
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let store = Arc::new(MemoryStore::new());
    let emitter = Arc::new(RecordingEmitter::new());
    let orchestrator = Arc::new(ReleaseOrchestrator::new(
        store,
        emitter,
        std::iter::empty::<String>(),
    ));
    create_router().with_state(orchestrator)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Vec<u8>) {
    let request = match body {
        Some(json) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

const NS: &str = "/apps/demo/envs/DEV/clusters/default/namespaces/application";

#[tokio::test]
async fn health_endpoint_responds() {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn item_edit_publish_and_rollback_over_http() {
    let app = app();

    // Namespace is created on first item edit.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("{}/items/timeout", NS),
        Some(r#"{"value": "30", "operator": "alice"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        &format!("{}/releases", NS),
        Some(r#"{"released_by": "alice"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let release: Release = serde_json::from_slice(&body).unwrap();
    assert_eq!(release.items["timeout"], "30");

    let (status, body) = send(&app, "GET", &format!("{}/releases/active", NS), None).await;
    assert_eq!(status, StatusCode::OK);
    let active: Vec<Release> = serde_json::from_slice(&body).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, release.id);

    let rollback_uri = format!("/envs/DEV/releases/{}/rollback", release.id);
    let (status, _) = send(&app, "PUT", &rollback_uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Second rollback of the same release conflicts.
    let (status, _) = send(&app, "PUT", &rollback_uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, "GET", &format!("{}/releases/active", NS), None).await;
    assert_eq!(status, StatusCode::OK);
    let active: Vec<Release> = serde_json::from_slice(&body).unwrap();
    assert!(active.is_empty());
}

#[tokio::test]
async fn error_taxonomy_maps_to_http_statuses() {
    let app = app();

    // Publishing a namespace that was never edited: 404.
    let (status, _) = send(
        &app,
        "POST",
        &format!("{}/releases", NS),
        Some(r#"{"released_by": "alice"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Bad paging: 400.
    let (status, _) = send(
        &app,
        "GET",
        &format!("{}/releases/all?page=0&size=0", NS),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Compare with unresolvable ids: 404.
    let (status, _) = send(
        &app,
        "GET",
        "/envs/DEV/releases/compare?base_release_id=a&to_compare_release_id=b",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn gray_release_route_publishes_on_branch() {
    let app = app();

    let (status, _) = send(
        &app,
        "PUT",
        &format!("{}/items/timeout", NS),
        Some(r#"{"value": "30", "operator": "alice"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Branch override, addressed with the branch name as cluster.
    let branch_ns = "/apps/demo/envs/DEV/clusters/gray1/namespaces/application";
    let (status, _) = send(
        &app,
        "PUT",
        &format!("{}/items/timeout", branch_ns),
        Some(r#"{"value": "60", "operator": "bob"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        &format!("{}/branches/gray1/releases", NS),
        Some(r#"{"released_by": "bob"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let release: Release = serde_json::from_slice(&body).unwrap();
    assert_eq!(release.cluster_name, "gray1");
    assert_eq!(release.items["timeout"], "60");

    // The parent cluster's history stays empty.
    let (status, body) = send(&app, "GET", &format!("{}/releases/all", NS), None).await;
    assert_eq!(status, StatusCode::OK);
    let history: Vec<Release> = serde_json::from_slice(&body).unwrap();
    assert!(history.is_empty());
}
