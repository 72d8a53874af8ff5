use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::OrchestratorError;
use crate::logic::ReleaseOrchestrator;
use crate::model::{
    NamespaceInstance, NamespaceKey, NewRelease, Release, ReleaseCompareResult,
};
use crate::store::traits::Store;

pub type AppState<S> = Arc<ReleaseOrchestrator<S>>;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

fn error_response(err: OrchestratorError) -> (StatusCode, Json<ErrorResponse>) {
    (err.status_code(), Json(ErrorResponse::new(&err.to_string())))
}

fn internal_error(err: anyhow::Error) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(&err.to_string())),
    )
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl PageQuery {
    fn page(&self) -> i64 {
        self.page.unwrap_or(0)
    }

    fn size(&self) -> i64 {
        self.size.unwrap_or(5)
    }
}

#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    pub base_release_id: String,
    pub to_compare_release_id: String,
}

pub async fn create_release<S: Store>(
    State(state): State<AppState<S>>,
    Path((app_id, env, cluster_name, namespace_name)): Path<(String, String, String, String)>,
    Json(request): Json<NewRelease>,
) -> Result<Json<Release>, (StatusCode, Json<ErrorResponse>)> {
    let key = NamespaceKey::new(&app_id, &env, &cluster_name, &namespace_name);
    let release = state.publish(&key, request).await.map_err(error_response)?;
    Ok(Json(release))
}

pub async fn create_gray_release<S: Store>(
    State(state): State<AppState<S>>,
    Path((app_id, env, cluster_name, namespace_name, branch_name)): Path<(
        String,
        String,
        String,
        String,
        String,
    )>,
    Json(request): Json<NewRelease>,
) -> Result<Json<Release>, (StatusCode, Json<ErrorResponse>)> {
    let key = NamespaceKey::new(&app_id, &env, &cluster_name, &namespace_name);
    let release = state
        .publish_gray(&key, &branch_name, request)
        .await
        .map_err(error_response)?;
    Ok(Json(release))
}

pub async fn find_all_releases<S: Store>(
    State(state): State<AppState<S>>,
    Path((app_id, env, cluster_name, namespace_name)): Path<(String, String, String, String)>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Release>>, (StatusCode, Json<ErrorResponse>)> {
    let key = NamespaceKey::new(&app_id, &env, &cluster_name, &namespace_name);
    let releases = state
        .find_all_releases(&key, query.page(), query.size())
        .await
        .map_err(error_response)?;
    Ok(Json(releases))
}

pub async fn find_active_releases<S: Store>(
    State(state): State<AppState<S>>,
    Path((app_id, env, cluster_name, namespace_name)): Path<(String, String, String, String)>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Release>>, (StatusCode, Json<ErrorResponse>)> {
    let key = NamespaceKey::new(&app_id, &env, &cluster_name, &namespace_name);
    let releases = state
        .find_active_releases(&key, query.page(), query.size())
        .await
        .map_err(error_response)?;
    Ok(Json(releases))
}

pub async fn compare_releases<S: Store>(
    State(state): State<AppState<S>>,
    Path(env): Path<String>,
    Query(query): Query<CompareQuery>,
) -> Result<Json<ReleaseCompareResult>, (StatusCode, Json<ErrorResponse>)> {
    let result = state
        .compare_releases(&env, &query.base_release_id, &query.to_compare_release_id)
        .await
        .map_err(error_response)?;
    Ok(Json(result))
}

pub async fn rollback_release<S: Store>(
    State(state): State<AppState<S>>,
    Path((env, release_id)): Path<(String, String)>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    state
        .rollback(&env, &release_id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_namespace<S: Store>(
    State(state): State<AppState<S>>,
    Path((app_id, env, cluster_name, namespace_name)): Path<(String, String, String, String)>,
) -> Result<Json<NamespaceInstance>, (StatusCode, Json<ErrorResponse>)> {
    let key = NamespaceKey::new(&app_id, &env, &cluster_name, &namespace_name);
    match state.store().get_namespace(&key).await {
        Ok(Some(instance)) => Ok(Json(instance)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(&format!(
                "Namespace '{}' not found",
                key
            ))),
        )),
        Err(e) => Err(internal_error(e)),
    }
}

#[derive(Debug, Deserialize)]
pub struct UpsertItemRequest {
    pub value: String,
    pub operator: String,
}

/// Upsert one configuration item in a namespace's working set. The namespace
/// instance is created on first edit. Addressing a gray branch's working set
/// uses the branch name as the cluster.
pub async fn upsert_item<S: Store>(
    State(state): State<AppState<S>>,
    Path((app_id, env, cluster_name, namespace_name, item_key)): Path<(
        String,
        String,
        String,
        String,
        String,
    )>,
    Json(request): Json<UpsertItemRequest>,
) -> Result<Json<NamespaceInstance>, (StatusCode, Json<ErrorResponse>)> {
    let key = NamespaceKey::new(&app_id, &env, &cluster_name, &namespace_name);
    if !key.is_complete() || item_key.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Incomplete item coordinates")),
        ));
    }

    let mut instance = match state.store().get_namespace(&key).await {
        Ok(Some(instance)) => instance,
        Ok(None) => NamespaceInstance::new(&key),
        Err(e) => return Err(internal_error(e)),
    };
    instance.set_item(&item_key, &request.value, &request.operator);

    match state.store().upsert_namespace(instance.clone()).await {
        Ok(()) => Ok(Json(instance)),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn delete_item<S: Store>(
    State(state): State<AppState<S>>,
    Path((app_id, env, cluster_name, namespace_name, item_key)): Path<(
        String,
        String,
        String,
        String,
        String,
    )>,
) -> Result<Json<NamespaceInstance>, (StatusCode, Json<ErrorResponse>)> {
    let key = NamespaceKey::new(&app_id, &env, &cluster_name, &namespace_name);
    let mut instance = match state.store().get_namespace(&key).await {
        Ok(Some(instance)) => instance,
        Ok(None) => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(&format!(
                    "Namespace '{}' not found",
                    key
                ))),
            ))
        }
        Err(e) => return Err(internal_error(e)),
    };

    if !instance.remove_item(&item_key) {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(&format!(
                "Item '{}' not found in namespace '{}'",
                item_key, key
            ))),
        ));
    }

    match state.store().upsert_namespace(instance.clone()).await {
        Ok(()) => Ok(Json(instance)),
        Err(e) => Err(internal_error(e)),
    }
}
