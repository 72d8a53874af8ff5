use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::api::handlers;
use crate::logic::ReleaseOrchestrator;
use crate::store::traits::Store;

pub fn create_router<S: Store + 'static>() -> Router<Arc<ReleaseOrchestrator<S>>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Release lifecycle
        .route(
            "/apps/:app_id/envs/:env/clusters/:cluster_name/namespaces/:namespace_name/releases",
            post(handlers::create_release::<S>),
        )
        .route(
            "/apps/:app_id/envs/:env/clusters/:cluster_name/namespaces/:namespace_name/branches/:branch_name/releases",
            post(handlers::create_gray_release::<S>),
        )
        .route(
            "/apps/:app_id/envs/:env/clusters/:cluster_name/namespaces/:namespace_name/releases/all",
            get(handlers::find_all_releases::<S>),
        )
        .route(
            "/apps/:app_id/envs/:env/clusters/:cluster_name/namespaces/:namespace_name/releases/active",
            get(handlers::find_active_releases::<S>),
        )
        .route(
            "/envs/:env/releases/compare",
            get(handlers::compare_releases::<S>),
        )
        .route(
            "/envs/:env/releases/:release_id/rollback",
            put(handlers::rollback_release::<S>),
        )
        // Namespace working set
        .route(
            "/apps/:app_id/envs/:env/clusters/:cluster_name/namespaces/:namespace_name",
            get(handlers::get_namespace::<S>),
        )
        .route(
            "/apps/:app_id/envs/:env/clusters/:cluster_name/namespaces/:namespace_name/items/:item_key",
            put(handlers::upsert_item::<S>),
        )
        .route(
            "/apps/:app_id/envs/:env/clusters/:cluster_name/namespaces/:namespace_name/items/:item_key",
            delete(handlers::delete_item::<S>),
        )
}
