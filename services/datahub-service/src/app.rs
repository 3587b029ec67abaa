//! DataHub HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, layers authentication and request ids over it, and defines the
//! shared state injected into handlers.
//!
//! # Notes
//! Layer order, outermost first: request id, tracing, then signature checks on the API
//! routes only. `/system/health` and `/openapi.json` stay unauthenticated.
use crate::api;
use crate::auth::{self, AccountRegistry, RequestId};
use crate::config::ServiceConfig;
use crate::store::DatahubStore;
use crate::store::memory::InMemoryStore;
use axum::Router;
use axum::routing::{get, put};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DatahubStore + Send + Sync>,
    pub accounts: Arc<AccountRegistry>,
    pub max_page_size: i64,
}

impl AppState {
    /// State backed by a fresh in-memory store.
    pub fn in_memory(config: &ServiceConfig) -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
            accounts: Arc::new(AccountRegistry::new(&config.accounts)),
            max_page_size: config.max_page_size,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let request_id = request
                .extensions()
                .get::<RequestId>()
                .map(|id| id.0.as_str())
                .unwrap_or_default();
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id
            )
        });

    let api_routes = Router::new()
        .route("/projects", get(api::projects::list_projects))
        .route(
            "/projects/:project",
            get(api::projects::get_project)
                .post(api::projects::create_project)
                .put(api::projects::update_project)
                .delete(api::projects::delete_project),
        )
        .route("/projects/:project/topics", get(api::topics::list_topics))
        .route(
            "/projects/:project/topics/:topic",
            get(api::topics::get_topic)
                .post(api::topics::create_topic)
                .delete(api::topics::delete_topic),
        )
        .route(
            "/projects/:project/topics/:topic/subscriptions",
            get(api::subscriptions::list_subscriptions)
                .post(api::subscriptions::create_subscription),
        )
        .route(
            "/projects/:project/topics/:topic/subscriptions/:sub_id",
            get(api::subscriptions::get_subscription)
                .put(api::subscriptions::update_subscription)
                .delete(api::subscriptions::delete_subscription),
        )
        .route(
            "/projects/:project/topics/:topic/subscriptions/:sub_id/state",
            put(api::subscriptions::update_subscription_state),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ));

    Router::new()
        .route("/system/health", get(api::system::system_health))
        .route("/openapi.json", get(api::system::openapi_json))
        .merge(api_routes)
        .layer(trace_layer)
        .layer(axum::middleware::from_fn(auth::assign_request_id))
        .with_state(state)
}

/// Serve the API on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: F,
) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(state).into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
}
