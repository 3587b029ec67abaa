//! Subscription API handlers.
//!
//! # Purpose
//! Create, inspect, update, list and delete subscriptions of a topic. Ownership
//! is recorded at creation from the authenticated caller and reported back as
//! `IsOwner` relative to whoever is asking.
use crate::api::error::{ApiError, api_invalid_parameter};
use crate::api::{now_secs, validate_comment};
use crate::app::AppState;
use crate::auth::Caller;
use crate::model::{
    SubscriptionKey, SubscriptionPatch, SubscriptionRecord, TopicKey, new_sub_id,
};
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use datahub_common::{
    CreateSubscriptionRequest, CreateSubscriptionResult, ListSubscriptionResult, Subscription,
    UpdateSubscriptionRequest, UpdateSubscriptionStateRequest,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListSubscriptionQuery {
    /// Substring matched against sub ids and comments.
    #[serde(default)]
    pub search: String,
    /// One-based page number; defaults to 1.
    pub page_index: Option<i64>,
    /// Page length; defaults to the service maximum.
    pub page_size: Option<i64>,
}

/// Resolve the requested page into `(offset, limit)` or reject it.
pub(crate) fn page_window(
    page_index: i64,
    page_size: i64,
    max_page_size: i64,
) -> Result<(usize, usize), ApiError> {
    if page_index < 1 {
        return Err(api_invalid_parameter(format!(
            "pageIndex must be at least 1, got {page_index}"
        )));
    }
    if !(1..=max_page_size).contains(&page_size) {
        return Err(api_invalid_parameter(format!(
            "pageSize must be between 1 and {max_page_size}, got {page_size}"
        )));
    }
    let offset = (page_index - 1)
        .checked_mul(page_size)
        .and_then(|offset| usize::try_from(offset).ok())
        .unwrap_or(usize::MAX);
    Ok((offset, page_size as usize))
}

#[utoipa::path(
    post,
    path = "/projects/{project}/topics/{topic}/subscriptions",
    tag = "subscriptions",
    params(
        ("project" = String, Path, description = "Project name"),
        ("topic" = String, Path, description = "Topic name")
    ),
    request_body = CreateSubscriptionRequest,
    responses(
        (status = 201, description = "Subscription created", body = CreateSubscriptionResult),
        (status = 404, description = "Project or topic not found", body = datahub_common::ErrorResponse)
    )
)]
pub(crate) async fn create_subscription(
    path: Result<Path<(String, String)>, PathRejection>,
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<CreateSubscriptionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path((project, topic)) = path?;
    let Json(body) = payload?;
    validate_comment(&body.comment)?;
    let now = chrono::Utc::now();
    let key = SubscriptionKey::new(
        TopicKey::new(project, topic),
        new_sub_id(now.timestamp_millis()),
    );
    let record = SubscriptionRecord::new(key, body.comment, caller.access_id, now.timestamp());
    let created = state.store.create_subscription(record).await?;
    tracing::info!(
        project = %created.key.topic.project,
        topic = %created.key.topic.topic,
        sub_id = %created.key.sub_id,
        "subscription created"
    );
    Ok((
        StatusCode::CREATED,
        Json(CreateSubscriptionResult {
            sub_id: created.key.sub_id,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/projects/{project}/topics/{topic}/subscriptions",
    tag = "subscriptions",
    params(
        ("project" = String, Path, description = "Project name"),
        ("topic" = String, Path, description = "Topic name"),
        ListSubscriptionQuery
    ),
    responses(
        (status = 200, description = "One page of matching subscriptions", body = ListSubscriptionResult),
        (status = 400, description = "Invalid page index or size", body = datahub_common::ErrorResponse),
        (status = 404, description = "Project or topic not found", body = datahub_common::ErrorResponse)
    )
)]
pub(crate) async fn list_subscriptions(
    path: Result<Path<(String, String)>, PathRejection>,
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    query: Result<Query<ListSubscriptionQuery>, QueryRejection>,
) -> Result<Json<ListSubscriptionResult>, ApiError> {
    let Path((project, topic)) = path?;
    let Query(query) = query?;
    let (offset, limit) = page_window(
        query.page_index.unwrap_or(1),
        query.page_size.unwrap_or(state.max_page_size),
        state.max_page_size,
    )?;
    let key = TopicKey::new(project, topic);
    let page = state
        .store
        .list_subscriptions(&key, &query.search, offset, limit)
        .await?;
    Ok(Json(ListSubscriptionResult {
        total_count: page.total,
        subscriptions: page
            .items
            .iter()
            .map(|record| record.view_for(&caller.access_id))
            .collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/projects/{project}/topics/{topic}/subscriptions/{sub_id}",
    tag = "subscriptions",
    params(
        ("project" = String, Path, description = "Project name"),
        ("topic" = String, Path, description = "Topic name"),
        ("sub_id" = String, Path, description = "Subscription id")
    ),
    responses(
        (status = 200, description = "Subscription", body = Subscription),
        (status = 404, description = "Project, topic or subscription not found", body = datahub_common::ErrorResponse)
    )
)]
pub(crate) async fn get_subscription(
    path: Result<Path<(String, String, String)>, PathRejection>,
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Subscription>, ApiError> {
    let Path((project, topic, sub_id)) = path?;
    let key = SubscriptionKey::new(TopicKey::new(project, topic), sub_id);
    let record = state.store.get_subscription(&key).await?;
    Ok(Json(record.view_for(&caller.access_id)))
}

#[utoipa::path(
    put,
    path = "/projects/{project}/topics/{topic}/subscriptions/{sub_id}",
    tag = "subscriptions",
    params(
        ("project" = String, Path, description = "Project name"),
        ("topic" = String, Path, description = "Topic name"),
        ("sub_id" = String, Path, description = "Subscription id")
    ),
    request_body = UpdateSubscriptionRequest,
    responses(
        (status = 200, description = "Subscription updated", body = Subscription),
        (status = 404, description = "Project, topic or subscription not found", body = datahub_common::ErrorResponse)
    )
)]
pub(crate) async fn update_subscription(
    path: Result<Path<(String, String, String)>, PathRejection>,
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<UpdateSubscriptionRequest>, JsonRejection>,
) -> Result<Json<Subscription>, ApiError> {
    let Path((project, topic, sub_id)) = path?;
    let Json(body) = payload?;
    validate_comment(&body.comment)?;
    let key = SubscriptionKey::new(TopicKey::new(project, topic), sub_id);
    let patch = SubscriptionPatch {
        comment: Some(body.comment),
        ..Default::default()
    };
    let record = state
        .store
        .patch_subscription(&key, patch, now_secs())
        .await?;
    Ok(Json(record.view_for(&caller.access_id)))
}

#[utoipa::path(
    put,
    path = "/projects/{project}/topics/{topic}/subscriptions/{sub_id}/state",
    tag = "subscriptions",
    params(
        ("project" = String, Path, description = "Project name"),
        ("topic" = String, Path, description = "Topic name"),
        ("sub_id" = String, Path, description = "Subscription id")
    ),
    request_body = UpdateSubscriptionStateRequest,
    responses(
        (status = 200, description = "Subscription state updated", body = Subscription),
        (status = 400, description = "Unknown state", body = datahub_common::ErrorResponse),
        (status = 404, description = "Project, topic or subscription not found", body = datahub_common::ErrorResponse)
    )
)]
pub(crate) async fn update_subscription_state(
    path: Result<Path<(String, String, String)>, PathRejection>,
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<UpdateSubscriptionStateRequest>, JsonRejection>,
) -> Result<Json<Subscription>, ApiError> {
    let Path((project, topic, sub_id)) = path?;
    let Json(body) = payload?;
    let key = SubscriptionKey::new(TopicKey::new(project, topic), sub_id);
    let patch = SubscriptionPatch {
        state: Some(body.state),
        ..Default::default()
    };
    let record = state
        .store
        .patch_subscription(&key, patch, now_secs())
        .await?;
    tracing::info!(sub_id = %record.key.sub_id, state = %record.state, "subscription state changed");
    Ok(Json(record.view_for(&caller.access_id)))
}

#[utoipa::path(
    delete,
    path = "/projects/{project}/topics/{topic}/subscriptions/{sub_id}",
    tag = "subscriptions",
    params(
        ("project" = String, Path, description = "Project name"),
        ("topic" = String, Path, description = "Topic name"),
        ("sub_id" = String, Path, description = "Subscription id")
    ),
    responses(
        (status = 204, description = "Subscription deleted"),
        (status = 404, description = "Project, topic or subscription not found", body = datahub_common::ErrorResponse)
    )
)]
pub(crate) async fn delete_subscription(
    path: Result<Path<(String, String, String)>, PathRejection>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let Path((project, topic, sub_id)) = path?;
    let key = SubscriptionKey::new(TopicKey::new(project, topic), sub_id);
    state.store.delete_subscription(&key).await?;
    tracing::info!(sub_id = %key.sub_id, "subscription deleted");
    Ok(StatusCode::NO_CONTENT)
}
