//! Topic API handlers.
//!
//! Topics are immutable once created; there is no update endpoint.
use crate::api::error::{ApiError, api_invalid_parameter};
use crate::api::{now_secs, validate_comment};
use crate::app::AppState;
use crate::model::TopicKey;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use datahub_common::names::validate_topic_name;
use datahub_common::{CreateTopicRequest, ListTopicResult, RecordType, Topic};
use std::ops::RangeInclusive;

pub const SHARD_COUNT_RANGE: RangeInclusive<u32> = 1..=256;
pub const LIFECYCLE_DAYS_RANGE: RangeInclusive<u32> = 1..=7;

fn validate_topic(topic: &str, body: &CreateTopicRequest) -> Result<(), ApiError> {
    validate_topic_name(topic).map_err(|err| api_invalid_parameter(err.to_string()))?;
    if !SHARD_COUNT_RANGE.contains(&body.shard_count) {
        return Err(api_invalid_parameter(format!(
            "ShardCount must be between {} and {}",
            SHARD_COUNT_RANGE.start(),
            SHARD_COUNT_RANGE.end()
        )));
    }
    if !LIFECYCLE_DAYS_RANGE.contains(&body.lifecycle) {
        return Err(api_invalid_parameter(format!(
            "Lifecycle must be between {} and {} days",
            LIFECYCLE_DAYS_RANGE.start(),
            LIFECYCLE_DAYS_RANGE.end()
        )));
    }
    match (body.record_type, &body.record_schema) {
        (RecordType::Tuple, Some(schema)) => schema
            .validate()
            .map_err(|err| api_invalid_parameter(err.to_string()))?,
        (RecordType::Tuple, None) => {
            return Err(api_invalid_parameter("TUPLE topics require a RecordSchema"));
        }
        (RecordType::Blob, Some(_)) => {
            return Err(api_invalid_parameter("BLOB topics do not take a RecordSchema"));
        }
        (RecordType::Blob, None) => {}
    }
    validate_comment(&body.comment)
}

#[utoipa::path(
    get,
    path = "/projects/{project}/topics",
    tag = "topics",
    params(("project" = String, Path, description = "Project name")),
    responses(
        (status = 200, description = "List topic names", body = ListTopicResult),
        (status = 404, description = "Project not found", body = datahub_common::ErrorResponse)
    )
)]
pub(crate) async fn list_topics(
    path: Result<Path<String>, PathRejection>,
    State(state): State<AppState>,
) -> Result<Json<ListTopicResult>, ApiError> {
    let Path(project) = path?;
    let topic_names = state.store.list_topics(&project).await?;
    Ok(Json(ListTopicResult { topic_names }))
}

#[utoipa::path(
    post,
    path = "/projects/{project}/topics/{topic}",
    tag = "topics",
    params(
        ("project" = String, Path, description = "Project name"),
        ("topic" = String, Path, description = "Topic name")
    ),
    request_body = CreateTopicRequest,
    responses(
        (status = 201, description = "Topic created", body = Topic),
        (status = 400, description = "Invalid topic definition", body = datahub_common::ErrorResponse),
        (status = 404, description = "Project not found", body = datahub_common::ErrorResponse),
        (status = 409, description = "Topic already exists", body = datahub_common::ErrorResponse)
    )
)]
pub(crate) async fn create_topic(
    path: Result<Path<(String, String)>, PathRejection>,
    State(state): State<AppState>,
    payload: Result<Json<CreateTopicRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path((project, topic)) = path?;
    let Json(body) = payload?;
    validate_topic(&topic, &body)?;
    let now = now_secs();
    let created = state
        .store
        .create_topic(Topic {
            project_name: project,
            topic_name: topic,
            shard_count: body.shard_count,
            lifecycle: body.lifecycle,
            record_type: body.record_type,
            record_schema: body.record_schema,
            comment: body.comment,
            create_time: now,
            last_modify_time: now,
        })
        .await?;
    tracing::info!(
        project = %created.project_name,
        topic = %created.topic_name,
        shards = created.shard_count,
        "topic created"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/projects/{project}/topics/{topic}",
    tag = "topics",
    params(
        ("project" = String, Path, description = "Project name"),
        ("topic" = String, Path, description = "Topic name")
    ),
    responses(
        (status = 200, description = "Topic", body = Topic),
        (status = 404, description = "Project or topic not found", body = datahub_common::ErrorResponse)
    )
)]
pub(crate) async fn get_topic(
    path: Result<Path<(String, String)>, PathRejection>,
    State(state): State<AppState>,
) -> Result<Json<Topic>, ApiError> {
    let Path((project, topic)) = path?;
    let key = TopicKey::new(project, topic);
    Ok(Json(state.store.get_topic(&key).await?))
}

#[utoipa::path(
    delete,
    path = "/projects/{project}/topics/{topic}",
    tag = "topics",
    params(
        ("project" = String, Path, description = "Project name"),
        ("topic" = String, Path, description = "Topic name")
    ),
    responses(
        (status = 204, description = "Topic deleted"),
        (status = 404, description = "Project or topic not found", body = datahub_common::ErrorResponse),
        (status = 409, description = "Topic still has subscriptions", body = datahub_common::ErrorResponse)
    )
)]
pub(crate) async fn delete_topic(
    path: Result<Path<(String, String)>, PathRejection>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let Path((project, topic)) = path?;
    let key = TopicKey::new(project, topic);
    state.store.delete_topic(&key).await?;
    tracing::info!(project = %key.project, topic = %key.topic, "topic deleted");
    Ok(StatusCode::NO_CONTENT)
}
