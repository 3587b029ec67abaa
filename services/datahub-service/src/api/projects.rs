//! Project API handlers.
use crate::api::error::{ApiError, api_invalid_parameter};
use crate::api::{now_secs, validate_comment};
use crate::app::AppState;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use datahub_common::names::validate_project_name;
use datahub_common::{CreateProjectRequest, ListProjectResult, Project, UpdateProjectRequest};

#[utoipa::path(
    get,
    path = "/projects",
    tag = "projects",
    responses(
        (status = 200, description = "List project names", body = ListProjectResult)
    )
)]
pub(crate) async fn list_projects(
    State(state): State<AppState>,
) -> Result<Json<ListProjectResult>, ApiError> {
    let project_names = state.store.list_projects().await?;
    Ok(Json(ListProjectResult { project_names }))
}

#[utoipa::path(
    post,
    path = "/projects/{project}",
    tag = "projects",
    params(("project" = String, Path, description = "Project name")),
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 400, description = "Invalid name or comment", body = datahub_common::ErrorResponse),
        (status = 409, description = "Project already exists", body = datahub_common::ErrorResponse)
    )
)]
pub(crate) async fn create_project(
    path: Result<Path<String>, PathRejection>,
    State(state): State<AppState>,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(project) = path?;
    let Json(body) = payload?;
    validate_project_name(&project).map_err(|err| api_invalid_parameter(err.to_string()))?;
    validate_comment(&body.comment)?;
    let now = now_secs();
    let created = state
        .store
        .create_project(Project {
            project_name: project,
            comment: body.comment,
            create_time: now,
            last_modify_time: now,
        })
        .await?;
    tracing::info!(project = %created.project_name, "project created");
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/projects/{project}",
    tag = "projects",
    params(("project" = String, Path, description = "Project name")),
    responses(
        (status = 200, description = "Project", body = Project),
        (status = 404, description = "Project not found", body = datahub_common::ErrorResponse)
    )
)]
pub(crate) async fn get_project(
    path: Result<Path<String>, PathRejection>,
    State(state): State<AppState>,
) -> Result<Json<Project>, ApiError> {
    let Path(project) = path?;
    Ok(Json(state.store.get_project(&project).await?))
}

#[utoipa::path(
    put,
    path = "/projects/{project}",
    tag = "projects",
    params(("project" = String, Path, description = "Project name")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = Project),
        (status = 404, description = "Project not found", body = datahub_common::ErrorResponse)
    )
)]
pub(crate) async fn update_project(
    path: Result<Path<String>, PathRejection>,
    State(state): State<AppState>,
    payload: Result<Json<UpdateProjectRequest>, JsonRejection>,
) -> Result<Json<Project>, ApiError> {
    let Path(project) = path?;
    let Json(body) = payload?;
    validate_comment(&body.comment)?;
    let updated = state
        .store
        .update_project(&project, body.comment, now_secs())
        .await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/projects/{project}",
    tag = "projects",
    params(("project" = String, Path, description = "Project name")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 404, description = "Project not found", body = datahub_common::ErrorResponse),
        (status = 409, description = "Project still has topics", body = datahub_common::ErrorResponse)
    )
)]
pub(crate) async fn delete_project(
    path: Result<Path<String>, PathRejection>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let Path(project) = path?;
    state.store.delete_project(&project).await?;
    tracing::info!(%project, "project deleted");
    Ok(StatusCode::NO_CONTENT)
}
