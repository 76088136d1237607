//! API request handlers with proper error propagation.
//!
//! All handlers return `Result<impl IntoResponse, CoterieError>` so that
//! errors are automatically converted to appropriate HTTP status codes via
//! the `IntoResponse` implementation on `CoterieError`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::extract::ResponseMode;
use super::{ApiResponse, AppState};
use crate::auth::CurrentUser;
use crate::error::{CoterieError, ErrorCode};
use crate::membership::{Member, Role};
use crate::observability::metrics;
use crate::projects::ProjectDetail;
use crate::store::{Comment, Project, ProjectFields, Store};

// ═══════════════════════════════════════════════════════════════════════════════
// Health and Metrics
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub async fn readiness_check(State(state): State<AppState>) -> Result<impl IntoResponse, CoterieError> {
    state.store.ping().await?;
    Ok(Json(serde_json::json!({ "status": "ready" })))
}

pub async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Project Handlers
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize)]
pub struct ProjectPayload {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl From<ProjectPayload> for ProjectFields {
    fn from(payload: ProjectPayload) -> Self {
        Self {
            name: payload.name,
            description: payload.description,
            start_date: payload.start_date,
            end_date: payload.end_date,
        }
    }
}

#[derive(Serialize)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        Self {
            id: project.id,
            name: project.name,
            description: project.description,
            start_date: project.start_date,
            end_date: project.end_date,
            created_at: project.created_at.to_rfc3339(),
            updated_at: project.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct ProjectDetailResponse {
    pub project: ProjectResponse,
    pub viewer_role: String,
    pub comments: Vec<CommentResponse>,
}

impl From<ProjectDetail> for ProjectDetailResponse {
    fn from(detail: ProjectDetail) -> Self {
        Self {
            project: detail.project.into(),
            viewer_role: detail.viewer_role.to_string(),
            comments: detail.comments.into_iter().map(Into::into).collect(),
        }
    }
}

pub async fn list_projects(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, CoterieError> {
    let projects = state.projects.list_for_user(user.id).await?;
    let response: Vec<ProjectResponse> = projects.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::success(response)))
}

pub async fn create_project(
    State(state): State<AppState>,
    user: CurrentUser,
    mode: ResponseMode,
    Json(payload): Json<ProjectPayload>,
) -> Result<impl IntoResponse, CoterieError> {
    let fields: ProjectFields = payload.into();
    let project = state.projects.create(user.id, &fields).await?;
    metrics::record_project_created();

    if mode.is_partial() {
        let projects = state.projects.list_for_user(user.id).await?;
        let response: Vec<ProjectResponse> = projects.into_iter().map(Into::into).collect();
        return Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response());
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ProjectResponse::from(project))),
    )
        .into_response())
}

pub async fn project_detail(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, CoterieError> {
    let detail = state.projects.detail(user.id, project_id).await?;
    Ok(Json(ApiResponse::success(ProjectDetailResponse::from(detail))))
}

pub async fn update_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<ProjectPayload>,
) -> Result<impl IntoResponse, CoterieError> {
    let fields: ProjectFields = payload.into();
    let project = state.projects.update(user.id, project_id, &fields).await?;
    Ok(Json(ApiResponse::success(ProjectResponse::from(project))))
}

pub async fn delete_project(
    State(state): State<AppState>,
    user: CurrentUser,
    mode: ResponseMode,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, CoterieError> {
    state.projects.delete(user.id, project_id).await?;

    if mode.is_partial() {
        let projects = state.projects.list_for_user(user.id).await?;
        let response: Vec<ProjectResponse> = projects.into_iter().map(Into::into).collect();
        return Ok(Json(ApiResponse::success(response)).into_response());
    }

    Ok(StatusCode::NO_CONTENT.into_response())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Membership Handlers
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize)]
pub struct AddMemberRequest {
    pub username: String,
    pub role: String,
}

#[derive(Serialize)]
pub struct MemberResponse {
    pub user_id: Uuid,
    pub username: String,
    pub role: String,
    pub joined_at: String,
}

impl From<Member> for MemberResponse {
    fn from(member: Member) -> Self {
        Self {
            user_id: member.user_id,
            username: member.username,
            role: member.role.to_string(),
            joined_at: member.joined_at.to_rfc3339(),
        }
    }
}

pub async fn list_members(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, CoterieError> {
    let members = state.projects.list_members(user.id, project_id).await?;
    let response: Vec<MemberResponse> = members.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::success(response)))
}

pub async fn add_member(
    State(state): State<AppState>,
    user: CurrentUser,
    mode: ResponseMode,
    Path(project_id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> Result<impl IntoResponse, CoterieError> {
    let role: Role = req.role.parse()?;

    let result = state
        .projects
        .add_member(user.id, project_id, &req.username, role)
        .await;

    match result {
        Ok(member) => {
            metrics::record_member_added(member.role.as_str());
            if mode.is_partial() {
                let members = state.projects.list_members(user.id, project_id).await?;
                let response: Vec<MemberResponse> =
                    members.into_iter().map(Into::into).collect();
                Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response())
            } else {
                Ok((
                    StatusCode::CREATED,
                    Json(ApiResponse::success(MemberResponse::from(member))),
                )
                    .into_response())
            }
        }
        // Fragment clients still need the roster to re-render alongside the
        // duplicate warning.
        Err(err) if mode.is_partial() && err.code() == ErrorCode::DuplicateMembership => {
            let members = state.projects.list_members(user.id, project_id).await?;
            let roster: Vec<MemberResponse> = members.into_iter().map(Into::into).collect();
            let body = ApiResponse {
                success: false,
                data: Some(roster),
                error: Some(err.user_message().to_string()),
                error_code: Some(err.code().to_string()),
            };
            Ok((err.http_status(), Json(body)).into_response())
        }
        Err(err) => Err(err),
    }
}

pub async fn remove_member(
    State(state): State<AppState>,
    user: CurrentUser,
    mode: ResponseMode,
    Path((project_id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, CoterieError> {
    state.projects.remove_member(user.id, project_id, member_id).await?;

    if mode.is_partial() {
        let members = state.projects.list_members(user.id, project_id).await?;
        let response: Vec<MemberResponse> = members.into_iter().map(Into::into).collect();
        return Ok(Json(ApiResponse::success(response)).into_response());
    }

    Ok(StatusCode::NO_CONTENT.into_response())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Comment Handlers
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize)]
pub struct CommentPayload {
    pub text: String,
}

#[derive(Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: String,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            project_id: comment.project_id,
            author_id: comment.user_id,
            text: comment.text,
            created_at: comment.created_at.to_rfc3339(),
        }
    }
}

pub async fn list_comments(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, CoterieError> {
    let comments = state.comments.list(user.id, project_id).await?;
    let response: Vec<CommentResponse> = comments.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::success(response)))
}

pub async fn add_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    mode: ResponseMode,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<CommentPayload>,
) -> Result<impl IntoResponse, CoterieError> {
    let comment = state.comments.add(user.id, project_id, &payload.text).await?;
    metrics::record_comment_added();

    if mode.is_partial() {
        let comments = state.comments.list(user.id, project_id).await?;
        let response: Vec<CommentResponse> = comments.into_iter().map(Into::into).collect();
        return Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response());
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CommentResponse::from(comment))),
    )
        .into_response())
}

pub async fn remove_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((project_id, comment_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, CoterieError> {
    state.comments.remove(user.id, project_id, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
