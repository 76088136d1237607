//! HTTP API for the Coterie core.
//!
//! REST routes live under `/api/v1/`; health and metrics endpoints are
//! unversioned. Every authenticated route extracts the caller from the
//! bearer token and funnels through the services, so authorization failures
//! carry the same status semantics everywhere:
//!
//! - outsider or missing project → 404
//! - member without the required role → 403
//! - owner-protection violation → 400
//! - duplicate member, unknown username, invalid input → 422
//!
//! Handlers are response-mode aware: a request marked `HX-Request: true`
//! receives the refreshed collection a fragment-swapping client needs,
//! instead of the single entity a full API client expects.

pub mod extract;
mod handlers;

use std::sync::Arc;

use axum::extract::FromRef;
use axum::routing::{delete, get, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::auth::SessionVerifier;
use crate::comments::CommentService;
use crate::error::CoterieError;
use crate::projects::ProjectService;
use crate::store::Store;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub projects: ProjectService,
    pub comments: CommentService,
    pub sessions: Arc<SessionVerifier>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire up the services over a storage backend.
    pub fn new(
        store: Arc<dyn Store>,
        sessions: Arc<SessionVerifier>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let authz = crate::authz::AuthorizationEngine::new(store.clone());
        Self {
            projects: ProjectService::new(store.clone(), authz.clone()),
            comments: CommentService::new(store.clone(), authz),
            store,
            sessions,
            metrics,
        }
    }
}

impl FromRef<AppState> for Arc<SessionVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

/// Build the API router.
pub fn build_router(state: AppState, body_limit: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Unversioned endpoints
        .route("/health", get(handlers::health_check))
        .route("/health/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::prometheus_metrics))
        // V1 API
        .nest("/api/v1", v1_router())
        // Middleware
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

fn v1_router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(handlers::list_projects))
        .route("/projects", post(handlers::create_project))
        .route("/projects/:project_id", get(handlers::project_detail))
        .route("/projects/:project_id", put(handlers::update_project))
        .route("/projects/:project_id", delete(handlers::delete_project))
        .route("/projects/:project_id/members", get(handlers::list_members))
        .route("/projects/:project_id/members", post(handlers::add_member))
        .route(
            "/projects/:project_id/members/:user_id",
            delete(handlers::remove_member),
        )
        .route("/projects/:project_id/comments", get(handlers::list_comments))
        .route("/projects/:project_id/comments", post(handlers::add_comment))
        .route(
            "/projects/:project_id/comments/:comment_id",
            delete(handlers::remove_comment),
        )
}

/// API response wrapper.
#[derive(serde::Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_code: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            error_code: None,
        }
    }

    pub fn from_error(err: &CoterieError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.user_message().to_string()),
            error_code: Some(err.code().to_string()),
        }
    }
}
