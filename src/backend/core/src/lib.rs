#![allow(clippy::result_large_err)]
//! # Coterie Core
//!
//! Backend for Coterie, a project collaboration service built around a
//! membership-based access model.
//!
//! ## Architecture
//!
//! - **Membership**: Per-project roles (Owner, Editor, Reader) and the
//!   capability sets gating each operation
//! - **Authorization Engine**: Membership-then-role checks; outsiders see
//!   projects they are not in as nonexistent
//! - **Projects**: Lifecycle management with atomic owner creation and
//!   owner protection on member removal
//! - **Comments**: Per-project threads with role-gated write and moderation
//! - **Store**: Pluggable persistence (PostgreSQL via sqlx, in-memory for
//!   tests)
//! - **API**: Axum REST surface with response-mode aware handlers
//! - **Observability**: Distributed tracing and Prometheus metrics

pub mod api;
pub mod auth;
pub mod authz;
pub mod comments;
pub mod config;
pub mod error;
pub mod membership;
pub mod observability;
pub mod projects;
pub mod store;
pub mod validation;

pub use error::{CoterieError, ErrorCode, ErrorContext, ErrorDetails, ErrorSeverity, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::api::{build_router, ApiResponse, AppState};
    pub use crate::auth::{Claims, CurrentUser, SessionVerifier};
    pub use crate::authz::AuthorizationEngine;
    pub use crate::comments::CommentService;
    pub use crate::error::{
        CoterieError, ErrorCode, ErrorContext, ErrorDetails, ErrorSeverity, Result,
    };
    pub use crate::membership::{capability, Member, Membership, Role};
    pub use crate::projects::{ProjectDetail, ProjectService};
    pub use crate::store::{
        Comment, MemoryStore, PostgresStore, Project, ProjectFields, Store, User,
    };
    pub use crate::validation::ValidationErrors;
}
