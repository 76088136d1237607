//! Persistence layer for Coterie.
//!
//! This module provides pluggable storage backends behind the [`Store`]
//! trait:
//! - **PostgresStore**: production storage using sqlx, relying on the
//!   database for the membership uniqueness constraint, cascade deletes,
//!   and transactional atomicity
//! - **MemoryStore**: dashmap-backed storage used by the test suite
//!
//! The store is deliberately dumb about authorization: it enforces only
//! structural invariants (uniqueness, atomic project+owner creation,
//! cascades). Role checks live in [`crate::authz`]; business rules such as
//! owner protection live in [`crate::projects`].

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::membership::{Member, Membership, Role};

// ═══════════════════════════════════════════════════════════════════════════════
// Entities
// ═══════════════════════════════════════════════════════════════════════════════

/// A registered user. Authentication lives outside the core; the session
/// layer resolves requests to a user id which the core trusts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// A project. Owned collectively by its members; ownership is expressed
/// through memberships, not a column on this row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A comment attached to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// The editable fields of a project, used for both create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFields {
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Store Trait
// ═══════════════════════════════════════════════════════════════════════════════

/// Storage backend for projects, memberships, comments, and the user
/// directory.
#[async_trait]
pub trait Store: Send + Sync {
    /// Readiness probe. Backends with external connections verify them
    /// here; the default is a no-op.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Project Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Persist a new project together with its Owner membership.
    ///
    /// Both writes happen in one transaction: a project without an Owner
    /// must never be observable, even across a crash between the writes.
    async fn create_project_with_owner(
        &self,
        owner_id: Uuid,
        fields: &ProjectFields,
    ) -> Result<Project>;

    /// Get a project by id.
    async fn get_project(&self, project_id: Uuid) -> Result<Option<Project>>;

    /// Replace a project's editable fields and bump `updated_at`.
    ///
    /// Fails with `ProjectNotFound` if the project does not exist.
    async fn update_project(&self, project_id: Uuid, fields: &ProjectFields) -> Result<Project>;

    /// Delete a project, cascading removal of its memberships and comments.
    ///
    /// The cascade intentionally bypasses owner protection: deleting the
    /// project is the one sanctioned way an Owner membership disappears.
    async fn delete_project(&self, project_id: Uuid) -> Result<()>;

    /// All projects where the user holds any membership, ordered by
    /// `updated_at` descending (most recently touched first).
    async fn list_projects_for_user(&self, user_id: Uuid) -> Result<Vec<Project>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Membership Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the membership for a (project, user) pair.
    async fn get_membership(&self, project_id: Uuid, user_id: Uuid)
        -> Result<Option<Membership>>;

    /// Create a membership.
    ///
    /// Fails with `DuplicateMembership` if the pair already has one; under
    /// concurrent creation the uniqueness constraint picks the loser.
    async fn create_membership(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<Membership>;

    /// Delete a membership. Fails with `MembershipNotFound` if absent.
    async fn delete_membership(&self, project_id: Uuid, user_id: Uuid) -> Result<()>;

    /// All members of a project, ordered by username ascending.
    async fn list_members(&self, project_id: Uuid) -> Result<Vec<Member>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Comment Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Attach a comment to a project.
    async fn create_comment(&self, project_id: Uuid, user_id: Uuid, text: &str)
        -> Result<Comment>;

    /// Get a comment scoped to a project. Returns `None` when the comment
    /// does not exist or belongs to another project.
    async fn get_comment(&self, project_id: Uuid, comment_id: Uuid) -> Result<Option<Comment>>;

    /// Delete a comment scoped to a project. Fails with `CommentNotFound`
    /// if the comment does not belong to the project.
    async fn delete_comment(&self, project_id: Uuid, comment_id: Uuid) -> Result<()>;

    /// All comments on a project, newest first.
    async fn list_comments(&self, project_id: Uuid) -> Result<Vec<Comment>>;

    // ─────────────────────────────────────────────────────────────────────────
    // User Directory
    // ─────────────────────────────────────────────────────────────────────────

    /// Get a user by id.
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>>;

    /// Resolve a username to a user.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Register a user in the directory.
    async fn create_user(&self, username: &str, email: &str) -> Result<User>;
}
