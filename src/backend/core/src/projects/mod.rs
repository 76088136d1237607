//! Project lifecycle: creation, updates, deletion, and member management.
//!
//! The service owns the business rules the store deliberately does not:
//! role gating (through [`AuthorizationEngine`]), owner protection on member
//! removal, and the restriction that only Editor and Reader may be handed
//! out after creation. Project deletion cascades through the store and is
//! the one sanctioned path by which an Owner membership disappears.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::authz::AuthorizationEngine;
use crate::error::{CoterieError, Result};
use crate::membership::{capability, Member, Role};
use crate::store::{Comment, Project, ProjectFields, Store};
use crate::validation::{validate_project_fields, validate_username};

/// A project as seen by a particular member: the row itself, the viewer's
/// role, and the comment thread newest-first.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    pub project: Project,
    pub viewer_role: Role,
    pub comments: Vec<Comment>,
}

/// Project lifecycle manager.
#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn Store>,
    authz: AuthorizationEngine,
}

impl ProjectService {
    pub fn new(store: Arc<dyn Store>, authz: AuthorizationEngine) -> Self {
        Self { store, authz }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a project. The creator becomes its Owner atomically with the
    /// project row; no authorization is required beyond being signed in.
    #[instrument(skip(self, fields), fields(user_id = %user_id))]
    pub async fn create(&self, user_id: Uuid, fields: &ProjectFields) -> Result<Project> {
        validate_project_fields(fields)?;
        let project = self.store.create_project_with_owner(user_id, fields).await?;
        info!(project_id = %project.id, "project created");
        Ok(project)
    }

    /// All projects the user belongs to, most recently touched first.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Project>> {
        self.store.list_projects_for_user(user_id).await
    }

    /// Full detail view for a member of any role.
    pub async fn detail(&self, user_id: Uuid, project_id: Uuid) -> Result<ProjectDetail> {
        let membership = self
            .authz
            .authorize(user_id, project_id, capability::VIEW_PROJECT)
            .await?;
        let project = self
            .store
            .get_project(project_id)
            .await?
            .ok_or_else(|| CoterieError::not_a_member(project_id))?;
        let comments = self.store.list_comments(project_id).await?;
        Ok(ProjectDetail {
            project,
            viewer_role: membership.role,
            comments,
        })
    }

    /// Update the project's editable fields. Owners and Editors only.
    #[instrument(skip(self, fields), fields(user_id = %user_id, project_id = %project_id))]
    pub async fn update(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        fields: &ProjectFields,
    ) -> Result<Project> {
        self.authz
            .authorize(user_id, project_id, capability::UPDATE_PROJECT)
            .await?;
        validate_project_fields(fields)?;
        let project = self.store.update_project(project_id, fields).await?;
        info!("project updated");
        Ok(project)
    }

    /// Delete the project and everything attached to it. Owner only.
    #[instrument(skip(self), fields(user_id = %user_id, project_id = %project_id))]
    pub async fn delete(&self, user_id: Uuid, project_id: Uuid) -> Result<()> {
        self.authz
            .authorize(user_id, project_id, capability::DELETE_PROJECT)
            .await?;
        self.store.delete_project(project_id).await?;
        info!("project deleted");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Membership Management
    // ─────────────────────────────────────────────────────────────────────────

    /// The member roster, ordered by username. Owner only.
    pub async fn list_members(&self, user_id: Uuid, project_id: Uuid) -> Result<Vec<Member>> {
        self.authz
            .authorize(user_id, project_id, capability::MANAGE_MEMBERS)
            .await?;
        self.store.list_members(project_id).await
    }

    /// Add a user to the project by username. Owner only.
    ///
    /// Only assignable roles are accepted; Owner cannot be granted here.
    /// Under a concurrent duplicate add the store's uniqueness constraint
    /// picks a winner and the loser surfaces as `DuplicateMembership`.
    #[instrument(skip(self), fields(actor = %actor, project_id = %project_id, username))]
    pub async fn add_member(
        &self,
        actor: Uuid,
        project_id: Uuid,
        username: &str,
        role: Role,
    ) -> Result<Member> {
        self.authz
            .authorize(actor, project_id, capability::MANAGE_MEMBERS)
            .await?;

        if !Role::assignable().contains(&role) {
            return Err(CoterieError::validation(
                "Only the Editor and Reader roles can be assigned",
            ));
        }

        let username = validate_username(username)?;
        let user = self
            .store
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| CoterieError::unknown_user(username))?;

        let membership = self.store.create_membership(project_id, user.id, role).await?;
        info!(member = %user.id, role = %role, "member added");

        Ok(Member {
            project_id,
            user_id: user.id,
            username: user.username,
            role: membership.role,
            joined_at: user.created_at,
        })
    }

    /// Remove a member from the project. Owner only.
    ///
    /// The Owner membership is untouchable through this path, including by
    /// the owner themselves; project deletion is the only way out.
    #[instrument(skip(self), fields(actor = %actor, project_id = %project_id, target = %target))]
    pub async fn remove_member(&self, actor: Uuid, project_id: Uuid, target: Uuid) -> Result<()> {
        self.authz
            .authorize(actor, project_id, capability::REMOVE_MEMBER)
            .await?;

        let membership = self
            .store
            .get_membership(project_id, target)
            .await?
            .ok_or_else(|| CoterieError::membership_not_found(project_id, target))?;

        if membership.role == Role::Owner {
            return Err(CoterieError::cannot_remove_owner());
        }

        self.store.delete_membership(project_id, target).await?;
        info!("member removed");
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::store::MemoryStore;
    use chrono::NaiveDate;

    fn fields(name: &str) -> ProjectFields {
        ProjectFields {
            name: name.to_string(),
            description: String::new(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: None,
        }
    }

    struct Fixture {
        service: ProjectService,
        store: Arc<MemoryStore>,
        project_id: Uuid,
        owner: Uuid,
        editor: Uuid,
        reader: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let dyn_store: Arc<dyn Store> = store.clone();
        let service = ProjectService::new(dyn_store.clone(), AuthorizationEngine::new(dyn_store));

        let owner = store.create_user("alice", "alice@example.com").await.unwrap();
        let editor = store.create_user("bob", "bob@example.com").await.unwrap();
        let reader = store.create_user("carol", "carol@example.com").await.unwrap();

        let project = service.create(owner.id, &fields("Roadmap")).await.unwrap();
        store
            .create_membership(project.id, editor.id, Role::Editor)
            .await
            .unwrap();
        store
            .create_membership(project.id, reader.id, Role::Reader)
            .await
            .unwrap();

        Fixture {
            service,
            store,
            project_id: project.id,
            owner: owner.id,
            editor: editor.id,
            reader: reader.id,
        }
    }

    #[tokio::test]
    async fn test_creator_becomes_owner() {
        let fx = fixture().await;
        let membership = fx
            .store
            .get_membership(fx.project_id, fx.owner)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(membership.role, Role::Owner);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_fields() {
        let fx = fixture().await;
        let mut bad = fields("");
        bad.name = String::new();
        let err = fx.service.create(fx.owner, &bad).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_reader_cannot_update() {
        let fx = fixture().await;
        let err = fx
            .service
            .update(fx.reader, fx.project_id, &fields("Renamed"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InsufficientRole);
    }

    #[tokio::test]
    async fn test_editor_can_update_but_not_delete() {
        let fx = fixture().await;
        fx.service
            .update(fx.editor, fx.project_id, &fields("Renamed"))
            .await
            .unwrap();
        let err = fx.service.delete(fx.editor, fx.project_id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InsufficientRole);
    }

    #[tokio::test]
    async fn test_owner_delete_cascades_memberships() {
        let fx = fixture().await;
        fx.service.delete(fx.owner, fx.project_id).await.unwrap();
        assert!(fx
            .store
            .get_membership(fx.project_id, fx.owner)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_detail_includes_role_and_comments() {
        let fx = fixture().await;
        fx.store
            .create_comment(fx.project_id, fx.editor, "first")
            .await
            .unwrap();

        let detail = fx.service.detail(fx.reader, fx.project_id).await.unwrap();
        assert_eq!(detail.viewer_role, Role::Reader);
        assert_eq!(detail.comments.len(), 1);
    }

    #[tokio::test]
    async fn test_add_member_owner_only() {
        let fx = fixture().await;
        fx.store.create_user("dave", "dave@example.com").await.unwrap();

        let err = fx
            .service
            .add_member(fx.editor, fx.project_id, "dave", Role::Reader)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InsufficientRole);

        let member = fx
            .service
            .add_member(fx.owner, fx.project_id, "dave", Role::Reader)
            .await
            .unwrap();
        assert_eq!(member.username, "dave");
        assert_eq!(member.role, Role::Reader);
    }

    #[tokio::test]
    async fn test_owner_role_not_grantable() {
        let fx = fixture().await;
        fx.store.create_user("dave", "dave@example.com").await.unwrap();

        let err = fx
            .service
            .add_member(fx.owner, fx.project_id, "dave", Role::Owner)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_add_unknown_username() {
        let fx = fixture().await;
        let err = fx
            .service
            .add_member(fx.owner, fx.project_id, "nobody", Role::Reader)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnknownUser);
    }

    #[tokio::test]
    async fn test_duplicate_add_keeps_original_role() {
        let fx = fixture().await;
        let err = fx
            .service
            .add_member(fx.owner, fx.project_id, "bob", Role::Reader)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::DuplicateMembership);

        let membership = fx
            .store
            .get_membership(fx.project_id, fx.editor)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(membership.role, Role::Editor);
    }

    #[tokio::test]
    async fn test_owner_cannot_be_removed() {
        let fx = fixture().await;
        let err = fx
            .service
            .remove_member(fx.owner, fx.project_id, fx.owner)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::CannotRemoveOwner);
        assert_eq!(err.user_message(), "Cannot remove the project owner");
    }

    #[tokio::test]
    async fn test_remove_member_then_absent() {
        let fx = fixture().await;
        fx.service
            .remove_member(fx.owner, fx.project_id, fx.reader)
            .await
            .unwrap();
        let err = fx
            .service
            .remove_member(fx.owner, fx.project_id, fx.reader)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::MembershipNotFound);
    }

    #[tokio::test]
    async fn test_removed_member_loses_access() {
        let fx = fixture().await;
        fx.service
            .remove_member(fx.owner, fx.project_id, fx.reader)
            .await
            .unwrap();
        let err = fx.service.detail(fx.reader, fx.project_id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotAMember);
    }

    #[tokio::test]
    async fn test_roster_requires_owner() {
        let fx = fixture().await;
        let err = fx
            .service
            .list_members(fx.editor, fx.project_id)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InsufficientRole);

        let members = fx.service.list_members(fx.owner, fx.project_id).await.unwrap();
        assert_eq!(members.len(), 3);
    }
}
