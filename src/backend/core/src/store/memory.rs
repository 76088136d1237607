//! In-memory storage backend.
//!
//! Backs the test suite and local development without a database. Mirrors
//! the structural guarantees the Postgres schema provides: membership
//! uniqueness per (project, user), atomic project+owner creation, and
//! cascade deletes.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{CoterieError, Result};
use crate::membership::{Member, Membership, Role};

use super::{Comment, Project, ProjectFields, Store, User};

/// DashMap-backed store. Cheap to clone via `Default` + `Arc` at the call
/// site; each instance is an independent universe.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, User>,
    projects: DashMap<Uuid, Project>,
    // Keyed by (project_id, user_id); the map key is the uniqueness
    // constraint.
    memberships: DashMap<(Uuid, Uuid), Membership>,
    comments: DashMap<Uuid, Comment>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    // ─────────────────────────────────────────────────────────────────────────
    // Project Operations
    // ─────────────────────────────────────────────────────────────────────────

    async fn create_project_with_owner(
        &self,
        owner_id: Uuid,
        fields: &ProjectFields,
    ) -> Result<Project> {
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            name: fields.name.clone(),
            description: fields.description.clone(),
            start_date: fields.start_date,
            end_date: fields.end_date,
            created_at: now,
            updated_at: now,
        };

        // Single-threaded equivalent of the Postgres transaction: the
        // project only becomes visible together with its Owner membership.
        self.memberships.insert(
            (project.id, owner_id),
            Membership::new(project.id, owner_id, Role::Owner),
        );
        self.projects.insert(project.id, project.clone());

        Ok(project)
    }

    async fn get_project(&self, project_id: Uuid) -> Result<Option<Project>> {
        Ok(self.projects.get(&project_id).map(|p| p.clone()))
    }

    async fn update_project(&self, project_id: Uuid, fields: &ProjectFields) -> Result<Project> {
        let mut entry = self
            .projects
            .get_mut(&project_id)
            .ok_or_else(|| CoterieError::project_not_found(project_id))?;

        entry.name = fields.name.clone();
        entry.description = fields.description.clone();
        entry.start_date = fields.start_date;
        entry.end_date = fields.end_date;
        entry.updated_at = Utc::now();

        Ok(entry.clone())
    }

    async fn delete_project(&self, project_id: Uuid) -> Result<()> {
        if self.projects.remove(&project_id).is_none() {
            return Err(CoterieError::project_not_found(project_id));
        }
        self.memberships.retain(|(pid, _), _| *pid != project_id);
        self.comments.retain(|_, c| c.project_id != project_id);
        Ok(())
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> Result<Vec<Project>> {
        let mut projects: Vec<Project> = self
            .memberships
            .iter()
            .filter(|entry| entry.key().1 == user_id)
            .filter_map(|entry| self.projects.get(&entry.key().0).map(|p| p.clone()))
            .collect();

        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(projects)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Membership Operations
    // ─────────────────────────────────────────────────────────────────────────

    async fn get_membership(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Membership>> {
        Ok(self
            .memberships
            .get(&(project_id, user_id))
            .map(|m| m.clone()))
    }

    async fn create_membership(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<Membership> {
        use dashmap::mapref::entry::Entry;

        match self.memberships.entry((project_id, user_id)) {
            Entry::Occupied(_) => {
                let username = self
                    .users
                    .get(&user_id)
                    .map(|u| u.username.clone())
                    .unwrap_or_else(|| user_id.to_string());
                Err(CoterieError::duplicate_membership(username))
            }
            Entry::Vacant(slot) => {
                let membership = Membership::new(project_id, user_id, role);
                slot.insert(membership.clone());
                Ok(membership)
            }
        }
    }

    async fn delete_membership(&self, project_id: Uuid, user_id: Uuid) -> Result<()> {
        self.memberships
            .remove(&(project_id, user_id))
            .map(|_| ())
            .ok_or_else(|| CoterieError::membership_not_found(project_id, user_id))
    }

    async fn list_members(&self, project_id: Uuid) -> Result<Vec<Member>> {
        let mut members: Vec<Member> = self
            .memberships
            .iter()
            .filter(|entry| entry.key().0 == project_id)
            .filter_map(|entry| {
                let user = self.users.get(&entry.key().1)?;
                Some(Member {
                    project_id,
                    user_id: user.id,
                    username: user.username.clone(),
                    role: entry.value().role,
                    joined_at: user.created_at,
                })
            })
            .collect();

        members.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(members)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Comment Operations
    // ─────────────────────────────────────────────────────────────────────────

    async fn create_comment(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        text: &str,
    ) -> Result<Comment> {
        let comment = Comment {
            id: Uuid::new_v4(),
            project_id,
            user_id,
            text: text.to_string(),
            created_at: Utc::now(),
        };
        self.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn get_comment(&self, project_id: Uuid, comment_id: Uuid) -> Result<Option<Comment>> {
        Ok(self
            .comments
            .get(&comment_id)
            .filter(|c| c.project_id == project_id)
            .map(|c| c.clone()))
    }

    async fn delete_comment(&self, project_id: Uuid, comment_id: Uuid) -> Result<()> {
        // Scoped removal: a comment id from another project must not match.
        let matches = self
            .comments
            .get(&comment_id)
            .map(|c| c.project_id == project_id)
            .unwrap_or(false);

        if !matches {
            return Err(CoterieError::comment_not_found(comment_id));
        }
        self.comments.remove(&comment_id);
        Ok(())
    }

    async fn list_comments(&self, project_id: Uuid) -> Result<Vec<Comment>> {
        let mut comments: Vec<Comment> = self
            .comments
            .iter()
            .filter(|c| c.project_id == project_id)
            .map(|c| c.clone())
            .collect();

        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(comments)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // User Directory
    // ─────────────────────────────────────────────────────────────────────────

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&user_id).map(|u| u.clone()))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.clone()))
    }

    async fn create_user(&self, username: &str, email: &str) -> Result<User> {
        if self.find_user_by_username(username).await?.is_some() {
            return Err(CoterieError::new(
                crate::error::ErrorCode::DuplicateRecord,
                format!("Username '{}' is already taken", username),
            ));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            created_at: Utc::now(),
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::NaiveDate;

    fn fields(name: &str) -> ProjectFields {
        ProjectFields {
            name: name.to_string(),
            description: String::new(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: None,
        }
    }

    #[tokio::test]
    async fn test_create_project_establishes_owner() {
        let store = MemoryStore::new();
        let owner = store.create_user("alice", "alice@example.com").await.unwrap();
        let project = store
            .create_project_with_owner(owner.id, &fields("Roadmap"))
            .await
            .unwrap();

        let membership = store
            .get_membership(project.id, owner.id)
            .await
            .unwrap()
            .expect("owner membership must exist");
        assert_eq!(membership.role, Role::Owner);
    }

    #[tokio::test]
    async fn test_duplicate_membership_rejected() {
        let store = MemoryStore::new();
        let owner = store.create_user("alice", "alice@example.com").await.unwrap();
        let other = store.create_user("bob", "bob@example.com").await.unwrap();
        let project = store
            .create_project_with_owner(owner.id, &fields("Roadmap"))
            .await
            .unwrap();

        store
            .create_membership(project.id, other.id, Role::Editor)
            .await
            .unwrap();
        let err = store
            .create_membership(project.id, other.id, Role::Reader)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::DuplicateMembership);

        // Still exactly one row for the pair, with the original role.
        let membership = store
            .get_membership(project.id, other.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(membership.role, Role::Editor);
    }

    #[tokio::test]
    async fn test_delete_membership_idempotence_shape() {
        let store = MemoryStore::new();
        let owner = store.create_user("alice", "alice@example.com").await.unwrap();
        let other = store.create_user("bob", "bob@example.com").await.unwrap();
        let project = store
            .create_project_with_owner(owner.id, &fields("Roadmap"))
            .await
            .unwrap();
        store
            .create_membership(project.id, other.id, Role::Reader)
            .await
            .unwrap();

        store.delete_membership(project.id, other.id).await.unwrap();
        let err = store
            .delete_membership(project.id, other.id)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::MembershipNotFound);
    }

    #[tokio::test]
    async fn test_project_delete_cascades() {
        let store = MemoryStore::new();
        let owner = store.create_user("alice", "alice@example.com").await.unwrap();
        let project = store
            .create_project_with_owner(owner.id, &fields("Roadmap"))
            .await
            .unwrap();
        store
            .create_comment(project.id, owner.id, "first")
            .await
            .unwrap();

        store.delete_project(project.id).await.unwrap();

        assert!(store.get_membership(project.id, owner.id).await.unwrap().is_none());
        assert!(store.list_comments(project.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_members_listed_by_username() {
        let store = MemoryStore::new();
        let carol = store.create_user("carol", "carol@example.com").await.unwrap();
        let alice = store.create_user("alice", "alice@example.com").await.unwrap();
        let bob = store.create_user("bob", "bob@example.com").await.unwrap();

        let project = store
            .create_project_with_owner(carol.id, &fields("Roadmap"))
            .await
            .unwrap();
        store
            .create_membership(project.id, alice.id, Role::Editor)
            .await
            .unwrap();
        store
            .create_membership(project.id, bob.id, Role::Reader)
            .await
            .unwrap();

        let members = store.list_members(project.id).await.unwrap();
        let usernames: Vec<&str> = members.iter().map(|m| m.username.as_str()).collect();
        assert_eq!(usernames, vec!["alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn test_projects_ordered_most_recently_touched_first() {
        let store = MemoryStore::new();
        let alice = store.create_user("alice", "alice@example.com").await.unwrap();

        let first = store
            .create_project_with_owner(alice.id, &fields("First"))
            .await
            .unwrap();
        let _second = store
            .create_project_with_owner(alice.id, &fields("Second"))
            .await
            .unwrap();

        // Touching the older project moves it to the front.
        store.update_project(first.id, &fields("First v2")).await.unwrap();

        let projects = store.list_projects_for_user(alice.id).await.unwrap();
        let names: Vec<&str> = projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["First v2", "Second"]);
    }

    #[tokio::test]
    async fn test_comment_scoped_to_project() {
        let store = MemoryStore::new();
        let alice = store.create_user("alice", "alice@example.com").await.unwrap();
        let p1 = store
            .create_project_with_owner(alice.id, &fields("P1"))
            .await
            .unwrap();
        let p2 = store
            .create_project_with_owner(alice.id, &fields("P2"))
            .await
            .unwrap();
        let comment = store.create_comment(p1.id, alice.id, "hello").await.unwrap();

        // Deleting through the wrong project must not match.
        let err = store.delete_comment(p2.id, comment.id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::CommentNotFound);
        assert!(store.get_comment(p1.id, comment.id).await.unwrap().is_some());
    }
}
