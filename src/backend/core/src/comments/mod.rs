//! Comment thread operations.
//!
//! Comments hang off projects and inherit the project's access model:
//! Owners and Editors write, Readers read, Owners moderate. A comment id is
//! only meaningful inside its project; addressing one through the wrong
//! project behaves as if it did not exist.

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::authz::AuthorizationEngine;
use crate::error::{CoterieError, Result};
use crate::membership::capability;
use crate::store::{Comment, Store};
use crate::validation::validate_comment_text;

#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn Store>,
    authz: AuthorizationEngine,
}

impl CommentService {
    pub fn new(store: Arc<dyn Store>, authz: AuthorizationEngine) -> Self {
        Self { store, authz }
    }

    /// The project's comment thread, newest first. Any member may read.
    pub async fn list(&self, user_id: Uuid, project_id: Uuid) -> Result<Vec<Comment>> {
        self.authz
            .authorize(user_id, project_id, capability::VIEW_PROJECT)
            .await?;
        self.store.list_comments(project_id).await
    }

    /// Post a comment. Owners and Editors only; the text is trimmed and
    /// length-checked before it touches the store.
    #[instrument(skip(self, text), fields(user_id = %user_id, project_id = %project_id))]
    pub async fn add(&self, user_id: Uuid, project_id: Uuid, text: &str) -> Result<Comment> {
        self.authz
            .authorize(user_id, project_id, capability::ADD_COMMENT)
            .await?;
        let text = validate_comment_text(text)?;
        let comment = self.store.create_comment(project_id, user_id, text).await?;
        info!(comment_id = %comment.id, "comment added");
        Ok(comment)
    }

    /// Delete a comment. Owner only, regardless of who wrote it.
    #[instrument(skip(self), fields(user_id = %user_id, project_id = %project_id, comment_id = %comment_id))]
    pub async fn remove(&self, user_id: Uuid, project_id: Uuid, comment_id: Uuid) -> Result<()> {
        self.authz
            .authorize(user_id, project_id, capability::DELETE_COMMENT)
            .await?;

        // Scoped lookup first so a foreign comment id reads as missing.
        self.store
            .get_comment(project_id, comment_id)
            .await?
            .ok_or_else(|| CoterieError::comment_not_found(comment_id))?;

        self.store.delete_comment(project_id, comment_id).await?;
        info!("comment removed");
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
    use crate::membership::Role;
    use crate::store::{MemoryStore, ProjectFields};
    use chrono::NaiveDate;

    struct Fixture {
        service: CommentService,
        store: Arc<MemoryStore>,
        project_id: Uuid,
        owner: Uuid,
        editor: Uuid,
        reader: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let dyn_store: Arc<dyn Store> = store.clone();
        let service = CommentService::new(dyn_store.clone(), AuthorizationEngine::new(dyn_store));

        let owner = store.create_user("alice", "alice@example.com").await.unwrap();
        let editor = store.create_user("bob", "bob@example.com").await.unwrap();
        let reader = store.create_user("carol", "carol@example.com").await.unwrap();

        let project = store
            .create_project_with_owner(
                owner.id,
                &ProjectFields {
                    name: "Roadmap".into(),
                    description: String::new(),
                    start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                    end_date: None,
                },
            )
            .await
            .unwrap();
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
    async fn test_editor_can_comment_reader_cannot() {
        let fx = fixture().await;
        fx.service.add(fx.editor, fx.project_id, "hello").await.unwrap();

        let err = fx
            .service
            .add(fx.reader, fx.project_id, "hello")
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InsufficientRole);
    }

    #[tokio::test]
    async fn test_text_is_trimmed_and_bounded() {
        let fx = fixture().await;
        let comment = fx
            .service
            .add(fx.owner, fx.project_id, "  spaced out  ")
            .await
            .unwrap();
        assert_eq!(comment.text, "spaced out");

        let err = fx
            .service
            .add(fx.owner, fx.project_id, &"x".repeat(501))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_only_owner_moderates() {
        let fx = fixture().await;
        let comment = fx.service.add(fx.editor, fx.project_id, "mine").await.unwrap();

        // Not even the author may delete without the Owner role.
        let err = fx
            .service
            .remove(fx.editor, fx.project_id, comment.id)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InsufficientRole);

        fx.service.remove(fx.owner, fx.project_id, comment.id).await.unwrap();
        assert!(fx
            .store
            .get_comment(fx.project_id, comment.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_foreign_comment_id_reads_as_missing() {
        let fx = fixture().await;
        let other = fx
            .store
            .create_project_with_owner(
                fx.owner,
                &ProjectFields {
                    name: "Other".into(),
                    description: String::new(),
                    start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                    end_date: None,
                },
            )
            .await
            .unwrap();
        let comment = fx.service.add(fx.owner, other.id, "elsewhere").await.unwrap();

        let err = fx
            .service
            .remove(fx.owner, fx.project_id, comment.id)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::CommentNotFound);
    }

    #[tokio::test]
    async fn test_thread_newest_first() {
        let fx = fixture().await;
        fx.service.add(fx.owner, fx.project_id, "first").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        fx.service.add(fx.owner, fx.project_id, "second").await.unwrap();

        let thread = fx.service.list(fx.reader, fx.project_id).await.unwrap();
        let texts: Vec<&str> = thread.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_outsider_cannot_read_thread() {
        let fx = fixture().await;
        let outsider = fx.store.create_user("dave", "dave@example.com").await.unwrap();
        let err = fx.service.list(outsider.id, fx.project_id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotAMember);
    }
}
