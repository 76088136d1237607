//! Authorization engine.
//!
//! Every role-sensitive operation funnels through [`AuthorizationEngine::authorize`]
//! with one of the capability sets from [`crate::membership::capability`].
//! The check is two-staged and the staging is observable:
//!
//! 1. No membership at all → `NotAMember`, which surfaces to clients as a
//!    404 identical to a nonexistent project. Outsiders cannot distinguish
//!    "this project exists but you are not in it" from "no such project".
//! 2. Membership exists but the role is not in the allowed set →
//!    `InsufficientRole` (403). Members learn the project exists; they just
//!    cannot perform this action.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::{CoterieError, Result};
use crate::membership::{Membership, Role};
use crate::store::Store;

/// Membership-based authorization over a storage backend.
#[derive(Clone)]
pub struct AuthorizationEngine {
    store: Arc<dyn Store>,
}

impl AuthorizationEngine {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Authorize `user_id` to act on `project_id` with any of the roles in
    /// `allowed`, returning the membership on success.
    ///
    /// The membership lookup happens before the role comparison; an empty
    /// `allowed` set therefore still yields `NotAMember` for outsiders and
    /// `InsufficientRole` for members.
    pub async fn authorize(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        allowed: &[Role],
    ) -> Result<Membership> {
        let membership = self
            .store
            .get_membership(project_id, user_id)
            .await?
            .ok_or_else(|| CoterieError::not_a_member(project_id))?;

        if !allowed.contains(&membership.role) {
            debug!(
                %user_id,
                %project_id,
                role = %membership.role,
                "role not in allowed set"
            );
            return Err(CoterieError::insufficient_role(membership.role, allowed));
        }

        Ok(membership)
    }

    /// Fetch the membership without a role gate. Used by operations that
    /// only require the user to be a member of any role.
    pub async fn require_membership(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<Membership> {
        self.store
            .get_membership(project_id, user_id)
            .await?
            .ok_or_else(|| CoterieError::not_a_member(project_id))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
