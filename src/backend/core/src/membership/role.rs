//! Project roles and the capability sets gating each operation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoterieError, ErrorCode};

/// A member's role within a single project.
///
/// Roles are strictly ordered by privilege: Owner > Editor > Reader. There
/// is no global role; a user's role exists only through a membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Owner,
    Editor,
    Reader,
}

impl Role {
    /// Get the role identifier string as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "Owner",
            Self::Editor => "Editor",
            Self::Reader => "Reader",
        }
    }

    /// Get the description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Owner => "Full control: update, delete, manage members, delete any comment",
            Self::Editor => "Update project fields and add comments",
            Self::Reader => "Read-only access to the project and its comments",
        }
    }

    /// All roles, highest privilege first.
    pub fn all() -> [Role; 3] {
        [Self::Owner, Self::Editor, Self::Reader]
    }

    /// Roles that may be handed out through the add-member operation.
    ///
    /// Owner is deliberately absent: ownership is only ever established at
    /// project creation, and no transfer or demotion operation exists.
    pub fn assignable() -> [Role; 2] {
        [Self::Editor, Self::Reader]
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoterieError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Owner" => Ok(Self::Owner),
            "Editor" => Ok(Self::Editor),
            "Reader" => Ok(Self::Reader),
            other => Err(CoterieError::new(
                ErrorCode::InvalidFormat,
                format!("Unknown role: {}", other),
            )),
        }
    }
}

/// Capability sets: the roles permitted to perform each operation.
///
/// Every role-sensitive entry point authorizes against exactly one of these
/// sets; no handler derives its own membership check.
pub mod capability {
    use super::Role;

    /// View the project, its members count, and its comments.
    pub const VIEW_PROJECT: &[Role] = &[Role::Owner, Role::Editor, Role::Reader];

    /// Update project fields.
    pub const UPDATE_PROJECT: &[Role] = &[Role::Owner, Role::Editor];

    /// Delete the project.
    pub const DELETE_PROJECT: &[Role] = &[Role::Owner];

    /// List members and add new members.
    pub const MANAGE_MEMBERS: &[Role] = &[Role::Owner];

    /// Remove a member.
    pub const REMOVE_MEMBER: &[Role] = &[Role::Owner];

    /// Add a comment.
    pub const ADD_COMMENT: &[Role] = &[Role::Owner, Role::Editor];

    /// Delete a comment, regardless of its author.
    pub const DELETE_COMMENT: &[Role] = &[Role::Owner];
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
