//! Project membership: roles and the membership record.
//!
//! A membership is the row linking a user to a project with an assigned
//! role; it is the unit of authorization everywhere in Coterie. Coterie
//! ships with three roles:
//!
//! | Role   | Description                                                      |
//! |--------|------------------------------------------------------------------|
//! | Owner  | Full control: update, delete, manage members, delete any comment |
//! | Editor | Update project fields and add comments                           |
//! | Reader | Read-only access to the project and its comments                 |

mod role;

pub use role::{capability, Role};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A membership row linking a user to a project with a role.
///
/// Unique per (project_id, user_id); every project holds at least one Owner
/// membership for as long as it exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
}

impl Membership {
    pub fn new(project_id: Uuid, user_id: Uuid, role: Role) -> Self {
        Self {
            project_id,
            user_id,
            role,
        }
    }
}

/// A membership joined with the member's user record, as shown on the
/// manage-members screen. Ordered by username ascending when listed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
}
