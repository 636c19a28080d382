use serde::{Deserialize, Serialize};

/// Stored name of the administrator role.
pub const ADMIN_ROLE_NAME: &str = "Administrador";
/// Stored name of the member role.
pub const MEMBER_ROLE_NAME: &str = "Miembro";

/// The permission class of a user.
///
/// Roles live in their own table and users reference them by id. A user whose
/// reference is missing, or points at a role this service does not know, is
/// `Unassigned` and is granted nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Member,
    Unassigned,
}

impl Role {
    /// Maps a stored role name (if any) onto a `Role`.
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some(ADMIN_ROLE_NAME) => Role::Admin,
            Some(MEMBER_ROLE_NAME) => Role::Member,
            _ => Role::Unassigned,
        }
    }

    /// The stored name, `None` for `Unassigned`.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            Role::Admin => Some(ADMIN_ROLE_NAME),
            Role::Member => Some(MEMBER_ROLE_NAME),
            Role::Unassigned => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn is_member(&self) -> bool {
        matches!(self, Role::Member)
    }
}

/// A row of the `roles` reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RoleRecord {
    pub id: i32,
    pub name: String,
}

impl RoleRecord {
    pub fn role(&self) -> Role {
        Role::from_name(Some(&self.name))
    }
}
