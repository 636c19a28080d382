//! Authorization decisions.
//!
//! Everything here is a pure function of the resolved caller (and, for task
//! rules, the task's owner). Handlers turn a `false`/`None` into
//! `AppError::Unauthorized` through [`authorize`], so a denial looks exactly like
//! an authentication failure to the client.
//!
//! | Task operation | Admin      | Member (owner) | Member (non-owner) |
//! |----------------|------------|----------------|--------------------|
//! | List           | all tasks  | own tasks only | n/a                |
//! | Read one       | any task   | own task       | denied             |
//! | Create         | allowed    | denied         | denied             |
//! | Update         | all fields | status only    | denied             |
//! | Delete         | allowed    | denied         | denied             |
//!
//! Every user operation is administrator-only.

use crate::error::AppError;
use crate::models::User;
use crate::store::TaskScope;

/// What an allowed task update may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateScope {
    AllFields,
    StatusOnly,
}

pub fn is_admin(user: Option<&User>) -> bool {
    user.map_or(false, |u| u.role.is_admin())
}

pub fn is_member(user: Option<&User>) -> bool {
    user.map_or(false, |u| u.role.is_member())
}

/// Which tasks `user` may list; `None` when it may list nothing.
pub fn task_list_scope(user: &User) -> Option<TaskScope> {
    if is_admin(Some(user)) {
        Some(TaskScope::All)
    } else if is_member(Some(user)) {
        Some(TaskScope::OwnedBy(user.id))
    } else {
        None
    }
}

pub fn can_read_task(user: &User, owner_id: i32) -> bool {
    is_admin(Some(user)) || (is_member(Some(user)) && user.id == owner_id)
}

pub fn can_create_task(user: &User) -> bool {
    is_admin(Some(user))
}

pub fn task_update_scope(user: &User, owner_id: i32) -> Option<UpdateScope> {
    if is_admin(Some(user)) {
        Some(UpdateScope::AllFields)
    } else if is_member(Some(user)) && user.id == owner_id {
        Some(UpdateScope::StatusOnly)
    } else {
        None
    }
}

pub fn can_delete_task(user: &User) -> bool {
    is_admin(Some(user))
}

pub fn can_manage_users(user: &User) -> bool {
    is_admin(Some(user))
}

/// Maps a decision onto the uniform 401 outcome.
pub fn authorize(allowed: bool) -> Result<(), AppError> {
    if allowed {
        Ok(())
    } else {
        Err(AppError::unauthorized())
    }
}
