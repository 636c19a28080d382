//! Persistence of roles, users and tasks.
//!
//! Handlers only see the [`Store`] trait. [`postgres::PgStore`] backs the running
//! service; [`memory::MemoryStore`] implements the same contract in process and is
//! what the test suites run against.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{NewTask, NewUser, RoleRecord, TaskChanges, TaskView, User, UserChanges};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Which tasks a listing may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskScope {
    All,
    OwnedBy(i32),
}

/// Criteria for listing tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    pub scope: TaskScope,
    /// Case-insensitive match on the stored status label.
    pub status: Option<String>,
}

impl TaskFilter {
    pub fn new(scope: TaskScope) -> Self {
        Self {
            scope,
            status: None,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Returns the role with `name`, creating it when missing.
    async fn ensure_role(&self, name: &str) -> Result<RoleRecord, AppError>;
    async fn find_role(&self, id: i32) -> Result<Option<RoleRecord>, AppError>;
    async fn find_role_by_name(&self, name: &str) -> Result<Option<RoleRecord>, AppError>;

    async fn find_user(&self, id: i32) -> Result<Option<User>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    /// Whether another user (other than `except`) already uses `email`.
    async fn email_taken(&self, email: &str, except: Option<i32>) -> Result<bool, AppError>;
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError>;
    async fn update_user(&self, id: i32, changes: UserChanges) -> Result<Option<User>, AppError>;
    /// Removes the user and every task it owns.
    async fn delete_user(&self, id: i32) -> Result<Option<User>, AppError>;

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskView>, AppError>;
    async fn find_task(&self, id: i32) -> Result<Option<TaskView>, AppError>;
    async fn insert_task(&self, task: NewTask) -> Result<TaskView, AppError>;
    /// Applies `changes` only if the task still has `expected_version`, bumping
    /// the version. `None` means the task is gone or was changed concurrently.
    async fn update_task(
        &self,
        id: i32,
        expected_version: i32,
        changes: TaskChanges,
    ) -> Result<Option<TaskView>, AppError>;
    async fn delete_task(&self, id: i32) -> Result<Option<TaskView>, AppError>;
}
