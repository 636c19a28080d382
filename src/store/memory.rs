use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{Store, TaskFilter, TaskScope};
use crate::error::{AppError, DUPLICATE_MESSAGE, MISSING_REFERENCE_MESSAGE};
use crate::models::{
    NewTask, NewUser, OwnerSummary, Role, RoleRecord, TaskChanges, TaskStatus, TaskView, User,
    UserChanges,
};

#[derive(Debug, Clone)]
struct UserRecord {
    name: String,
    surname: String,
    email: String,
    password_hash: String,
    role_id: Option<i32>,
}

#[derive(Debug, Clone)]
struct TaskRecord {
    title: String,
    description: String,
    status: TaskStatus,
    due_date: chrono::DateTime<chrono::Utc>,
    owner_id: i32,
    version: i32,
}

#[derive(Debug, Default)]
struct Tables {
    roles: BTreeMap<i32, String>,
    users: BTreeMap<i32, UserRecord>,
    tasks: BTreeMap<i32, TaskRecord>,
    next_role_id: i32,
    next_user_id: i32,
    next_task_id: i32,
}

impl Tables {
    fn user(&self, id: i32) -> Option<User> {
        self.users.get(&id).map(|record| {
            let role_name = record
                .role_id
                .and_then(|role_id| self.roles.get(&role_id))
                .map(String::as_str);
            User {
                id,
                name: record.name.clone(),
                surname: record.surname.clone(),
                email: record.email.clone(),
                password_hash: record.password_hash.clone(),
                role_id: record.role_id,
                role: Role::from_name(role_name),
            }
        })
    }

    fn task(&self, id: i32) -> Option<TaskView> {
        let task = self.tasks.get(&id)?;
        let owner = self.users.get(&task.owner_id)?;
        Some(TaskView {
            id,
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            due_date: task.due_date,
            owner_id: task.owner_id,
            version: task.version,
            owner: OwnerSummary {
                name: owner.name.clone(),
                surname: owner.surname.clone(),
                email: owner.email.clone(),
            },
        })
    }

    fn check_owner(&self, owner_id: i32) -> Result<(), AppError> {
        if self.users.contains_key(&owner_id) {
            Ok(())
        } else {
            Err(AppError::BadRequest(MISSING_REFERENCE_MESSAGE.into()))
        }
    }

    fn check_email_unique(&self, email: &str, except: Option<i32>) -> Result<(), AppError> {
        if self
            .users
            .iter()
            .any(|(id, user)| Some(*id) != except && user.email == email)
        {
            return Err(AppError::BadRequest(DUPLICATE_MESSAGE.into()));
        }
        Ok(())
    }
}

/// In-process [`Store`] with the same observable behavior as the Postgres one,
/// including the email uniqueness constraint, the owner foreign key and the
/// cascade from users to their tasks.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ensure_role(&self, name: &str) -> Result<RoleRecord, AppError> {
        let mut tables = self.tables.write().await;
        if let Some((id, _)) = tables.roles.iter().find(|(_, n)| n.as_str() == name) {
            return Ok(RoleRecord {
                id: *id,
                name: name.to_string(),
            });
        }
        tables.next_role_id += 1;
        let id = tables.next_role_id;
        tables.roles.insert(id, name.to_string());
        Ok(RoleRecord {
            id,
            name: name.to_string(),
        })
    }

    async fn find_role(&self, id: i32) -> Result<Option<RoleRecord>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.roles.get(&id).map(|name| RoleRecord {
            id,
            name: name.clone(),
        }))
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<RoleRecord>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .roles
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(id, n)| RoleRecord {
                id: *id,
                name: n.clone(),
            }))
    }

    async fn find_user(&self, id: i32) -> Result<Option<User>, AppError> {
        Ok(self.tables.read().await.user(id))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        let id = tables
            .users
            .iter()
            .find(|(_, user)| user.email == email)
            .map(|(id, _)| *id);
        Ok(id.and_then(|id| tables.user(id)))
    }

    async fn email_taken(&self, email: &str, except: Option<i32>) -> Result<bool, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.check_email_unique(email, except).is_err())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.keys().filter_map(|id| tables.user(*id)).collect())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        tables.check_email_unique(&user.email, None)?;
        tables.next_user_id += 1;
        let id = tables.next_user_id;
        tables.users.insert(
            id,
            UserRecord {
                name: user.name,
                surname: user.surname,
                email: user.email,
                password_hash: user.password_hash,
                role_id: Some(user.role_id),
            },
        );
        tables
            .user(id)
            .ok_or_else(|| AppError::InternalServerError("inserted user vanished".into()))
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> Result<Option<User>, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&id) {
            return Ok(None);
        }
        tables.check_email_unique(&changes.email, Some(id))?;
        if let Some(record) = tables.users.get_mut(&id) {
            record.name = changes.name;
            record.surname = changes.surname;
            record.email = changes.email;
            if let Some(hash) = changes.password_hash {
                record.password_hash = hash;
            }
            if let Some(role_id) = changes.role_id {
                record.role_id = Some(role_id);
            }
        }
        Ok(tables.user(id))
    }

    async fn delete_user(&self, id: i32) -> Result<Option<User>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(user) = tables.user(id) else {
            return Ok(None);
        };
        tables.users.remove(&id);
        tables.tasks.retain(|_, task| task.owner_id != id);
        Ok(Some(user))
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskView>, AppError> {
        let tables = self.tables.read().await;
        let wanted_status = filter.status.as_ref().map(|s| s.to_lowercase());
        Ok(tables
            .tasks
            .iter()
            .filter(|(_, task)| match filter.scope {
                TaskScope::All => true,
                TaskScope::OwnedBy(owner_id) => task.owner_id == owner_id,
            })
            .filter(|(_, task)| match &wanted_status {
                Some(status) => task.status.as_str().to_lowercase() == *status,
                None => true,
            })
            .filter_map(|(id, _)| tables.task(*id))
            .collect())
    }

    async fn find_task(&self, id: i32) -> Result<Option<TaskView>, AppError> {
        Ok(self.tables.read().await.task(id))
    }

    async fn insert_task(&self, task: NewTask) -> Result<TaskView, AppError> {
        let mut tables = self.tables.write().await;
        tables.check_owner(task.owner_id)?;
        tables.next_task_id += 1;
        let id = tables.next_task_id;
        tables.tasks.insert(
            id,
            TaskRecord {
                title: task.title,
                description: task.description,
                status: task.status,
                due_date: task.due_date,
                owner_id: task.owner_id,
                version: 1,
            },
        );
        tables
            .task(id)
            .ok_or_else(|| AppError::InternalServerError("inserted task vanished".into()))
    }

    async fn update_task(
        &self,
        id: i32,
        expected_version: i32,
        changes: TaskChanges,
    ) -> Result<Option<TaskView>, AppError> {
        let mut tables = self.tables.write().await;
        match tables.tasks.get(&id) {
            Some(task) if task.version == expected_version => {}
            _ => return Ok(None),
        }
        tables.check_owner(changes.owner_id)?;
        if let Some(task) = tables.tasks.get_mut(&id) {
            task.title = changes.title;
            task.description = changes.description;
            task.status = changes.status;
            task.due_date = changes.due_date;
            task.owner_id = changes.owner_id;
            task.version += 1;
        }
        Ok(tables.task(id))
    }

    async fn delete_task(&self, id: i32) -> Result<Option<TaskView>, AppError> {
        let mut tables = self.tables.write().await;
        let view = tables.task(id);
        if view.is_some() {
            tables.tasks.remove(&id);
        }
        Ok(view)
    }
}
