use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::{Store, TaskFilter, TaskScope};
use crate::error::AppError;
use crate::models::{
    NewTask, NewUser, OwnerSummary, Role, RoleRecord, TaskChanges, TaskView, User, UserChanges,
};

/// Columns selected for a user, with the role name joined in. Expects the user
/// relation aliased as `u` and `roles` as `r`.
const USER_COLUMNS: &str =
    "u.id, u.name, u.surname, u.email, u.password_hash, u.role_id, r.name AS role_name";

/// Columns selected for a task projection. Expects the task relation aliased as
/// `t` and the owner as `o`.
const TASK_COLUMNS: &str = "t.id, t.title, t.description, t.status, t.due_date, t.user_id, \
     t.version, o.name AS owner_name, o.surname AS owner_surname, o.email AS owner_email";

#[derive(Debug, FromRow)]
struct UserRow {
    id: i32,
    name: String,
    surname: String,
    email: String,
    password_hash: String,
    role_id: Option<i32>,
    role_name: Option<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            surname: row.surname,
            email: row.email,
            password_hash: row.password_hash,
            role_id: row.role_id,
            role: Role::from_name(row.role_name.as_deref()),
        }
    }
}

#[derive(Debug, FromRow)]
struct TaskRow {
    id: i32,
    title: String,
    description: String,
    status: String,
    due_date: DateTime<Utc>,
    user_id: i32,
    version: i32,
    owner_name: String,
    owner_surname: String,
    owner_email: String,
}

impl TryFrom<TaskRow> for TaskView {
    type Error = AppError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(AppError::DatabaseError)?;
        Ok(TaskView {
            id: row.id,
            title: row.title,
            description: row.description,
            status,
            due_date: row.due_date,
            owner_id: row.user_id,
            version: row.version,
            owner: OwnerSummary {
                name: row.owner_name,
                surname: row.owner_surname,
                email: row.owner_email,
            },
        })
    }
}

fn into_views(rows: Vec<TaskRow>) -> Result<Vec<TaskView>, AppError> {
    rows.into_iter().map(TaskView::try_from).collect()
}

/// [`Store`] over PostgreSQL. The schema lives in `migrations/0001_init.sql`.
///
/// Writes that return a projection are single statements (`WITH ... RETURNING`
/// joined with the related rows), so nothing is read and written in separate
/// round trips.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ensure_role(&self, name: &str) -> Result<RoleRecord, AppError> {
        let role = sqlx::query_as::<_, RoleRecord>(
            "INSERT INTO roles (name) VALUES ($1)
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
             RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(role)
    }

    async fn find_role(&self, id: i32) -> Result<Option<RoleRecord>, AppError> {
        let role = sqlx::query_as::<_, RoleRecord>("SELECT id, name FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<RoleRecord>, AppError> {
        let role = sqlx::query_as::<_, RoleRecord>("SELECT id, name FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    async fn find_user(&self, id: i32) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users u LEFT JOIN roles r ON r.id = u.role_id WHERE u.id = $1"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users u LEFT JOIN roles r ON r.id = u.role_id WHERE u.email = $1"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn email_taken(&self, email: &str, except: Option<i32>) -> Result<bool, AppError> {
        let (taken,) = sqlx::query_as::<_, (bool,)>(
            "SELECT EXISTS (
                 SELECT 1 FROM users WHERE email = $1 AND ($2::INT IS NULL OR id <> $2)
             )",
        )
        .bind(email)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users u LEFT JOIN roles r ON r.id = u.role_id ORDER BY u.id"
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let sql = format!(
            "WITH u AS (
                 INSERT INTO users (name, surname, email, password_hash, role_id)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING *
             )
             SELECT {USER_COLUMNS} FROM u LEFT JOIN roles r ON r.id = u.role_id"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.name)
            .bind(user.surname)
            .bind(user.email)
            .bind(user.password_hash)
            .bind(user.role_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> Result<Option<User>, AppError> {
        let sql = format!(
            "WITH u AS (
                 UPDATE users
                 SET name = $1, surname = $2, email = $3,
                     password_hash = COALESCE($4, password_hash),
                     role_id = COALESCE($5, role_id)
                 WHERE id = $6
                 RETURNING *
             )
             SELECT {USER_COLUMNS} FROM u LEFT JOIN roles r ON r.id = u.role_id"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(changes.name)
            .bind(changes.surname)
            .bind(changes.email)
            .bind(changes.password_hash)
            .bind(changes.role_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn delete_user(&self, id: i32) -> Result<Option<User>, AppError> {
        // tasks.user_id is ON DELETE CASCADE
        let sql = format!(
            "WITH u AS (DELETE FROM users WHERE id = $1 RETURNING *)
             SELECT {USER_COLUMNS} FROM u LEFT JOIN roles r ON r.id = u.role_id"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskView>, AppError> {
        let owner = match filter.scope {
            TaskScope::All => None,
            TaskScope::OwnedBy(owner_id) => Some(owner_id),
        };
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks t JOIN users o ON o.id = t.user_id
             WHERE ($1::INT IS NULL OR t.user_id = $1)
               AND ($2::TEXT IS NULL OR LOWER(t.status) = LOWER($2))
             ORDER BY t.id"
        );
        let rows = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(owner)
            .bind(filter.status.as_deref())
            .fetch_all(&self.pool)
            .await?;
        into_views(rows)
    }

    async fn find_task(&self, id: i32) -> Result<Option<TaskView>, AppError> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks t JOIN users o ON o.id = t.user_id WHERE t.id = $1"
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TaskView::try_from).transpose()
    }

    async fn insert_task(&self, task: NewTask) -> Result<TaskView, AppError> {
        let sql = format!(
            "WITH t AS (
                 INSERT INTO tasks (title, description, status, due_date, user_id)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING *
             )
             SELECT {TASK_COLUMNS} FROM t JOIN users o ON o.id = t.user_id"
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(task.title)
            .bind(task.description)
            .bind(task.status.as_str())
            .bind(task.due_date)
            .bind(task.owner_id)
            .fetch_one(&self.pool)
            .await?;
        row.try_into()
    }

    async fn update_task(
        &self,
        id: i32,
        expected_version: i32,
        changes: TaskChanges,
    ) -> Result<Option<TaskView>, AppError> {
        let sql = format!(
            "WITH t AS (
                 UPDATE tasks
                 SET title = $1, description = $2, status = $3, due_date = $4, user_id = $5,
                     version = version + 1
                 WHERE id = $6 AND version = $7
                 RETURNING *
             )
             SELECT {TASK_COLUMNS} FROM t JOIN users o ON o.id = t.user_id"
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(changes.title)
            .bind(changes.description)
            .bind(changes.status.as_str())
            .bind(changes.due_date)
            .bind(changes.owner_id)
            .bind(id)
            .bind(expected_version)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TaskView::try_from).transpose()
    }

    async fn delete_task(&self, id: i32) -> Result<Option<TaskView>, AppError> {
        let sql = format!(
            "WITH t AS (DELETE FROM tasks WHERE id = $1 RETURNING *)
             SELECT {TASK_COLUMNS} FROM t JOIN users o ON o.id = t.user_id"
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TaskView::try_from).transpose()
    }
}
