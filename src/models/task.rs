use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError};

use crate::auth::policy::UpdateScope;

/// Represents the status of a task, serialized with its stored Spanish label.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Task is yet to be started.
    #[serde(rename = "Pendiente")]
    Pending,
    /// Task is currently being worked on.
    #[serde(rename = "En progreso")]
    InProgress,
    /// Task is completed.
    #[serde(rename = "Completada")]
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pendiente",
            TaskStatus::InProgress => "En progreso",
            TaskStatus::Completed => "Completada",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a status label, ignoring ASCII and Unicode case.
impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str().to_lowercase() == wanted)
            .ok_or_else(|| format!("Estado desconocido: {}", s))
    }
}

/// Input structure for creating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// Between 1 and 100 characters.
    #[serde(rename = "titulo")]
    #[validate(length(min = 1, max = 100, message = "El título debe tener entre 1 y 100 caracteres."))]
    pub title: String,

    /// Between 1 and 500 characters.
    #[serde(rename = "descripcion")]
    #[validate(length(min = 1, max = 500, message = "La descripción debe tener entre 1 y 500 caracteres."))]
    pub description: String,

    #[serde(rename = "estado")]
    pub status: TaskStatus,

    /// Must lie in the future when the task is created.
    #[serde(rename = "fechaLimite")]
    #[validate(custom = "validate_future_date")]
    pub due_date: DateTime<Utc>,

    /// The owning user.
    #[serde(rename = "usuarioId")]
    pub owner_id: i32,
}

/// Input structure for updating a task. Every field is optional; what a caller
/// may actually change is decided by [`UpdateScope`].
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct TaskUpdateInput {
    #[serde(rename = "titulo", default)]
    #[validate(length(min = 1, max = 100, message = "El título debe tener entre 1 y 100 caracteres."))]
    pub title: Option<String>,

    #[serde(rename = "descripcion", default)]
    #[validate(length(min = 1, max = 500, message = "La descripción debe tener entre 1 y 500 caracteres."))]
    pub description: Option<String>,

    #[serde(rename = "estado", default)]
    pub status: Option<TaskStatus>,

    #[serde(rename = "fechaLimite", default)]
    pub due_date: Option<DateTime<Utc>>,

    #[serde(rename = "usuarioId", default)]
    pub owner_id: Option<i32>,

    /// When present, the update only applies if the stored version still matches.
    #[serde(default)]
    pub version: Option<i32>,
}

fn validate_future_date(date: &DateTime<Utc>) -> Result<(), ValidationError> {
    if *date > Utc::now() {
        return Ok(());
    }
    let mut err = ValidationError::new("future_date");
    err.message = Some("La fecha límite debe ser una fecha futura.".into());
    Err(err)
}

/// Name, surname and email of a task's owner, embedded in every task response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerSummary {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "apellido")]
    pub surname: String,
    #[serde(rename = "correo")]
    pub email: String,
}

/// The fixed projection of a task returned by every task endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskView {
    pub id: i32,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "estado")]
    pub status: TaskStatus,
    #[serde(rename = "fechaLimite")]
    pub due_date: DateTime<Utc>,
    #[serde(rename = "usuarioId")]
    pub owner_id: i32,
    pub version: i32,
    #[serde(rename = "usuario")]
    pub owner: OwnerSummary,
}

/// A validated task ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
    pub owner_id: i32,
}

impl From<TaskInput> for NewTask {
    fn from(input: TaskInput) -> Self {
        Self {
            title: input.title,
            description: input.description,
            status: input.status,
            due_date: input.due_date,
            owner_id: input.owner_id,
        }
    }
}

/// The complete set of values a task will hold after an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskChanges {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
    pub owner_id: i32,
}

impl TaskChanges {
    /// Merges `input` over `current`, keeping only what `scope` lets through.
    ///
    /// With `StatusOnly` every field but the status is taken from `current`,
    /// whatever the payload contains.
    pub fn merge(current: &TaskView, input: TaskUpdateInput, scope: UpdateScope) -> Self {
        let mut changes = Self {
            title: current.title.clone(),
            description: current.description.clone(),
            status: input.status.unwrap_or(current.status),
            due_date: current.due_date,
            owner_id: current.owner_id,
        };
        if scope == UpdateScope::AllFields {
            if let Some(title) = input.title {
                changes.title = title;
            }
            if let Some(description) = input.description {
                changes.description = description;
            }
            if let Some(due_date) = input.due_date {
                changes.due_date = due_date;
            }
            if let Some(owner_id) = input.owner_id {
                changes.owner_id = owner_id;
            }
        }
        changes
    }
}

/// Query string of `GET /api/tareas/filter`.
#[derive(Debug, Deserialize)]
pub struct StatusFilterQuery {
    pub estado: String,
}
