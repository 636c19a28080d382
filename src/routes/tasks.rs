use crate::{
    auth::{
        policy::{self, UpdateScope},
        CurrentUser,
    },
    error::AppError,
    models::{NewTask, StatusFilterQuery, TaskChanges, TaskInput, TaskUpdateInput, TaskView},
    routes::parse_json,
    state::AppState,
    store::TaskFilter,
};
use actix_web::{delete, get, http::header, post, put, web, HttpResponse, Responder};
use log::info;
use validator::Validate;

fn task_not_found() -> AppError {
    AppError::NotFound("Tarea no encontrada.".into())
}

async fn ensure_owner_exists(state: &AppState, owner_id: i32) -> Result<(), AppError> {
    match state.store.find_user(owner_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::BadRequest(format!(
            "El usuario {} no existe.",
            owner_id
        ))),
    }
}

/// Lists tasks visible to the caller.
///
/// Administrators get every task; members get only the tasks they own.
///
/// ## Responses:
/// - `200 OK`: JSON array of tasks, each with the owner's name, surname and email.
/// - `401 Unauthorized`: missing/invalid token or a user without a role.
#[get("")]
pub async fn get_tasks(
    state: web::Data<AppState>,
    current: CurrentUser,
) -> Result<impl Responder, AppError> {
    let scope = policy::task_list_scope(current.user()).ok_or_else(AppError::unauthorized)?;
    let tasks = state.store.list_tasks(&TaskFilter::new(scope)).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Lists tasks visible to the caller whose status matches `estado`, ignoring case.
///
/// ## Query Parameters:
/// - `estado`: a status label such as `pendiente` or `En Progreso`.
#[get("/filter")]
pub async fn filter_tasks(
    state: web::Data<AppState>,
    current: CurrentUser,
    query: web::Query<StatusFilterQuery>,
) -> Result<impl Responder, AppError> {
    let scope = policy::task_list_scope(current.user()).ok_or_else(AppError::unauthorized)?;
    let filter = TaskFilter::new(scope).with_status(query.into_inner().estado.trim());
    let tasks = state.store.list_tasks(&filter).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Retrieves a specific task by its ID.
///
/// The ownership check happens before anything about the task is returned.
///
/// ## Responses:
/// - `200 OK`: the task.
/// - `401 Unauthorized`: the caller is a member who does not own the task.
/// - `404 Not Found`: no task with that id.
#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    current: CurrentUser,
    task_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let task = state
        .store
        .find_task(task_id.into_inner())
        .await?
        .ok_or_else(task_not_found)?;
    policy::authorize(policy::can_read_task(current.user(), task.owner_id))?;
    Ok(HttpResponse::Ok().json(task))
}

/// Creates a new task. Administrators only.
///
/// ## Request Body:
/// `{titulo, descripcion, estado, fechaLimite, usuarioId}`; the due date must be in
/// the future and the owner must exist.
///
/// ## Responses:
/// - `201 Created`: the task, with a `Location` header.
/// - `400 Bad Request`: malformed or invalid body.
/// - `401 Unauthorized`: the caller is not an administrator.
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    current: CurrentUser,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    policy::authorize(policy::can_create_task(current.user()))?;

    let input: TaskInput = parse_json(&body)?;
    input.validate()?;
    ensure_owner_exists(&state, input.owner_id).await?;

    let task = state.store.insert_task(NewTask::from(input)).await?;
    info!("User {} created task {}", current.user().id, task.id);

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("/api/tareas/{}", task.id)))
        .json(task))
}

/// Updates an existing task.
///
/// Administrators may change any field; the member who owns the task may only
/// change its status, and any other field in the payload is ignored. Everyone
/// else is refused before the payload is even parsed.
///
/// The write is conditional on the version read here (or on the `version` given
/// in the payload), so a concurrent change yields `409 Conflict` rather than being
/// silently overwritten.
///
/// ## Responses:
/// - `200 OK`: the updated task.
/// - `400 Bad Request`: malformed or invalid body.
/// - `401 Unauthorized`: the caller may not update this task.
/// - `404 Not Found`: no task with that id.
/// - `409 Conflict`: the task changed since it was read.
#[put("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    current: CurrentUser,
    task_id: web::Path<i32>,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    let id = task_id.into_inner();
    let existing = state.store.find_task(id).await?.ok_or_else(task_not_found)?;
    let scope = policy::task_update_scope(current.user(), existing.owner_id)
        .ok_or_else(AppError::unauthorized)?;

    let input: TaskUpdateInput = parse_json(&body)?;
    input.validate()?;

    if matches!(input.version, Some(version) if version != existing.version) {
        return Err(stale_version());
    }
    if scope == UpdateScope::StatusOnly && input.status.is_none() {
        return Err(AppError::BadRequest("El estado es obligatorio.".into()));
    }

    let changes = TaskChanges::merge(&existing, input, scope);
    if changes.owner_id != existing.owner_id {
        ensure_owner_exists(&state, changes.owner_id).await?;
    }

    let updated: TaskView = state
        .store
        .update_task(id, existing.version, changes)
        .await?
        .ok_or_else(stale_version)?;
    info!(
        "User {} updated task {} ({:?}) to version {}",
        current.user().id,
        id,
        scope,
        updated.version
    );

    Ok(HttpResponse::Ok().json(updated))
}

fn stale_version() -> AppError {
    AppError::Conflict("La tarea fue modificada por otra solicitud.".into())
}

/// Deletes a task by its ID. Administrators only.
///
/// ## Responses:
/// - `200 OK`: the deleted task.
/// - `401 Unauthorized`: the caller is not an administrator.
/// - `404 Not Found`: no task with that id.
#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    current: CurrentUser,
    task_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    policy::authorize(policy::can_delete_task(current.user()))?;

    let task = state
        .store
        .delete_task(task_id.into_inner())
        .await?
        .ok_or_else(task_not_found)?;
    info!("User {} deleted task {}", current.user().id, task.id);

    Ok(HttpResponse::Ok().json(task))
}
