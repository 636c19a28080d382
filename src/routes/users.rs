use crate::{
    auth::{hash_password, policy, CurrentUser},
    error::AppError,
    models::{NewUser, RoleRecord, UserChanges, UserInput, UserUpdateInput, UserView, MEMBER_ROLE_NAME},
    routes::parse_json,
    state::AppState,
};
use actix_web::{delete, get, http::header, post, put, web, HttpResponse, Responder};
use log::info;
use validator::Validate;

fn user_not_found() -> AppError {
    AppError::NotFound("Usuario no encontrado.".into())
}

fn require_admin(current: &CurrentUser) -> Result<(), AppError> {
    policy::authorize(policy::can_manage_users(current.user()))
}

async fn ensure_email_available(
    state: &AppState,
    email: &str,
    except: Option<i32>,
) -> Result<(), AppError> {
    if state.store.email_taken(email, except).await? {
        return Err(AppError::BadRequest(format!(
            "El correo {} ya está registrado. Por favor, use un correo diferente.",
            email
        )));
    }
    Ok(())
}

async fn resolve_role(state: &AppState, role_id: i32) -> Result<RoleRecord, AppError> {
    state
        .store
        .find_role(role_id)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("El rol {} no existe.", role_id)))
}

/// Lists every user. Administrators only.
#[get("")]
pub async fn get_users(
    state: web::Data<AppState>,
    current: CurrentUser,
) -> Result<impl Responder, AppError> {
    require_admin(&current)?;
    let users: Vec<UserView> = state
        .store
        .list_users()
        .await?
        .iter()
        .map(|user| user.view())
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

/// Retrieves one user. Administrators only.
#[get("/{id}")]
pub async fn get_user(
    state: web::Data<AppState>,
    current: CurrentUser,
    user_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    require_admin(&current)?;
    let user = state
        .store
        .find_user(user_id.into_inner())
        .await?
        .ok_or_else(user_not_found)?;
    Ok(HttpResponse::Ok().json(user.view()))
}

/// Provisions a user. Administrators only.
///
/// The password is hashed before it is stored. A missing or zero `rolId` assigns
/// the member role.
///
/// ## Responses:
/// - `201 Created`: the user, with a `Location` header.
/// - `400 Bad Request`: invalid body, unknown role or an email already in use.
/// - `401 Unauthorized`: the caller is not an administrator.
#[post("")]
pub async fn create_user(
    state: web::Data<AppState>,
    current: CurrentUser,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    require_admin(&current)?;

    let input: UserInput = parse_json(&body)?;
    input.validate()?;
    ensure_email_available(&state, &input.email, None).await?;

    let role = match input.role_id.filter(|id| *id != 0) {
        Some(role_id) => resolve_role(&state, role_id).await?,
        None => state
            .store
            .find_role_by_name(MEMBER_ROLE_NAME)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest("No se encontró el rol 'Miembro' en la base de datos.".into())
            })?,
    };

    let user = state
        .store
        .insert_user(NewUser {
            password_hash: hash_password(&input.password, state.password_cost)?,
            name: input.name,
            surname: input.surname,
            email: input.email,
            role_id: role.id,
        })
        .await?;
    info!("User {} created user {}", current.user().id, user.id);

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("/api/usuarios/{}", user.id)))
        .json(user.view()))
}

/// Replaces a user's data. Administrators only.
///
/// An absent or empty `contrasenia` keeps the stored password; an absent `rolId`
/// keeps the current role.
#[put("/{id}")]
pub async fn update_user(
    state: web::Data<AppState>,
    current: CurrentUser,
    user_id: web::Path<i32>,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    require_admin(&current)?;
    let id = user_id.into_inner();

    let input: UserUpdateInput = parse_json(&body)?;
    input.validate()?;

    if state.store.find_user(id).await?.is_none() {
        return Err(user_not_found());
    }
    ensure_email_available(&state, &input.email, Some(id)).await?;

    let role_id = match input.role_id {
        Some(role_id) => Some(resolve_role(&state, role_id).await?.id),
        None => None,
    };
    let password_hash = match input.new_password() {
        Some(password) => Some(hash_password(password, state.password_cost)?),
        None => None,
    };

    let user = state
        .store
        .update_user(
            id,
            UserChanges {
                name: input.name,
                surname: input.surname,
                email: input.email,
                password_hash,
                role_id,
            },
        )
        .await?
        .ok_or_else(user_not_found)?;
    info!("User {} updated user {}", current.user().id, user.id);

    Ok(HttpResponse::Ok().json(user.view()))
}

/// Deletes a user and the tasks it owns. Administrators only.
#[delete("/{id}")]
pub async fn delete_user(
    state: web::Data<AppState>,
    current: CurrentUser,
    user_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    require_admin(&current)?;

    let user = state
        .store
        .delete_user(user_id.into_inner())
        .await?
        .ok_or_else(user_not_found)?;
    info!("User {} deleted user {}", current.user().id, user.id);

    Ok(HttpResponse::Ok().json(user.view()))
}
