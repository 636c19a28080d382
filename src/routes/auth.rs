use crate::{
    auth::{verify_password, LoginRequest, LoginResponse},
    error::AppError,
    state::AppState,
};
use actix_web::{post, web, HttpResponse, Responder};
use log::{info, warn};
use validator::Validate;

/// Login user
///
/// Checks the credentials and returns a bearer token plus the user's role name.
///
/// ## Responses:
/// - `200 OK`: `{token, rol}`.
/// - `400 Bad Request`: malformed body.
/// - `401 Unauthorized`: unknown email or wrong password (indistinguishable).
/// - `500 Internal Server Error`: the signing secret is missing or too short.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    state.tokens.ensure_configured()?;
    login_data.validate()?;

    let user = match state.store.find_user_by_email(&login_data.correo).await? {
        Some(user) => user,
        None => {
            warn!("Login rejected: unknown email");
            return Err(AppError::unauthorized());
        }
    };

    if !verify_password(&login_data.contrasenia, &user.password_hash)? {
        warn!("Login rejected: wrong password for user {}", user.id);
        return Err(AppError::unauthorized());
    }

    let token = state.tokens.issue(user.id)?;
    info!("User {} logged in", user.id);

    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        rol: user.role.name().map(str::to_string),
    }))
}
