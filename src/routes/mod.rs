pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;

use actix_web::{error, web};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Registers every `/api` route. Meant to be mounted under a `web::scope("/api")`
/// wrapped in `AuthMiddleware`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .service(web::scope("/autenticacion").service(auth::login))
        .service(
            web::scope("/tareas")
                .service(tasks::get_tasks)
                // before "/{id}", which would otherwise capture "filter"
                .service(tasks::filter_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        )
        .service(
            web::scope("/usuarios")
                .service(users::get_users)
                .service(users::create_user)
                .service(users::get_user)
                .service(users::update_user)
                .service(users::delete_user),
        );
}

/// Renders JSON extraction failures with the application's error shape.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| error::Error::from(AppError::BadRequest(err.to_string())))
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| error::Error::from(AppError::BadRequest(err.to_string())))
}

/// Deserializes a request body once the caller has been authorized.
pub(crate) fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Datos inválidos: {}", e)))
}
