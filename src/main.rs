use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::{info, warn};
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;

use gestor_tareas::auth::{AuthMiddleware, TokenService};
use gestor_tareas::bootstrap::{seed_defaults, DefaultAdmin};
use gestor_tareas::config::Config;
use gestor_tareas::routes::{self, health};
use gestor_tareas::store::{PgStore, Store};
use gestor_tareas::AppState;

fn startup_error(err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(startup_error)?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(startup_error)?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(startup_error)?;
    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));

    let admin = DefaultAdmin {
        email: config.admin_email.clone(),
        password: config.admin_password.clone(),
    };
    seed_defaults(store.as_ref(), &admin, config.bcrypt_cost)
        .await
        .map_err(startup_error)?;

    let tokens = TokenService::new(config.jwt_secret.as_deref());
    if !tokens.is_configured() {
        warn!("JWT_SECRET is missing or shorter than 32 bytes; logins will fail with 500");
    }

    let state = web::Data::new(AppState::new(store, tokens, config.bcrypt_cost));
    let cors_origin = config.cors_allowed_origin.clone();

    info!("Starting server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(
                Cors::default()
                    .allowed_origin(&cors_origin)
                    .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
