#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;

use gestor_tareas::auth::{AuthMiddleware, TokenService, MIN_HASH_COST};
use gestor_tareas::bootstrap::{seed_defaults, DefaultAdmin};
use gestor_tareas::routes::{self, health};
use gestor_tareas::store::{MemoryStore, Store};
use gestor_tareas::AppState;

pub const SECRET: &str = "test-secret-that-is-at-least-32-bytes";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "Admin123";

/// A seeded in-memory backend plus the state handed to the app.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub state: web::Data<AppState>,
}

pub async fn context() -> TestContext {
    context_with_secret(Some(SECRET)).await
}

pub async fn context_with_secret(secret: Option<&str>) -> TestContext {
    let store = Arc::new(MemoryStore::new());
    let admin = DefaultAdmin {
        email: ADMIN_EMAIL.to_string(),
        password: ADMIN_PASSWORD.to_string(),
    };
    seed_defaults(store.as_ref(), &admin, MIN_HASH_COST)
        .await
        .expect("seeding the memory store");

    let dyn_store: Arc<dyn Store> = store.clone();
    let state = web::Data::new(AppState::new(
        dyn_store,
        TokenService::new(secret),
        MIN_HASH_COST,
    ));
    TestContext { store, state }
}

/// The same service tree `main` builds, minus CORS and request logging.
pub async fn init_app(
    state: web::Data<AppState>,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(state)
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            ),
    )
    .await
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub fn future_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2099, 1, 15, 12, 0, 0).unwrap()
}

pub async fn login<S, B>(app: &S, email: &str, password: &str) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/autenticacion/login")
        .set_json(json!({ "correo": email, "contrasenia": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

pub async fn admin_token<S, B>(app: &S) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = login(app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::OK, "admin login failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

/// Provisions a member through the API and returns `(id, token)`.
pub async fn create_member<S, B>(app: &S, admin_token: &str, email: &str) -> (i32, String)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/usuarios")
        .insert_header(bearer(admin_token))
        .set_json(json!({
            "nombre": "Miembro",
            "apellido": "De Prueba",
            "correo": email,
            "contrasenia": "Password1"
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED, "member creation failed");
    let user: Value = test::read_body_json(resp).await;
    let id = user["id"].as_i64().unwrap() as i32;

    let (status, body) = login(app, email, "Password1").await;
    assert_eq!(status, StatusCode::OK, "member login failed: {}", body);
    (id, body["token"].as_str().unwrap().to_string())
}

/// Creates a task owned by `owner_id` as the administrator and returns its JSON.
pub async fn create_task<S, B>(app: &S, admin_token: &str, owner_id: i32, title: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/tareas")
        .insert_header(bearer(admin_token))
        .set_json(json!({
            "titulo": title,
            "descripcion": "Descripción de prueba",
            "estado": "Pendiente",
            "fechaLimite": future_date(),
            "usuarioId": owner_id
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED, "task creation failed");
    test::read_body_json(resp).await
}
