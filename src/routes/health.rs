use actix_web::{get, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

const SERVICE_NAME: &str = env!("CARGO_PKG_NAME");
const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Liveness probe for load balancers and the frontend, reachable without a token.
/// Reports which build of the task service is answering.
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": SERVICE_VERSION,
        "timestamp": Utc::now()
    }))
}
