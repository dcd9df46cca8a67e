use std::time::Instant;

use actix_web::{get, web, HttpResponse};
use chrono::Utc;
use serde_json::json;

pub struct ServerStarted(pub Instant);

#[get("/health")]
pub async fn health(started: web::Data<ServerStarted>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": Utc::now(),
        "uptime": started.0.elapsed().as_secs_f64(),
    }))
}
