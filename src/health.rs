//! Liveness endpoints served by the stand-alone `ruhverse-health` process.

use actix_web::{web, HttpResponse, Responder};

pub const GREETING: &str = "RuhVerse Backend is running!";

pub async fn index() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "message": GREETING }))
}

pub async fn health() -> impl Responder {
    HttpResponse::Ok().content_type("text/plain; charset=utf-8").body("OK")
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/health", web::get().to(health));
}
