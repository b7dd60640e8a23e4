use actix_web::{HttpResponse, Responder};

use bankroll::models::HealthResponse;

/// Health check endpoint
pub async fn health_check() -> impl Responder {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    HttpResponse::Ok().json(response)
}
