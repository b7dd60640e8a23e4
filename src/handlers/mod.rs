pub mod bank;
pub mod health;

use actix_web::web;

/// Register every API route
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check))
        .route("/suggest", web::post().to(bank::suggest))
        .route("/curve", web::post().to(bank::curve))
        .route("/progression", web::post().to(bank::progression))
        .route("/stats", web::get().to(bank::stats))
        .route("/bank", web::get().to(bank::get_bank))
        .route("/bank", web::put().to(bank::put_bank))
        .route("/bank/reconcile", web::post().to(bank::reconcile_bank));
}
