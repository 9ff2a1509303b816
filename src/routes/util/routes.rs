use actix_web::web;

use super::handlers::{health_check, readiness};

pub fn util_route(cfg: &mut web::ServiceConfig) {
    cfg.route("/health_check", web::get().to(health_check))
        .route("/readiness", web::get().to(readiness));
}
