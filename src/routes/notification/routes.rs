use actix_web::web;

use super::handlers::{list_notification_req, mark_all_read_req, mark_read_req, unread_count_req};
use crate::middleware::RequireAuth;

pub fn notification_route(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(list_notification_req))
            .wrap(RequireAuth),
    );
    cfg.service(
        web::resource("/unread-count")
            .route(web::get().to(unread_count_req))
            .wrap(RequireAuth),
    );
    cfg.service(
        web::resource("/read-all")
            .route(web::patch().to(mark_all_read_req))
            .wrap(RequireAuth),
    );
    cfg.service(
        web::resource("/{id}/read")
            .route(web::patch().to(mark_read_req))
            .wrap(RequireAuth),
    );
}
