use actix_web::web;

use super::handlers::{
    admin_get_order_req, admin_list_order_req, admin_update_status_req, get_order_req,
    list_order_req,
};
use crate::middleware::{RequireAuth, RequireRole};

pub fn order_route(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/admin/list")
            .route(web::get().to(admin_list_order_req))
            .wrap(RequireRole::admin())
            .wrap(RequireAuth),
    );
    cfg.service(
        web::resource("/admin/{id}")
            .route(web::get().to(admin_get_order_req))
            .wrap(RequireRole::admin())
            .wrap(RequireAuth),
    );
    cfg.service(
        web::resource("/admin/{id}/status")
            .route(web::patch().to(admin_update_status_req))
            .wrap(RequireRole::admin())
            .wrap(RequireAuth),
    );
    cfg.service(
        web::resource("")
            .route(web::get().to(list_order_req))
            .wrap(RequireAuth),
    );
    cfg.service(
        web::resource("/{id}")
            .route(web::get().to(get_order_req))
            .wrap(RequireAuth),
    );
}
