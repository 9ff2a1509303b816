use actix_web::web;

use super::handlers::{
    create_voucher_req, delete_voucher_req, list_voucher_req, update_voucher_req,
};
use crate::middleware::{RequireAuth, RequireRole};

pub fn voucher_route(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(list_voucher_req))
            .route(web::post().to(create_voucher_req))
            .wrap(RequireRole::admin())
            .wrap(RequireAuth),
    );
    cfg.service(
        web::resource("/{id}")
            .route(web::patch().to(update_voucher_req))
            .route(web::delete().to(delete_voucher_req))
            .wrap(RequireRole::admin())
            .wrap(RequireAuth),
    );
}
