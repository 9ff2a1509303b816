use actix_web::web;

use super::handlers::{create_address_req, delete_address_req, list_addresses, set_default};
use crate::middleware::RequireAuth;

pub fn address_route(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::post().to(create_address_req))
            .route(web::get().to(list_addresses))
            .wrap(RequireAuth),
    );
    cfg.service(
        web::resource("/{id}/default")
            .route(web::patch().to(set_default))
            .wrap(RequireAuth),
    );
    cfg.service(
        web::resource("/{id}")
            .route(web::delete().to(delete_address_req))
            .wrap(RequireAuth),
    );
}
