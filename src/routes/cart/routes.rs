use actix_web::web;

use super::handlers::{add_cart_item_req, delete_cart_item_req, get_cart, update_cart_item_req};
use crate::middleware::RequireAuth;

pub fn cart_route(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(get_cart))
            .wrap(RequireAuth),
    );
    cfg.service(
        web::resource("/item")
            .route(web::post().to(add_cart_item_req))
            .wrap(RequireAuth),
    );
    cfg.service(
        web::resource("/item/{id}")
            .route(web::patch().to(update_cart_item_req))
            .route(web::delete().to(delete_cart_item_req))
            .wrap(RequireAuth),
    );
}
