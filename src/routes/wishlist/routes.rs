use actix_web::web;

use super::handlers::{add_wishlist_item_req, delete_wishlist_item_req, get_wishlist};
use crate::middleware::RequireAuth;

pub fn wishlist_route(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(get_wishlist))
            .wrap(RequireAuth),
    );
    cfg.service(
        web::resource("/item")
            .route(web::post().to(add_wishlist_item_req))
            .wrap(RequireAuth),
    );
    cfg.service(
        web::resource("/item/{id}")
            .route(web::delete().to(delete_wishlist_item_req))
            .wrap(RequireAuth),
    );
}
