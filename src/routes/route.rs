use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::openapi::ApiDoc;
use crate::routes::{
    address_route, administrative_route, cart_route, checkout_route, notification_route,
    order_route, product_route, user_route, util_route, voucher_route, wishlist_route,
};

pub fn main_route(cfg: &mut web::ServiceConfig) {
    let openapi = ApiDoc::openapi();
    cfg.service(web::scope("/util").configure(util_route))
        .service(web::scope("/user").configure(user_route))
        .service(web::scope("/product").configure(product_route))
        .service(web::scope("/cart").configure(cart_route))
        .service(web::scope("/wishlist").configure(wishlist_route))
        .service(web::scope("/address").configure(address_route))
        .service(web::scope("/administrative").configure(administrative_route))
        .service(web::scope("/voucher").configure(voucher_route))
        .service(web::scope("/checkout").configure(checkout_route))
        .service(web::scope("/order").configure(order_route))
        .service(web::scope("/notification").configure(notification_route))
        .service(SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", openapi));
}
