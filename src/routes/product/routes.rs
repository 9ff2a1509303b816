use actix_web::web;

use super::handlers::{
    best_selling_req, create_product_req, create_variant_req, get_product_req, get_variant,
    list_product_req, list_variants, update_variant_req,
};
use crate::middleware::{RequireAuth, RequireRole};

pub fn product_route(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(list_product_req))
            .route(
                web::post()
                    .to(create_product_req)
                    .wrap(RequireRole::admin())
                    .wrap(RequireAuth),
            ),
    );
    cfg.service(web::resource("/best-selling").route(web::get().to(best_selling_req)));
    cfg.service(
        web::resource("/variant").route(
            web::post()
                .to(create_variant_req)
                .wrap(RequireRole::admin())
                .wrap(RequireAuth),
        ),
    );
    cfg.service(
        web::resource("/variant/{id}")
            .route(web::get().to(get_variant))
            .route(
                web::patch()
                    .to(update_variant_req)
                    .wrap(RequireRole::admin())
                    .wrap(RequireAuth),
            ),
    );
    cfg.service(web::resource("/{id}/variants").route(web::get().to(list_variants)));
    cfg.service(web::resource("/{id}").route(web::get().to(get_product_req)));
}
