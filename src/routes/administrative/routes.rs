use actix_web::web;

use super::handlers::{list_districts, list_provinces, list_wards};

pub fn administrative_route(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/provinces").route(web::get().to(list_provinces)));
    cfg.service(web::resource("/provinces/{code}/districts").route(web::get().to(list_districts)));
    cfg.service(
        web::resource("/provinces/{pcode}/districts/{dcode}/wards")
            .route(web::get().to(list_wards)),
    );
}
