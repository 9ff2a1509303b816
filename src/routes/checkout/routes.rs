use actix_web::web;

use super::handlers::{
    cancel_order_req, change_payment_method_req, create_order_req, payment_info_req,
    payment_status_req, preview_order_req, sepay_webhook_req, validate_voucher_req,
};
use crate::middleware::RequireAuth;

pub fn checkout_route(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/preview")
            .route(web::post().to(preview_order_req))
            .wrap(RequireAuth),
    );
    cfg.service(
        web::resource("/validate-voucher")
            .route(web::post().to(validate_voucher_req))
            .wrap(RequireAuth),
    );
    cfg.service(
        web::resource("/create-order")
            .route(web::post().to(create_order_req))
            .wrap(RequireAuth),
    );
    cfg.service(
        web::resource("/payment-status/{id}")
            .route(web::get().to(payment_status_req))
            .wrap(RequireAuth),
    );
    cfg.service(
        web::resource("/payment-info/{id}")
            .route(web::get().to(payment_info_req))
            .wrap(RequireAuth),
    );
    cfg.service(
        web::resource("/change-payment-method/{id}")
            .route(web::patch().to(change_payment_method_req))
            .wrap(RequireAuth),
    );
    cfg.service(
        web::resource("/cancel-order/{id}")
            .route(web::post().to(cancel_order_req))
            .wrap(RequireAuth),
    );
    // Called by SePay, authenticated by signature instead of a bearer token.
    cfg.service(web::resource("/sepay-webhook").route(web::post().to(sepay_webhook_req)));
}
