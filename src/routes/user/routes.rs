use actix_web::web;

use super::handlers::{
    authenticate, current_user, refresh_token, register_user_account, send_email_code,
    verify_email_code,
};
use crate::middleware::RequireAuth;

pub fn user_route(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/register").route(web::post().to(register_user_account)));
    cfg.service(web::resource("/authenticate").route(web::post().to(authenticate)));
    cfg.service(web::resource("/token/refresh").route(web::post().to(refresh_token)));
    cfg.service(web::resource("/me").route(web::get().to(current_user).wrap(RequireAuth)));
    cfg.service(web::resource("/email/send-code").route(web::post().to(send_email_code)));
    cfg.service(web::resource("/email/verify").route(web::post().to(verify_email_code)));
}
