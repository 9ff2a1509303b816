use lazy_static::lazy_static;
use regex::Regex;

pub const PAYMENT_CONTENT_PREFIX: &str = "DH";
pub const PAYMENT_CODE_LENGTH: usize = 8;
pub const SEPAY_SIGNATURE_HEADER: &str = "X-SePay-Signature";

pub const VERIFICATION_CODE_LENGTH: usize = 6;
pub const VERIFICATION_CODE_TTL_MINUTES: i64 = 10;
pub const VERIFICATION_MAX_ATTEMPTS: i32 = 5;
pub const VERIFICATION_MAX_RESENDS: i32 = 5;
pub const VERIFICATION_RESEND_COOLDOWN_SECONDS: i64 = 60;

pub const NON_JSON_PATHS: [&str; 3] = ["/docs/", "/api-docs/", "/util/health_check"];
pub const SENSITIVE_REQUEST_PATHS: [&str; 4] = [
    "/user/register",
    "/user/authenticate",
    "/user/token/refresh",
    "/user/email/verify",
];

lazy_static! {
    pub static ref PAYMENT_TOKEN_PATTERN: Regex =
        Regex::new(r"^[A-Z0-9]{8}").expect("Failed to compile payment token pattern");
}
