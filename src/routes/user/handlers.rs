use actix_web::web;
use sqlx::PgPool;
use utoipa::TupleUnit;

use super::schemas::{
    AuthData, AuthenticateRequest, CreateUserAccount, RefreshTokenRequest,
    SendVerificationCodeRequest, UserAccount, VerifyEmailRequest,
};
use super::utils::{
    issue_auth_data, refresh_auth_data, register_user, send_verification_code,
    send_verification_code_to_email, validate_user_credentials, verify_email,
};
use crate::configuration::{SecretSetting, UserSettings};
use crate::email_client::{EmailServicePool, GenericEmailService};
use crate::errors::GenericError;
use crate::schemas::{CommunicationType, GenericResponse};

fn transactional_client(
    pool: &EmailServicePool,
) -> Result<&dyn GenericEmailService, GenericError> {
    pool.get(&CommunicationType::Transactional)
        .map(|client| client.as_ref())
        .ok_or_else(|| {
            GenericError::UnexpectedCustomError("Email service is not configured".to_string())
        })
}

#[utoipa::path(
    post,
    path = "/user/register",
    tag = "User",
    request_body(content = CreateUserAccount, description = "Request Body"),
    responses(
        (status=200, description= "Account created successfully", body= GenericResponse<UserAccount>),
        (status=400, description= "Invalid Request body", body= GenericResponse<TupleUnit>),
        (status=409, description= "Email already registered", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(err, name = "User Account Registration API", skip(pool, body, email_pool, user_settings), fields(email = %body.email))]
pub async fn register_user_account(
    body: CreateUserAccount,
    pool: web::Data<PgPool>,
    user_settings: web::Data<UserSettings>,
    email_pool: web::Data<EmailServicePool>,
) -> Result<web::Json<GenericResponse<UserAccount>>, GenericError> {
    validator::Validate::validate(&body)
        .map_err(|e| GenericError::ValidationError(e.to_string()))?;
    let user = register_user(&pool, body, &user_settings).await?;
    let client = transactional_client(&email_pool)?;
    if let Err(e) = send_verification_code(&pool, client, &user).await {
        // The account exists either way; the user can ask for another code.
        tracing::warn!("Failed to send verification code: {:?}", e);
    }
    Ok(web::Json(GenericResponse::success(
        "Successfully registered user",
        Some(user),
    )))
}

#[utoipa::path(
    post,
    path = "/user/authenticate",
    tag = "User",
    request_body(content = AuthenticateRequest, description = "Request Body"),
    responses(
        (status=200, description= "Authenticate User", body= GenericResponse<AuthData>),
        (status=401, description= "Invalid credentials", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(err, name = "Authenticate User", skip(pool, body, secret_obj), fields(email = %body.email, user_id = tracing::field::Empty))]
pub async fn authenticate(
    body: AuthenticateRequest,
    pool: web::Data<PgPool>,
    secret_obj: web::Data<SecretSetting>,
) -> Result<web::Json<GenericResponse<AuthData>>, GenericError> {
    let user = validate_user_credentials(&pool, &body.email, body.password).await?;
    tracing::Span::current().record("user_id", tracing::field::display(&user.id));
    let auth_data = issue_auth_data(&pool, user, &secret_obj.jwt).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully Authenticated User",
        Some(auth_data),
    )))
}

#[utoipa::path(
    post,
    path = "/user/token/refresh",
    tag = "User",
    request_body(content = RefreshTokenRequest, description = "Request Body"),
    responses(
        (status=200, description= "Token pair refreshed", body= GenericResponse<AuthData>),
        (status=401, description= "Invalid or revoked refresh token", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(err, name = "Refresh Token", skip(pool, body, secret_obj))]
pub async fn refresh_token(
    body: RefreshTokenRequest,
    pool: web::Data<PgPool>,
    secret_obj: web::Data<SecretSetting>,
) -> Result<web::Json<GenericResponse<AuthData>>, GenericError> {
    let auth_data = refresh_auth_data(&pool, body.refresh_token, &secret_obj.jwt).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully refreshed token",
        Some(auth_data),
    )))
}

#[utoipa::path(
    get,
    path = "/user/me",
    tag = "User",
    responses(
        (status=200, description= "Current user profile", body= GenericResponse<UserAccount>),
        (status=401, description= "Missing or invalid token", body= GenericResponse<TupleUnit>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "Fetch current user", skip(user), fields(user_id = %user.id))]
pub async fn current_user(
    user: UserAccount,
) -> Result<web::Json<GenericResponse<UserAccount>>, GenericError> {
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched user",
        Some(user),
    )))
}

#[utoipa::path(
    post,
    path = "/user/email/send-code",
    tag = "User",
    request_body(content = SendVerificationCodeRequest, description = "Request Body"),
    responses(
        (status=200, description= "Verification code sent", body= GenericResponse<TupleUnit>),
        (status=409, description= "Already verified, cooldown or resend limit", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(err, name = "Send Email Verification Code", skip(pool, body, email_pool), fields(email = %body.email))]
pub async fn send_email_code(
    body: SendVerificationCodeRequest,
    pool: web::Data<PgPool>,
    email_pool: web::Data<EmailServicePool>,
) -> Result<web::Json<GenericResponse<()>>, GenericError> {
    let client = transactional_client(&email_pool)?;
    send_verification_code_to_email(&pool, client, &body.email).await?;
    Ok(web::Json(GenericResponse::success(
        "Verification code sent",
        None,
    )))
}

#[utoipa::path(
    post,
    path = "/user/email/verify",
    tag = "User",
    request_body(content = VerifyEmailRequest, description = "Request Body"),
    responses(
        (status=200, description= "Email verified", body= GenericResponse<TupleUnit>),
        (status=400, description= "Wrong, expired or exhausted code", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(err, name = "Verify Email", skip(pool, body), fields(email = %body.email))]
pub async fn verify_email_code(
    body: VerifyEmailRequest,
    pool: web::Data<PgPool>,
) -> Result<web::Json<GenericResponse<()>>, GenericError> {
    verify_email(&pool, &body.email, body.code).await?;
    Ok(web::Json(GenericResponse::success(
        "Email verified",
        None,
    )))
}
