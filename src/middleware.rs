use std::cell::RefCell;
use std::future::{ready, Ready};
use std::rc::Rc;

use actix_web::body::{self, BoxBody};
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{http, web, Error, HttpMessage};
use futures::future::LocalBoxFuture;
use sqlx::PgPool;
use tracing::instrument;

use crate::configuration::SecretSetting;
use crate::constants::{NON_JSON_PATHS, SENSITIVE_REQUEST_PATHS};
use crate::errors::GenericError;
use crate::routes::user::schemas::{UserAccount, UserRole};
use crate::routes::user::utils::fetch_user_account;
use crate::schemas::TokenType;
use crate::utils::{bytes_to_payload, decode_token};

// Middleware for saving the request and response into the tracing
pub struct ReadReqResMiddleware<S> {
    service: Rc<RefCell<S>>,
}

impl<S> Service<ServiceRequest> for ReadReqResMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Error>>;

    forward_ready!(service);

    #[instrument(skip(self), name = "Request Response Payload", fields(path = %req.path()))]
    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        let path = req.path().to_owned();
        if NON_JSON_PATHS.iter().any(|p| path.contains(p)) {
            return Box::pin(async move { svc.call(req).await });
        }
        let log_request = !SENSITIVE_REQUEST_PATHS.iter().any(|p| path.ends_with(p));
        Box::pin(async move {
            let request_bytes = req.extract::<web::Bytes>().await?;
            if log_request {
                let request_str = String::from_utf8_lossy(&request_bytes);
                tracing::info!({%request_str}, "HTTP Request");
            }
            req.set_payload(bytes_to_payload(request_bytes));

            let fut = svc.call(req).await?;
            let (req, res) = fut.into_parts();
            let (res, body) = res.into_parts();
            let body_bytes = body::to_bytes(body)
                .await
                .map_err(actix_web::error::ErrorInternalServerError)?;
            let response_str = String::from_utf8_lossy(&body_bytes).to_string();
            tracing::info!({%response_str}, "HTTP Response");
            let res = res.set_body(BoxBody::new(response_str));
            Ok(ServiceResponse::new(req, res))
        })
    }
}

pub struct SaveRequestResponse;

impl<S> Transform<S, ServiceRequest> for SaveRequestResponse
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = ReadReqResMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ReadReqResMiddleware {
            service: Rc::new(RefCell::new(service)),
        }))
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.cookie("token")
        .map(|c| c.value().to_string())
        .or_else(|| {
            req.headers()
                .get(http::header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(|token| token.trim().to_string())
        })
}

fn reject(
    req: ServiceRequest,
    error: GenericError,
) -> LocalBoxFuture<'static, Result<ServiceResponse<BoxBody>, Error>> {
    let (request, _pl) = req.into_parts();
    Box::pin(async { Ok(ServiceResponse::from_err(error, request)) })
}

pub struct AuthMiddleware<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for AuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let Some(token) = bearer_token(&req) else {
            return reject(
                req,
                GenericError::InvalidJWT("Authorization token is missing".to_string()),
            );
        };
        let secret = req
            .app_data::<web::Data<SecretSetting>>()
            .map(|setting| setting.jwt.secret.clone());
        let Some(secret) = secret else {
            return reject(
                req,
                GenericError::UnexpectedCustomError("JWT secret is not configured".to_string()),
            );
        };
        let user_id = match decode_token(token, &secret, TokenType::Access) {
            Ok(id) => id,
            Err(e) => return reject(req, GenericError::InvalidJWT(e.to_string())),
        };

        let srv = Rc::clone(&self.service);
        Box::pin(async move {
            let db_pool = req.app_data::<web::Data<PgPool>>().ok_or_else(|| {
                GenericError::UnexpectedCustomError("Database pool is not configured".to_string())
            })?;
            let user = fetch_user_account(db_pool, user_id)
                .await
                .map_err(GenericError::UnexpectedError)?
                .ok_or_else(|| GenericError::InvalidJWT("User account doesn't exist".to_string()))?;
            if !user.is_active {
                return Err(GenericError::InsufficientPrivilegeError(
                    "User is inactive. Please contact customer support".to_string(),
                )
                .into());
            }
            req.extensions_mut().insert::<UserAccount>(user);
            srv.call(req).await
        })
    }
}

/// Middleware factory for requiring authentication.
pub struct RequireAuth;

impl<S> Transform<S, ServiceRequest> for RequireAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = AuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

// Middleware to validate the role of an authenticated user
pub struct RoleMiddleware<S> {
    service: Rc<S>,
    pub role_list: Vec<UserRole>,
}

impl<S> Service<ServiceRequest> for RoleMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let role = req.extensions().get::<UserAccount>().map(|user| user.role);
        match role {
            None => reject(
                req,
                GenericError::UnexpectedCustomError("User Account doesn't exist".to_string()),
            ),
            Some(role) if !self.role_list.contains(&role) => reject(
                req,
                GenericError::InsufficientPrivilegeError(
                    "Insufficient privilege for this action".to_string(),
                ),
            ),
            Some(_) => {
                let srv = Rc::clone(&self.service);
                Box::pin(async move { srv.call(req).await })
            }
        }
    }
}

pub struct RequireRole {
    pub role_list: Vec<UserRole>,
}

impl RequireRole {
    pub fn admin() -> Self {
        Self {
            role_list: vec![UserRole::Admin],
        }
    }
}

impl<S> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = RoleMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RoleMiddleware {
            service: Rc::new(service),
            role_list: self.role_list.clone(),
        }))
    }
}
