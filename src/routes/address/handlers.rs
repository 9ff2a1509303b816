use actix_web::web;
use sqlx::PgPool;
use utoipa::TupleUnit;
use uuid::Uuid;
use validator::Validate;

use super::schemas::{Address, CreateAddressRequest};
use super::utils::{create_address, delete_address, fetch_user_addresses, set_default_address};
use crate::administrative::AdministrativeDirectory;
use crate::errors::GenericError;
use crate::routes::user::schemas::UserAccount;
use crate::schemas::GenericResponse;

#[utoipa::path(
    post,
    path = "/address",
    tag = "Address",
    request_body(content = CreateAddressRequest, description = "Request Body"),
    responses(
        (status=200, description= "Address created", body= GenericResponse<Address>),
        (status=400, description= "Unknown province, district or ward", body= GenericResponse<TupleUnit>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "Create Address API", skip(pool, directory, user), fields(user_id = %user.id))]
pub async fn create_address_req(
    body: CreateAddressRequest,
    pool: web::Data<PgPool>,
    directory: web::Data<AdministrativeDirectory>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<Address>>, GenericError> {
    body.validate()
        .map_err(|e| GenericError::ValidationError(e.to_string()))?;
    let address = create_address(&pool, &directory, user.id, &body).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully created address",
        Some(address),
    )))
}

#[utoipa::path(
    get,
    path = "/address",
    tag = "Address",
    responses(
        (status=200, description= "Addresses of the current user", body= GenericResponse<Vec<Address>>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "List Address API", skip(pool, user), fields(user_id = %user.id))]
pub async fn list_addresses(
    pool: web::Data<PgPool>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<Vec<Address>>>, GenericError> {
    let addresses = fetch_user_addresses(&pool, user.id).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched addresses",
        Some(addresses),
    )))
}

#[utoipa::path(
    patch,
    path = "/address/{id}/default",
    tag = "Address",
    params(("id" = Uuid, Path, description = "Address id")),
    responses(
        (status=200, description= "Default address updated", body= GenericResponse<Address>),
        (status=404, description= "Address not found", body= GenericResponse<TupleUnit>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "Set Default Address API", skip(pool, user), fields(user_id = %user.id))]
pub async fn set_default(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<Address>>, GenericError> {
    let address = set_default_address(&pool, user.id, path.into_inner()).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully updated default address",
        Some(address),
    )))
}

#[utoipa::path(
    delete,
    path = "/address/{id}",
    tag = "Address",
    params(("id" = Uuid, Path, description = "Address id")),
    responses(
        (status=200, description= "Address deleted", body= GenericResponse<TupleUnit>),
        (status=404, description= "Address not found", body= GenericResponse<TupleUnit>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "Delete Address API", skip(pool, user), fields(user_id = %user.id))]
pub async fn delete_address_req(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<()>>, GenericError> {
    delete_address(&pool, user.id, path.into_inner()).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully deleted address",
        None,
    )))
}
