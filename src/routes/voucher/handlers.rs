use actix_web::web;
use sqlx::PgPool;
use utoipa::TupleUnit;
use uuid::Uuid;

use super::schemas::{CreateVoucherRequest, UpdateVoucherRequest, Voucher, VoucherListQuery};
use super::utils::{create_voucher, list_vouchers, soft_delete_voucher, update_voucher};
use crate::errors::GenericError;
use crate::routes::user::schemas::UserAccount;
use crate::schemas::{GenericResponse, PaginatedList};

#[utoipa::path(
    get,
    path = "/voucher",
    tag = "Voucher",
    params(VoucherListQuery),
    responses(
        (status=200, description= "Vouchers matching the filters", body= GenericResponse<PaginatedList<Voucher>>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "List Voucher API", skip(pool))]
pub async fn list_voucher_req(
    query: web::Query<VoucherListQuery>,
    pool: web::Data<PgPool>,
) -> Result<web::Json<GenericResponse<PaginatedList<Voucher>>>, GenericError> {
    let vouchers = list_vouchers(&pool, &query).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched vouchers",
        Some(vouchers),
    )))
}

#[utoipa::path(
    post,
    path = "/voucher",
    tag = "Voucher",
    request_body(content = CreateVoucherRequest, description = "Request Body"),
    responses(
        (status=200, description= "Voucher created", body= GenericResponse<Voucher>),
        (status=409, description= "Duplicate code", body= GenericResponse<TupleUnit>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "Create Voucher API", skip(pool, user), fields(user_id = %user.id))]
pub async fn create_voucher_req(
    body: CreateVoucherRequest,
    pool: web::Data<PgPool>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<Voucher>>, GenericError> {
    let voucher = create_voucher(&pool, &body, user.id).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully created voucher",
        Some(voucher),
    )))
}

#[utoipa::path(
    patch,
    path = "/voucher/{id}",
    tag = "Voucher",
    params(("id" = Uuid, Path, description = "Voucher id")),
    request_body(content = UpdateVoucherRequest, description = "Request Body"),
    responses(
        (status=200, description= "Voucher updated", body= GenericResponse<Voucher>),
        (status=404, description= "Voucher not found", body= GenericResponse<TupleUnit>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "Update Voucher API", skip(pool))]
pub async fn update_voucher_req(
    path: web::Path<Uuid>,
    body: UpdateVoucherRequest,
    pool: web::Data<PgPool>,
) -> Result<web::Json<GenericResponse<Voucher>>, GenericError> {
    let voucher = update_voucher(&pool, path.into_inner(), &body).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully updated voucher",
        Some(voucher),
    )))
}

#[utoipa::path(
    delete,
    path = "/voucher/{id}",
    tag = "Voucher",
    params(("id" = Uuid, Path, description = "Voucher id")),
    responses(
        (status=200, description= "Voucher deleted", body= GenericResponse<TupleUnit>),
        (status=404, description= "Voucher not found", body= GenericResponse<TupleUnit>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "Delete Voucher API", skip(pool))]
pub async fn delete_voucher_req(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<web::Json<GenericResponse<()>>, GenericError> {
    soft_delete_voucher(&pool, path.into_inner()).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully deleted voucher",
        None,
    )))
}
