use actix_web::web;
use sqlx::PgPool;
use utoipa::TupleUnit;
use uuid::Uuid;

use super::schemas::{
    AdminOrderListQuery, OrderDetail, OrderListQuery, OrderSummary, UpdateOrderStatusRequest,
};
use super::utils::{fetch_order_detail, list_orders, update_order_status, OrderFilter};
use crate::configuration::SePaySettings;
use crate::errors::GenericError;
use crate::routes::user::schemas::UserAccount;
use crate::schemas::{GenericResponse, PaginatedList};

#[utoipa::path(
    get,
    path = "/order",
    tag = "Order",
    params(OrderListQuery),
    responses(
        (status=200, description= "Order history of the current user", body= GenericResponse<PaginatedList<OrderSummary>>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "List Order API", skip(pool, user, sepay_settings), fields(user_id = %user.id))]
pub async fn list_order_req(
    query: web::Query<OrderListQuery>,
    pool: web::Data<PgPool>,
    sepay_settings: web::Data<SePaySettings>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<PaginatedList<OrderSummary>>>, GenericError> {
    let query = query.into_inner();
    let filter = OrderFilter {
        user_id: Some(user.id),
        status: query.status,
        sort_order: query.sort_order,
        page: query.page,
        limit: query.limit,
    };
    let orders = list_orders(&pool, &filter, sepay_settings.payment_timeout_minutes).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched orders",
        Some(orders),
    )))
}

#[utoipa::path(
    get,
    path = "/order/{id}",
    tag = "Order",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status=200, description= "Order detail", body= GenericResponse<OrderDetail>),
        (status=404, description= "Order not found", body= GenericResponse<TupleUnit>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "Fetch Order API", skip(pool, user, sepay_settings), fields(user_id = %user.id))]
pub async fn get_order_req(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    sepay_settings: web::Data<SePaySettings>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<OrderDetail>>, GenericError> {
    let detail = fetch_order_detail(
        &pool,
        path.into_inner(),
        Some(user.id),
        sepay_settings.payment_timeout_minutes,
    )
    .await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched order",
        Some(detail),
    )))
}

#[utoipa::path(
    get,
    path = "/order/admin/list",
    tag = "Order",
    params(AdminOrderListQuery),
    responses(
        (status=200, description= "All orders", body= GenericResponse<PaginatedList<OrderSummary>>),
        (status=403, description= "Admin only", body= GenericResponse<TupleUnit>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "Admin List Order API", skip(pool, sepay_settings))]
pub async fn admin_list_order_req(
    query: web::Query<AdminOrderListQuery>,
    pool: web::Data<PgPool>,
    sepay_settings: web::Data<SePaySettings>,
) -> Result<web::Json<GenericResponse<PaginatedList<OrderSummary>>>, GenericError> {
    let query = query.into_inner();
    let filter = OrderFilter {
        user_id: query.user_id,
        status: query.status,
        sort_order: query.sort_order,
        page: query.page,
        limit: query.limit,
    };
    let orders = list_orders(&pool, &filter, sepay_settings.payment_timeout_minutes).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched orders",
        Some(orders),
    )))
}

#[utoipa::path(
    get,
    path = "/order/admin/{id}",
    tag = "Order",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status=200, description= "Order detail", body= GenericResponse<OrderDetail>),
        (status=404, description= "Order not found", body= GenericResponse<TupleUnit>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "Admin Fetch Order API", skip(pool, sepay_settings))]
pub async fn admin_get_order_req(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    sepay_settings: web::Data<SePaySettings>,
) -> Result<web::Json<GenericResponse<OrderDetail>>, GenericError> {
    let detail = fetch_order_detail(
        &pool,
        path.into_inner(),
        None,
        sepay_settings.payment_timeout_minutes,
    )
    .await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched order",
        Some(detail),
    )))
}

#[utoipa::path(
    patch,
    path = "/order/admin/{id}/status",
    tag = "Order",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body(content = UpdateOrderStatusRequest, description = "Request Body"),
    responses(
        (status=200, description= "Order status updated", body= GenericResponse<OrderDetail>),
        (status=404, description= "Order not found", body= GenericResponse<TupleUnit>),
        (status=409, description= "Invalid state for this action", body= GenericResponse<TupleUnit>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "Admin Update Order Status API", skip(pool, user, sepay_settings), fields(user_id = %user.id))]
pub async fn admin_update_status_req(
    path: web::Path<Uuid>,
    body: UpdateOrderStatusRequest,
    pool: web::Data<PgPool>,
    sepay_settings: web::Data<SePaySettings>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<OrderDetail>>, GenericError> {
    let timeout = sepay_settings.payment_timeout_minutes;
    let order = update_order_status(&pool, path.into_inner(), body.status, user.id, timeout).await?;
    let detail = fetch_order_detail(&pool, order.id, None, timeout).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully updated order status",
        Some(detail),
    )))
}
