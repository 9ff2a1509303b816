use actix_web::web;
use sqlx::PgPool;
use utoipa::TupleUnit;
use uuid::Uuid;

use super::schemas::{AddCartItemRequest, CartView, UpdateCartItemRequest};
use super::utils::{add_cart_item, delete_cart_item, fetch_cart, update_cart_item};
use crate::errors::GenericError;
use crate::routes::user::schemas::UserAccount;
use crate::schemas::GenericResponse;

#[utoipa::path(
    get,
    path = "/cart",
    tag = "Cart",
    responses(
        (status=200, description= "Cart of the current user", body= GenericResponse<CartView>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "Fetch Cart API", skip(pool, user), fields(user_id = %user.id))]
pub async fn get_cart(
    pool: web::Data<PgPool>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<CartView>>, GenericError> {
    let cart = fetch_cart(&pool, user.id).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched cart",
        Some(cart),
    )))
}

#[utoipa::path(
    post,
    path = "/cart/item",
    tag = "Cart",
    request_body(content = AddCartItemRequest, description = "Request Body"),
    responses(
        (status=200, description= "Item added", body= GenericResponse<CartView>),
        (status=409, description= "Insufficient stock", body= GenericResponse<TupleUnit>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "Add Cart Item API", skip(pool, user), fields(user_id = %user.id))]
pub async fn add_cart_item_req(
    body: AddCartItemRequest,
    pool: web::Data<PgPool>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<CartView>>, GenericError> {
    let cart = add_cart_item(&pool, user.id, body.variant_id, body.quantity).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully added item to cart",
        Some(cart),
    )))
}

#[utoipa::path(
    patch,
    path = "/cart/item/{id}",
    tag = "Cart",
    params(("id" = Uuid, Path, description = "Cart line id")),
    request_body(content = UpdateCartItemRequest, description = "Request Body"),
    responses(
        (status=200, description= "Quantity updated", body= GenericResponse<CartView>),
        (status=404, description= "Cart item not found", body= GenericResponse<TupleUnit>),
        (status=409, description= "Insufficient stock", body= GenericResponse<TupleUnit>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "Update Cart Item API", skip(pool, user), fields(user_id = %user.id))]
pub async fn update_cart_item_req(
    path: web::Path<Uuid>,
    body: UpdateCartItemRequest,
    pool: web::Data<PgPool>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<CartView>>, GenericError> {
    let cart = update_cart_item(&pool, user.id, path.into_inner(), body.quantity).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully updated cart item",
        Some(cart),
    )))
}

#[utoipa::path(
    delete,
    path = "/cart/item/{id}",
    tag = "Cart",
    params(("id" = Uuid, Path, description = "Cart line id")),
    responses(
        (status=200, description= "Item removed", body= GenericResponse<CartView>),
        (status=404, description= "Cart item not found", body= GenericResponse<TupleUnit>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "Delete Cart Item API", skip(pool, user), fields(user_id = %user.id))]
pub async fn delete_cart_item_req(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<CartView>>, GenericError> {
    let cart = delete_cart_item(&pool, user.id, path.into_inner()).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully removed cart item",
        Some(cart),
    )))
}
