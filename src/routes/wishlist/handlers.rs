use actix_web::web;
use sqlx::PgPool;
use utoipa::TupleUnit;
use uuid::Uuid;

use super::schemas::{AddWishlistItemRequest, WishlistItem};
use super::utils::{add_wishlist_item, delete_wishlist_item, fetch_wishlist};
use crate::errors::GenericError;
use crate::routes::user::schemas::UserAccount;
use crate::schemas::GenericResponse;

#[utoipa::path(
    get,
    path = "/wishlist",
    tag = "Wishlist",
    responses(
        (status=200, description= "Wishlist of the current user", body= GenericResponse<Vec<WishlistItem>>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "Fetch Wishlist API", skip(pool, user), fields(user_id = %user.id))]
pub async fn get_wishlist(
    pool: web::Data<PgPool>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<Vec<WishlistItem>>>, GenericError> {
    let items = fetch_wishlist(&pool, user.id).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched wishlist",
        Some(items),
    )))
}

#[utoipa::path(
    post,
    path = "/wishlist/item",
    tag = "Wishlist",
    request_body(content = AddWishlistItemRequest, description = "Request Body"),
    responses(
        (status=200, description= "Item added", body= GenericResponse<Vec<WishlistItem>>),
        (status=409, description= "Already in wishlist", body= GenericResponse<TupleUnit>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "Add Wishlist Item API", skip(pool, user), fields(user_id = %user.id))]
pub async fn add_wishlist_item_req(
    body: AddWishlistItemRequest,
    pool: web::Data<PgPool>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<Vec<WishlistItem>>>, GenericError> {
    let items = add_wishlist_item(&pool, user.id, body.variant_id).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully added item to wishlist",
        Some(items),
    )))
}

#[utoipa::path(
    delete,
    path = "/wishlist/item/{id}",
    tag = "Wishlist",
    params(("id" = Uuid, Path, description = "Wishlist item id")),
    responses(
        (status=200, description= "Item removed", body= GenericResponse<Vec<WishlistItem>>),
        (status=404, description= "Wishlist item not found", body= GenericResponse<TupleUnit>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "Delete Wishlist Item API", skip(pool, user), fields(user_id = %user.id))]
pub async fn delete_wishlist_item_req(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<Vec<WishlistItem>>>, GenericError> {
    let items = delete_wishlist_item(&pool, user.id, path.into_inner()).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully removed wishlist item",
        Some(items),
    )))
}
