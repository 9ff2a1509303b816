use actix_web::web;
use sqlx::PgPool;
use utoipa::TupleUnit;
use uuid::Uuid;

use super::schemas::{
    BestSellingQuery, CreateProductRequest, CreateVariantRequest, Product, ProductDetail,
    ProductListQuery, ProductSummary, ProductVariant, UpdateVariantRequest,
};
use super::utils::{
    create_product, create_variant, fetch_best_selling, fetch_product, fetch_product_detail,
    fetch_variant, fetch_variants_by_product, list_products, update_variant,
};
use crate::errors::GenericError;
use crate::schemas::{GenericResponse, PaginatedList};

#[utoipa::path(
    get,
    path = "/product",
    tag = "Product",
    params(ProductListQuery),
    responses(
        (status=200, description= "Products matching the filters", body= GenericResponse<PaginatedList<ProductSummary>>),
    )
)]
#[tracing::instrument(name = "List Product API", skip(pool))]
pub async fn list_product_req(
    query: web::Query<ProductListQuery>,
    pool: web::Data<PgPool>,
) -> Result<web::Json<GenericResponse<PaginatedList<ProductSummary>>>, GenericError> {
    let products = list_products(&pool, &query).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched products",
        Some(products),
    )))
}

#[utoipa::path(
    get,
    path = "/product/best-selling",
    tag = "Product",
    params(BestSellingQuery),
    responses(
        (status=200, description= "Most sold products", body= GenericResponse<Vec<ProductSummary>>),
    )
)]
#[tracing::instrument(name = "Best Selling Product API", skip(pool))]
pub async fn best_selling_req(
    query: web::Query<BestSellingQuery>,
    pool: web::Data<PgPool>,
) -> Result<web::Json<GenericResponse<Vec<ProductSummary>>>, GenericError> {
    let products = fetch_best_selling(&pool, query.limit).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched best selling products",
        Some(products),
    )))
}

#[utoipa::path(
    get,
    path = "/product/{id}",
    tag = "Product",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status=200, description= "Product with its variants", body= GenericResponse<ProductDetail>),
        (status=404, description= "Product not found", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(name = "Fetch Product API", skip(pool))]
pub async fn get_product_req(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<web::Json<GenericResponse<ProductDetail>>, GenericError> {
    let product = fetch_product_detail(&pool, path.into_inner())
        .await?
        .ok_or_else(|| GenericError::DataNotFound("Product not found".to_string()))?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched product",
        Some(product),
    )))
}

#[utoipa::path(
    get,
    path = "/product/variant/{id}",
    tag = "Product",
    params(("id" = Uuid, Path, description = "Variant id")),
    responses(
        (status=200, description= "Variant detail", body= GenericResponse<ProductVariant>),
        (status=404, description= "Variant not found", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(name = "Fetch Product Variant API", skip(pool))]
pub async fn get_variant(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<web::Json<GenericResponse<ProductVariant>>, GenericError> {
    let variant = fetch_variant(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| GenericError::DataNotFound("Product variant not found".to_string()))?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched variant",
        Some(variant),
    )))
}

#[utoipa::path(
    get,
    path = "/product/{id}/variants",
    tag = "Product",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status=200, description= "Variants of the product", body= GenericResponse<Vec<ProductVariant>>),
        (status=404, description= "Product not found", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(name = "List Product Variants API", skip(pool))]
pub async fn list_variants(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<web::Json<GenericResponse<Vec<ProductVariant>>>, GenericError> {
    let product_id = path.into_inner();
    if fetch_product(&pool, product_id).await?.is_none() {
        return Err(GenericError::DataNotFound("Product not found".to_string()));
    }
    let variants = fetch_variants_by_product(&pool, product_id).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched variants",
        Some(variants),
    )))
}

#[utoipa::path(
    post,
    path = "/product",
    tag = "Product",
    request_body(content = CreateProductRequest, description = "Request Body"),
    responses(
        (status=200, description= "Product created", body= GenericResponse<Product>),
        (status=403, description= "Admin only", body= GenericResponse<TupleUnit>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "Create Product API", skip(pool))]
pub async fn create_product_req(
    body: CreateProductRequest,
    pool: web::Data<PgPool>,
) -> Result<web::Json<GenericResponse<Product>>, GenericError> {
    let product = create_product(&pool, &body).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully created product",
        Some(product),
    )))
}

#[utoipa::path(
    post,
    path = "/product/variant",
    tag = "Product",
    request_body(content = CreateVariantRequest, description = "Request Body"),
    responses(
        (status=200, description= "Variant created", body= GenericResponse<ProductVariant>),
        (status=400, description= "Invalid pricing or stock", body= GenericResponse<TupleUnit>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "Create Product Variant API", skip(pool))]
pub async fn create_variant_req(
    body: CreateVariantRequest,
    pool: web::Data<PgPool>,
) -> Result<web::Json<GenericResponse<ProductVariant>>, GenericError> {
    let variant = create_variant(&pool, &body).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully created variant",
        Some(variant),
    )))
}

#[utoipa::path(
    patch,
    path = "/product/variant/{id}",
    tag = "Product",
    params(("id" = Uuid, Path, description = "Variant id")),
    request_body(content = UpdateVariantRequest, description = "Request Body"),
    responses(
        (status=200, description= "Variant updated", body= GenericResponse<ProductVariant>),
        (status=404, description= "Variant not found", body= GenericResponse<TupleUnit>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "Update Product Variant API", skip(pool))]
pub async fn update_variant_req(
    path: web::Path<Uuid>,
    body: UpdateVariantRequest,
    pool: web::Data<PgPool>,
) -> Result<web::Json<GenericResponse<ProductVariant>>, GenericError> {
    let variant = update_variant(&pool, path.into_inner(), &body).await?;
    Ok(web::Json(GenericResponse::success(
        "Successfully updated variant",
        Some(variant),
    )))
}
