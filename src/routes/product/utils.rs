use bigdecimal::BigDecimal;
use chrono::Utc;
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::models::{ProductModel, ProductSummaryModel, ProductVariantModel};
use super::schemas::{
    CreateProductRequest, CreateVariantRequest, Product, ProductDetail, ProductListQuery,
    ProductSortField, ProductSummary, ProductVariant, UpdateVariantRequest,
};
use crate::errors::GenericError;
use crate::schemas::{error_context, PaginatedList, PaginationQuery, SortOrder};

const VARIANT_SELECT: &str = "SELECT pt.id, pt.product_id, p.name AS product_name, p.brand, \
     pt.variant_name, pt.image_path, pt.price, pt.discount_price, pt.stock, pt.sold \
     FROM product_type pt INNER JOIN product p ON p.id = pt.product_id \
     WHERE pt.deleted_on IS NULL AND p.deleted_on IS NULL";

const PRODUCT_SUMMARY_SELECT: &str = "SELECT p.id, p.name, p.description, p.brand, p.created_on, \
     MIN(COALESCE(pt.discount_price, pt.price)) AS min_price, \
     COALESCE(SUM(pt.stock), 0)::BIGINT AS total_stock, \
     COALESCE(SUM(pt.sold), 0)::BIGINT AS total_sold, \
     COUNT(pt.id) AS variant_count \
     FROM product p LEFT JOIN product_type pt ON pt.product_id = p.id AND pt.deleted_on IS NULL";

pub const BEST_SELLING_DEFAULT_LIMIT: i64 = 10;

/// `ILIKE` pattern for a free text filter, `None` when the filter is blank.
pub fn like_pattern(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| format!("%{}%", v))
}

pub fn validate_variant_pricing(
    price: &BigDecimal,
    discount_price: Option<&BigDecimal>,
    stock: i32,
) -> Result<(), String> {
    let zero = BigDecimal::from(0);
    if *price < zero {
        return Err("Price cannot be negative".to_string());
    }
    if let Some(discount_price) = discount_price {
        if *discount_price < zero {
            return Err("Discount price cannot be negative".to_string());
        }
        if discount_price > price {
            return Err("Discount price cannot exceed price".to_string());
        }
    }
    if stock < 0 {
        return Err("Stock cannot be negative".to_string());
    }
    Ok(())
}

/// Conflict naming the product, with the units still available in the
/// error context.
pub fn insufficient_stock(variant: &ProductVariant, requested: i32) -> GenericError {
    GenericError::ConflictError(
        format!(
            "Insufficient stock for {} ({}): {} requested, {} available",
            variant.product_name, variant.variant_name, requested, variant.stock
        ),
        error_context([
            ("variantId", serde_json::json!(variant.id)),
            ("available", serde_json::json!(variant.stock)),
            ("requested", serde_json::json!(requested)),
        ]),
    )
}

#[tracing::instrument(name = "Fetch product variant", skip(executor))]
pub async fn fetch_variant<'a, E>(
    executor: E,
    variant_id: Uuid,
) -> Result<Option<ProductVariant>, anyhow::Error>
where
    E: PgExecutor<'a>,
{
    let query = format!("{} AND pt.id = $1", VARIANT_SELECT);
    let row = sqlx::query_as::<_, ProductVariantModel>(&query)
        .bind(variant_id)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            anyhow::Error::new(e).context("A database failure occurred while fetching variant")
        })?;
    Ok(row.map(ProductVariantModel::into_schema))
}

/// Live variants for the given ids. Soft-deleted or unknown ids are absent
/// from the result.
#[tracing::instrument(name = "Fetch product variants by ids", skip(executor))]
pub async fn fetch_variants_by_ids<'a, E>(
    executor: E,
    variant_ids: &[Uuid],
) -> Result<Vec<ProductVariant>, anyhow::Error>
where
    E: PgExecutor<'a>,
{
    let query = format!("{} AND pt.id = ANY($1)", VARIANT_SELECT);
    let rows = sqlx::query_as::<_, ProductVariantModel>(&query)
        .bind(variant_ids)
        .fetch_all(executor)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            anyhow::Error::new(e).context("A database failure occurred while fetching variants")
        })?;
    Ok(rows
        .into_iter()
        .map(ProductVariantModel::into_schema)
        .collect())
}

#[tracing::instrument(name = "Fetch variants of product", skip(pool))]
pub async fn fetch_variants_by_product(
    pool: &PgPool,
    product_id: Uuid,
) -> Result<Vec<ProductVariant>, anyhow::Error> {
    let query = format!(
        "{} AND pt.product_id = $1 ORDER BY pt.created_on",
        VARIANT_SELECT
    );
    let rows = sqlx::query_as::<_, ProductVariantModel>(&query)
        .bind(product_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            anyhow::Error::new(e).context("A database failure occurred while fetching variants")
        })?;
    Ok(rows
        .into_iter()
        .map(ProductVariantModel::into_schema)
        .collect())
}

#[tracing::instrument(name = "Fetch product", skip(pool))]
pub async fn fetch_product(pool: &PgPool, product_id: Uuid) -> Result<Option<Product>, anyhow::Error> {
    let row = sqlx::query_as::<_, ProductModel>(
        "SELECT id, name, description, brand, created_on FROM product \
         WHERE id = $1 AND deleted_on IS NULL",
    )
    .bind(product_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while fetching product")
    })?;
    Ok(row.map(ProductModel::into_schema))
}

/// Paginated catalog search. Price bounds apply to the cheapest live
/// variant of each product.
#[tracing::instrument(name = "List products", skip(pool))]
pub async fn list_products(
    pool: &PgPool,
    query: &ProductListQuery,
) -> Result<PaginatedList<ProductSummary>, anyhow::Error> {
    let pagination = PaginationQuery {
        page: query.page,
        limit: query.limit,
    };
    let keyword = like_pattern(query.keyword.as_deref());
    let brand = like_pattern(query.brand.as_deref());
    let filtered = format!(
        "{} WHERE p.deleted_on IS NULL \
         AND ($1::TEXT IS NULL OR p.name ILIKE $1 OR p.description ILIKE $1) \
         AND ($2::TEXT IS NULL OR p.brand ILIKE $2) \
         GROUP BY p.id \
         HAVING ($3::NUMERIC IS NULL OR MIN(COALESCE(pt.discount_price, pt.price)) >= $3) \
         AND ($4::NUMERIC IS NULL OR MIN(COALESCE(pt.discount_price, pt.price)) <= $4)",
        PRODUCT_SUMMARY_SELECT
    );

    let (total,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM ({}) AS matched", filtered))
        .bind(&keyword)
        .bind(&brand)
        .bind(&query.min_price)
        .bind(&query.max_price)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            anyhow::Error::new(e).context("A database failure occurred while counting products")
        })?;

    let sql = format!(
        "{} ORDER BY {} {} NULLS LAST, id LIMIT $5 OFFSET $6",
        filtered,
        query
            .sort_by
            .unwrap_or(ProductSortField::CreatedOn)
            .column(),
        query.sort_order.unwrap_or(SortOrder::Desc).as_sql()
    );
    let rows = sqlx::query_as::<_, ProductSummaryModel>(&sql)
        .bind(&keyword)
        .bind(&brand)
        .bind(&query.min_price)
        .bind(&query.max_price)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            anyhow::Error::new(e).context("A database failure occurred while listing products")
        })?;

    Ok(PaginatedList {
        items: rows.into_iter().map(ProductSummaryModel::into_schema).collect(),
        total,
        page: query.page.unwrap_or(1).max(1),
        limit: pagination.limit(),
    })
}

/// Products with at least one unit sold, most sold first.
#[tracing::instrument(name = "Fetch best selling products", skip(pool))]
pub async fn fetch_best_selling(
    pool: &PgPool,
    limit: Option<i64>,
) -> Result<Vec<ProductSummary>, anyhow::Error> {
    let limit = limit
        .unwrap_or(BEST_SELLING_DEFAULT_LIMIT)
        .clamp(1, PaginationQuery::MAX_LIMIT);
    let sql = format!(
        "{} WHERE p.deleted_on IS NULL GROUP BY p.id HAVING COALESCE(SUM(pt.sold), 0) > 0 \
         ORDER BY total_sold DESC, id LIMIT $1",
        PRODUCT_SUMMARY_SELECT
    );
    let rows = sqlx::query_as::<_, ProductSummaryModel>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            anyhow::Error::new(e).context("A database failure occurred while fetching best sellers")
        })?;
    Ok(rows.into_iter().map(ProductSummaryModel::into_schema).collect())
}

#[tracing::instrument(name = "Fetch product detail", skip(pool))]
pub async fn fetch_product_detail(
    pool: &PgPool,
    product_id: Uuid,
) -> Result<Option<ProductDetail>, anyhow::Error> {
    let Some(product) = fetch_product(pool, product_id).await? else {
        return Ok(None);
    };
    let variants = fetch_variants_by_product(pool, product_id).await?;
    Ok(Some(ProductDetail { product, variants }))
}

#[tracing::instrument(name = "Create product", skip(pool))]
pub async fn create_product(
    pool: &PgPool,
    request: &CreateProductRequest,
) -> Result<Product, GenericError> {
    if request.name.trim().is_empty() {
        return Err(GenericError::ValidationError(
            "Product name is required".to_string(),
        ));
    }
    let row = sqlx::query_as::<_, ProductModel>(
        "INSERT INTO product (id, name, description, brand, created_on) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id, name, description, brand, created_on",
    )
    .bind(Uuid::new_v4())
    .bind(request.name.trim())
    .bind(&request.description)
    .bind(&request.brand)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        GenericError::DatabaseError(
            "A database failure occurred while saving product".to_string(),
            e.into(),
        )
    })?;
    Ok(row.into_schema())
}

#[tracing::instrument(name = "Create product variant", skip(pool))]
pub async fn create_variant(
    pool: &PgPool,
    request: &CreateVariantRequest,
) -> Result<ProductVariant, GenericError> {
    validate_variant_pricing(
        &request.price,
        request.discount_price.as_ref(),
        request.stock,
    )
    .map_err(GenericError::ValidationError)?;
    if fetch_product(pool, request.product_id).await?.is_none() {
        return Err(GenericError::DataNotFound("Product not found".to_string()));
    }
    let variant_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO product_type (id, product_id, variant_name, image_path, price, \
         discount_price, stock, sold, created_on) VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $8)",
    )
    .bind(variant_id)
    .bind(request.product_id)
    .bind(request.variant_name.trim())
    .bind(&request.image_path)
    .bind(&request.price)
    .bind(&request.discount_price)
    .bind(request.stock)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        GenericError::DatabaseError(
            "A database failure occurred while saving variant".to_string(),
            e.into(),
        )
    })?;
    fetch_variant(pool, variant_id)
        .await?
        .ok_or_else(|| GenericError::UnexpectedCustomError("Variant vanished after insert".to_string()))
}

#[tracing::instrument(name = "Update product variant", skip(pool))]
pub async fn update_variant(
    pool: &PgPool,
    variant_id: Uuid,
    request: &UpdateVariantRequest,
) -> Result<ProductVariant, GenericError> {
    let current = fetch_variant(pool, variant_id)
        .await?
        .ok_or_else(|| GenericError::DataNotFound("Product variant not found".to_string()))?;

    let price = request.price.clone().unwrap_or(current.price);
    let discount_price = if request.clear_discount_price {
        None
    } else {
        request.discount_price.clone().or(current.discount_price)
    };
    let stock = request.stock.unwrap_or(current.stock);
    validate_variant_pricing(&price, discount_price.as_ref(), stock)
        .map_err(GenericError::ValidationError)?;

    sqlx::query(
        "UPDATE product_type SET variant_name = $1, image_path = $2, price = $3, \
         discount_price = $4, stock = $5, updated_on = $6 WHERE id = $7 AND deleted_on IS NULL",
    )
    .bind(
        request
            .variant_name
            .as_deref()
            .map(str::trim)
            .unwrap_or(&current.variant_name),
    )
    .bind(request.image_path.as_ref().or(current.image_path.as_ref()))
    .bind(&price)
    .bind(&discount_price)
    .bind(stock)
    .bind(Utc::now())
    .bind(variant_id)
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        GenericError::DatabaseError(
            "A database failure occurred while updating variant".to_string(),
            e.into(),
        )
    })?;
    fetch_variant(pool, variant_id)
        .await?
        .ok_or_else(|| GenericError::DataNotFound("Product variant not found".to_string()))
}

/// Takes `quantity` units out of stock only if that many are available.
/// Returns false when the guard rejected the update.
#[tracing::instrument(name = "Reserve variant stock", skip(transaction))]
pub async fn reserve_stock(
    transaction: &mut Transaction<'_, Postgres>,
    variant_id: Uuid,
    quantity: i32,
) -> Result<bool, anyhow::Error> {
    let result = sqlx::query(
        "UPDATE product_type SET stock = stock - $1, sold = sold + $1, updated_on = $2 \
         WHERE id = $3 AND deleted_on IS NULL AND stock >= $1",
    )
    .bind(quantity)
    .bind(Utc::now())
    .bind(variant_id)
    .execute(&mut **transaction)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while reserving stock")
    })?;
    Ok(result.rows_affected() == 1)
}

#[tracing::instrument(name = "Restore variant stock", skip(transaction))]
pub async fn restore_stock(
    transaction: &mut Transaction<'_, Postgres>,
    variant_id: Uuid,
    quantity: i32,
) -> Result<(), anyhow::Error> {
    sqlx::query(
        "UPDATE product_type SET stock = stock + $1, sold = GREATEST(sold - $1, 0), \
         updated_on = $2 WHERE id = $3",
    )
    .bind(quantity)
    .bind(Utc::now())
    .bind(variant_id)
    .execute(&mut **transaction)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while restoring stock")
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::{
        create_product, create_variant, fetch_best_selling, fetch_product_detail, like_pattern,
        list_products, validate_variant_pricing,
    };
    use crate::routes::product::schemas::{
        CreateProductRequest, CreateVariantRequest, ProductListQuery, ProductSortField,
        ProductVariant,
    };
    use crate::schemas::SortOrder;
    use crate::tests::tests::get_test_pool;

    #[test]
    fn test_unit_price_prefers_discount() {
        let mut variant = ProductVariant {
            id: uuid::Uuid::new_v4(),
            product_id: uuid::Uuid::new_v4(),
            product_name: "Hydrating Serum".to_string(),
            brand: None,
            variant_name: "30ml".to_string(),
            image_path: None,
            price: BigDecimal::from(250000),
            discount_price: Some(BigDecimal::from(199000)),
            stock: 5,
            sold: 0,
        };
        assert_eq!(variant.unit_price(), BigDecimal::from(199000));
        variant.discount_price = None;
        assert_eq!(variant.unit_price(), BigDecimal::from(250000));
    }

    #[test]
    fn test_variant_pricing_rules() {
        let price = BigDecimal::from_str("100000.00").unwrap();
        assert!(validate_variant_pricing(&price, None, 0).is_ok());
        assert!(validate_variant_pricing(&price, Some(&BigDecimal::from(90000)), 3).is_ok());
        assert!(validate_variant_pricing(&price, Some(&BigDecimal::from(120000)), 3).is_err());
        assert!(validate_variant_pricing(&price, None, -1).is_err());
        assert!(validate_variant_pricing(&BigDecimal::from(-1), None, 1).is_err());
    }

    #[test]
    fn test_like_pattern_ignores_blank_filters() {
        assert_eq!(like_pattern(Some(" serum ")), Some("%serum%".to_string()));
        assert_eq!(like_pattern(Some("   ")), None);
        assert_eq!(like_pattern(None), None);
        assert_eq!(ProductSortField::Price.column(), "min_price");
        assert_eq!(ProductSortField::Sold.column(), "total_sold");
    }

    fn query(keyword: &str) -> ProductListQuery {
        ProductListQuery {
            keyword: Some(keyword.to_string()),
            brand: None,
            min_price: None,
            max_price: None,
            sort_by: None,
            sort_order: None,
            page: None,
            limit: None,
        }
    }

    #[tokio::test]
    #[ignore = "requires a running postgres instance"]
    async fn test_catalog_search_detail_and_best_sellers() {
        let pool = get_test_pool().await;
        let tag = uuid::Uuid::new_v4().simple().to_string()[..10].to_string();
        let mut product_ids = Vec::new();
        for (name, price, sold) in [("Lip Tint", 150000, 70), ("Lip Balm", 90000, 40)] {
            let product = create_product(
                &pool,
                &CreateProductRequest {
                    name: format!("{} {}", name, tag),
                    description: Some("Long lasting colour".to_string()),
                    brand: Some("Petal".to_string()),
                },
            )
            .await
            .unwrap();
            let variant = create_variant(
                &pool,
                &CreateVariantRequest {
                    product_id: product.id,
                    variant_name: "Rose".to_string(),
                    image_path: None,
                    price: BigDecimal::from(price),
                    discount_price: None,
                    stock: 20,
                },
            )
            .await
            .unwrap();
            sqlx::query("UPDATE product_type SET sold = $1 WHERE id = $2")
                .bind(sold)
                .bind(variant.id)
                .execute(&pool)
                .await
                .unwrap();
            product_ids.push(product.id);
        }

        let all = list_products(&pool, &query(&tag)).await.unwrap();
        assert_eq!(all.total, 2);
        assert_eq!(all.items.len(), 2);

        let cheapest_first = list_products(
            &pool,
            &ProductListQuery {
                sort_by: Some(ProductSortField::Price),
                sort_order: Some(SortOrder::Asc),
                ..query(&tag)
            },
        )
        .await
        .unwrap();
        assert_eq!(cheapest_first.items[0].id, product_ids[1]);
        assert_eq!(cheapest_first.items[0].min_price, Some(BigDecimal::from(90000)));

        let bounded = list_products(
            &pool,
            &ProductListQuery {
                min_price: Some(BigDecimal::from(100000)),
                ..query(&tag)
            },
        )
        .await
        .unwrap();
        assert_eq!(bounded.total, 1);
        assert_eq!(bounded.items[0].id, product_ids[0]);
        assert_eq!(bounded.items[0].total_sold, 70);

        let paged = list_products(
            &pool,
            &ProductListQuery {
                page: Some(2),
                limit: Some(1),
                ..query(&tag)
            },
        )
        .await
        .unwrap();
        assert_eq!(paged.total, 2);
        assert_eq!(paged.items.len(), 1);

        let detail = fetch_product_detail(&pool, product_ids[0]).await.unwrap().unwrap();
        assert_eq!(detail.variants.len(), 1);
        assert_eq!(detail.variants[0].variant_name, "Rose");
        assert!(fetch_product_detail(&pool, uuid::Uuid::new_v4())
            .await
            .unwrap()
            .is_none());

        let best = fetch_best_selling(&pool, Some(100)).await.unwrap();
        let tint = best.iter().position(|p| p.id == product_ids[0]).unwrap();
        let balm = best.iter().position(|p| p.id == product_ids[1]).unwrap();
        assert!(tint < balm);
    }
}
