use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::models::CartItemModel;
use super::schemas::{CartLine, CartView};
use crate::errors::GenericError;
use crate::routes::product::schemas::ProductVariant;
use crate::routes::product::utils::{fetch_variant, fetch_variants_by_ids, insufficient_stock};

pub fn validate_quantity(quantity: i32) -> Result<(), GenericError> {
    if quantity <= 0 {
        return Err(GenericError::ValidationError(
            "Quantity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Returns the caller's cart id, creating the cart on first use.
#[tracing::instrument(name = "Get or create cart", skip(pool))]
pub async fn get_or_create_cart(pool: &PgPool, user_id: Uuid) -> Result<Uuid, anyhow::Error> {
    sqlx::query(
        "INSERT INTO cart (id, user_id, created_on) VALUES ($1, $2, $3) \
         ON CONFLICT (user_id) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while creating cart")
    })?;
    let (cart_id,): (Uuid,) = sqlx::query_as("SELECT id FROM cart WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            anyhow::Error::new(e).context("A database failure occurred while fetching cart")
        })?;
    Ok(cart_id)
}

#[tracing::instrument(name = "Fetch cart items", skip(pool))]
async fn fetch_cart_items(pool: &PgPool, cart_id: Uuid) -> Result<Vec<CartItemModel>, anyhow::Error> {
    sqlx::query_as::<_, CartItemModel>(
        "SELECT id, cart_id, product_type_id, quantity FROM cart_item \
         WHERE cart_id = $1 ORDER BY created_on",
    )
    .bind(cart_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while fetching cart items")
    })
}

#[tracing::instrument(name = "Fetch cart item of user", skip(pool))]
async fn fetch_user_cart_item(
    pool: &PgPool,
    user_id: Uuid,
    item_id: Uuid,
) -> Result<Option<CartItemModel>, anyhow::Error> {
    sqlx::query_as::<_, CartItemModel>(
        "SELECT ci.id, ci.cart_id, ci.product_type_id, ci.quantity FROM cart_item ci \
         INNER JOIN cart c ON c.id = ci.cart_id WHERE ci.id = $1 AND c.user_id = $2",
    )
    .bind(item_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while fetching cart item")
    })
}

/// Joins cart rows with their variants. Lines whose variant was removed
/// from the catalog are dropped from the view.
pub fn build_cart_view(
    cart_id: Uuid,
    items: Vec<CartItemModel>,
    variants: Vec<ProductVariant>,
) -> CartView {
    let mut variant_map: HashMap<Uuid, ProductVariant> =
        variants.into_iter().map(|v| (v.id, v)).collect();
    let mut subtotal = BigDecimal::from(0);
    let mut total_quantity = 0i64;
    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        let Some(variant) = variant_map.remove(&item.product_type_id) else {
            continue;
        };
        let unit_price = variant.unit_price();
        let line_total = &unit_price * BigDecimal::from(item.quantity);
        subtotal += &line_total;
        total_quantity += i64::from(item.quantity);
        lines.push(CartLine {
            id: item.id,
            in_stock: variant.stock >= item.quantity,
            variant,
            quantity: item.quantity,
            unit_price,
            line_total,
        });
    }
    CartView {
        id: cart_id,
        items: lines,
        total_quantity,
        subtotal,
    }
}

#[tracing::instrument(name = "Fetch cart", skip(pool))]
pub async fn fetch_cart(pool: &PgPool, user_id: Uuid) -> Result<CartView, anyhow::Error> {
    let cart_id = get_or_create_cart(pool, user_id).await?;
    let items = fetch_cart_items(pool, cart_id).await?;
    let variant_ids: Vec<Uuid> = items.iter().map(|i| i.product_type_id).collect();
    let variants = fetch_variants_by_ids(pool, &variant_ids).await?;
    Ok(build_cart_view(cart_id, items, variants))
}

/// Adds to the cart, merging into an existing line for the same variant.
/// Stock is checked against the merged quantity.
#[tracing::instrument(name = "Add cart item", skip(pool))]
pub async fn add_cart_item(
    pool: &PgPool,
    user_id: Uuid,
    variant_id: Uuid,
    quantity: i32,
) -> Result<CartView, GenericError> {
    validate_quantity(quantity)?;
    let variant = fetch_variant(pool, variant_id)
        .await?
        .ok_or_else(|| GenericError::DataNotFound("Product variant not found".to_string()))?;
    let cart_id = get_or_create_cart(pool, user_id).await?;

    let existing: Option<(i32,)> = sqlx::query_as(
        "SELECT quantity FROM cart_item WHERE cart_id = $1 AND product_type_id = $2",
    )
    .bind(cart_id)
    .bind(variant_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        GenericError::DatabaseError(
            "A database failure occurred while fetching cart item".to_string(),
            e.into(),
        )
    })?;
    let merged = existing.map(|(q,)| q).unwrap_or(0) + quantity;
    if variant.stock < merged {
        return Err(insufficient_stock(&variant, merged));
    }

    sqlx::query(
        "INSERT INTO cart_item (id, cart_id, product_type_id, quantity, created_on) \
         VALUES ($1, $2, $3, $4, $5) ON CONFLICT (cart_id, product_type_id) \
         DO UPDATE SET quantity = cart_item.quantity + EXCLUDED.quantity, updated_on = EXCLUDED.created_on",
    )
    .bind(Uuid::new_v4())
    .bind(cart_id)
    .bind(variant_id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        GenericError::DatabaseError(
            "A database failure occurred while saving cart item".to_string(),
            e.into(),
        )
    })?;
    Ok(fetch_cart(pool, user_id).await?)
}

#[tracing::instrument(name = "Update cart item", skip(pool))]
pub async fn update_cart_item(
    pool: &PgPool,
    user_id: Uuid,
    item_id: Uuid,
    quantity: i32,
) -> Result<CartView, GenericError> {
    validate_quantity(quantity)?;
    let item = fetch_user_cart_item(pool, user_id, item_id)
        .await?
        .ok_or_else(|| GenericError::DataNotFound("Cart item not found".to_string()))?;
    let variant = fetch_variant(pool, item.product_type_id)
        .await?
        .ok_or_else(|| GenericError::DataNotFound("Product variant not found".to_string()))?;
    if variant.stock < quantity {
        return Err(insufficient_stock(&variant, quantity));
    }
    sqlx::query("UPDATE cart_item SET quantity = $1, updated_on = $2 WHERE id = $3")
        .bind(quantity)
        .bind(Utc::now())
        .bind(item.id)
        .execute(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            GenericError::DatabaseError(
                "A database failure occurred while updating cart item".to_string(),
                e.into(),
            )
        })?;
    Ok(fetch_cart(pool, user_id).await?)
}

#[tracing::instrument(name = "Delete cart item", skip(pool))]
pub async fn delete_cart_item(
    pool: &PgPool,
    user_id: Uuid,
    item_id: Uuid,
) -> Result<CartView, GenericError> {
    let result = sqlx::query(
        "DELETE FROM cart_item ci USING cart c WHERE ci.cart_id = c.id \
         AND ci.id = $1 AND c.user_id = $2",
    )
    .bind(item_id)
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        GenericError::DatabaseError(
            "A database failure occurred while deleting cart item".to_string(),
            e.into(),
        )
    })?;
    if result.rows_affected() == 0 {
        return Err(GenericError::DataNotFound("Cart item not found".to_string()));
    }
    Ok(fetch_cart(pool, user_id).await?)
}

/// Hard-deletes the given lines from the user's cart. Ids that belong to
/// another user are ignored.
#[tracing::instrument(name = "Delete ordered cart lines", skip(transaction))]
pub async fn delete_cart_lines(
    transaction: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    cart_line_ids: &[Uuid],
) -> Result<u64, anyhow::Error> {
    if cart_line_ids.is_empty() {
        return Ok(0);
    }
    let result = sqlx::query(
        "DELETE FROM cart_item ci USING cart c WHERE ci.cart_id = c.id \
         AND c.user_id = $1 AND ci.id = ANY($2)",
    )
    .bind(user_id)
    .bind(cart_line_ids)
    .execute(&mut **transaction)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while clearing cart lines")
    })?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;
    use uuid::Uuid;

    use super::{build_cart_view, validate_quantity};
    use crate::routes::cart::models::CartItemModel;
    use crate::routes::product::schemas::ProductVariant;

    fn variant(price: i64, discount: Option<i64>, stock: i32) -> ProductVariant {
        ProductVariant {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            product_name: "Cleansing Foam".to_string(),
            brand: Some("Hada".to_string()),
            variant_name: "150ml".to_string(),
            image_path: None,
            price: BigDecimal::from(price),
            discount_price: discount.map(BigDecimal::from),
            stock,
            sold: 0,
        }
    }

    #[test]
    fn test_cart_view_totals_use_effective_price() {
        let foam = variant(120000, Some(99000), 10);
        let toner = variant(80000, None, 1);
        let cart_id = Uuid::new_v4();
        let items = vec![
            CartItemModel {
                id: Uuid::new_v4(),
                cart_id,
                product_type_id: foam.id,
                quantity: 2,
            },
            CartItemModel {
                id: Uuid::new_v4(),
                cart_id,
                product_type_id: toner.id,
                quantity: 3,
            },
            CartItemModel {
                id: Uuid::new_v4(),
                cart_id,
                product_type_id: Uuid::new_v4(),
                quantity: 1,
            },
        ];
        let view = build_cart_view(cart_id, items, vec![foam, toner]);
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.total_quantity, 5);
        assert_eq!(view.subtotal, BigDecimal::from(2 * 99000 + 3 * 80000));
        assert!(view.items[0].in_stock);
        assert!(!view.items[1].in_stock);
    }

    #[test]
    fn test_quantity_must_be_positive() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-2).is_err());
    }
}
