use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::schemas::WishlistItem;
use crate::errors::GenericError;
use crate::routes::product::utils::{fetch_variant, fetch_variants_by_ids};

#[tracing::instrument(name = "Fetch wishlist", skip(pool))]
pub async fn fetch_wishlist(pool: &PgPool, user_id: Uuid) -> Result<Vec<WishlistItem>, anyhow::Error> {
    let rows: Vec<(Uuid, Uuid, DateTime<Utc>)> = sqlx::query_as(
        "SELECT id, product_type_id, created_on FROM wishlist_item \
         WHERE user_id = $1 ORDER BY created_on DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while fetching wishlist")
    })?;
    let variant_ids: Vec<Uuid> = rows.iter().map(|(_, variant_id, _)| *variant_id).collect();
    let mut variants: HashMap<Uuid, _> = fetch_variants_by_ids(pool, &variant_ids)
        .await?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();
    Ok(rows
        .into_iter()
        .filter_map(|(id, variant_id, created_on)| {
            variants.remove(&variant_id).map(|variant| WishlistItem {
                id,
                variant,
                created_on,
            })
        })
        .collect())
}

#[tracing::instrument(name = "Add wishlist item", skip(pool))]
pub async fn add_wishlist_item(
    pool: &PgPool,
    user_id: Uuid,
    variant_id: Uuid,
) -> Result<Vec<WishlistItem>, GenericError> {
    if fetch_variant(pool, variant_id).await?.is_none() {
        return Err(GenericError::DataNotFound(
            "Product variant not found".to_string(),
        ));
    }
    let result = sqlx::query(
        "INSERT INTO wishlist_item (id, user_id, product_type_id, created_on) \
         VALUES ($1, $2, $3, $4) ON CONFLICT (user_id, product_type_id) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(variant_id)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        GenericError::DatabaseError(
            "A database failure occurred while saving wishlist item".to_string(),
            e.into(),
        )
    })?;
    if result.rows_affected() == 0 {
        return Err(GenericError::conflict("Product is already in your wishlist"));
    }
    Ok(fetch_wishlist(pool, user_id).await?)
}

#[tracing::instrument(name = "Delete wishlist item", skip(pool))]
pub async fn delete_wishlist_item(
    pool: &PgPool,
    user_id: Uuid,
    item_id: Uuid,
) -> Result<Vec<WishlistItem>, GenericError> {
    let result = sqlx::query("DELETE FROM wishlist_item WHERE id = $1 AND user_id = $2")
        .bind(item_id)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            GenericError::DatabaseError(
                "A database failure occurred while deleting wishlist item".to_string(),
                e.into(),
            )
        })?;
    if result.rows_affected() == 0 {
        return Err(GenericError::DataNotFound(
            "Wishlist item not found".to_string(),
        ));
    }
    Ok(fetch_wishlist(pool, user_id).await?)
}
