use anyhow::Context;
use chrono::Utc;
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::models::AddressModel;
use super::schemas::{Address, CreateAddressRequest};
use crate::administrative::AdministrativeDirectory;
use crate::errors::GenericError;

const ADDRESS_COLUMNS: &str = "id, user_id, full_name, phone_number, province, district, ward, \
                               detail, is_default, created_on";

#[tracing::instrument(name = "Fetch addresses of user", skip(pool))]
pub async fn fetch_user_addresses(pool: &PgPool, user_id: Uuid) -> Result<Vec<Address>, anyhow::Error> {
    let query = format!(
        "SELECT {} FROM address WHERE user_id = $1 AND deleted_on IS NULL \
         ORDER BY is_default DESC, created_on DESC",
        ADDRESS_COLUMNS
    );
    let rows = sqlx::query_as::<_, AddressModel>(&query)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            anyhow::Error::new(e).context("A database failure occurred while fetching addresses")
        })?;
    Ok(rows.into_iter().map(AddressModel::into_schema).collect())
}

/// The address only if it is live and owned by `user_id`.
#[tracing::instrument(name = "Fetch address of user", skip(executor))]
pub async fn fetch_user_address<'a, E>(
    executor: E,
    user_id: Uuid,
    address_id: Uuid,
) -> Result<Option<Address>, anyhow::Error>
where
    E: PgExecutor<'a>,
{
    let query = format!(
        "SELECT {} FROM address WHERE id = $1 AND user_id = $2 AND deleted_on IS NULL",
        ADDRESS_COLUMNS
    );
    let row = sqlx::query_as::<_, AddressModel>(&query)
        .bind(address_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            anyhow::Error::new(e).context("A database failure occurred while fetching address")
        })?;
    Ok(row.map(AddressModel::into_schema))
}

/// Address as recorded on an order, including ones the owner has since
/// deleted.
#[tracing::instrument(name = "Fetch order address", skip(executor))]
pub async fn fetch_address_for_order<'a, E>(
    executor: E,
    address_id: Uuid,
) -> Result<Option<Address>, anyhow::Error>
where
    E: PgExecutor<'a>,
{
    let query = format!("SELECT {} FROM address WHERE id = $1", ADDRESS_COLUMNS);
    let row = sqlx::query_as::<_, AddressModel>(&query)
        .bind(address_id)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            anyhow::Error::new(e).context("A database failure occurred while fetching address")
        })?;
    Ok(row.map(AddressModel::into_schema))
}

async fn clear_default(
    transaction: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> Result<(), anyhow::Error> {
    sqlx::query(
        "UPDATE address SET is_default = false, updated_on = $1 \
         WHERE user_id = $2 AND is_default AND deleted_on IS NULL",
    )
    .bind(Utc::now())
    .bind(user_id)
    .execute(&mut **transaction)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while clearing default address")
    })?;
    Ok(())
}

#[tracing::instrument(name = "Create address", skip(pool, directory))]
pub async fn create_address(
    pool: &PgPool,
    directory: &AdministrativeDirectory,
    user_id: Uuid,
    request: &CreateAddressRequest,
) -> Result<Address, GenericError> {
    directory
        .validate_location(&request.province, &request.district, &request.ward)
        .map_err(GenericError::ValidationError)?;

    let mut transaction = pool
        .begin()
        .await
        .context("Failed to acquire a Postgres connection from the pool")?;
    let (existing,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM address WHERE user_id = $1 AND deleted_on IS NULL",
    )
    .bind(user_id)
    .fetch_one(&mut *transaction)
    .await
    .context("A database failure occurred while counting addresses")?;
    let is_default = request.is_default || existing == 0;
    if is_default {
        clear_default(&mut transaction, user_id).await?;
    }

    let query = format!(
        "INSERT INTO address (id, user_id, full_name, phone_number, province, district, ward, \
         detail, is_default, created_on) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING {}",
        ADDRESS_COLUMNS
    );
    let row = sqlx::query_as::<_, AddressModel>(&query)
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(request.full_name.trim())
        .bind(request.phone_number.trim())
        .bind(request.province.trim())
        .bind(request.district.trim())
        .bind(request.ward.trim())
        .bind(request.detail.trim())
        .bind(is_default)
        .bind(Utc::now())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            GenericError::DatabaseError(
                "A database failure occurred while saving address".to_string(),
                e.into(),
            )
        })?;
    transaction
        .commit()
        .await
        .context("Failed to commit SQL transaction to store a new address")?;
    Ok(row.into_schema())
}

#[tracing::instrument(name = "Set default address", skip(pool))]
pub async fn set_default_address(
    pool: &PgPool,
    user_id: Uuid,
    address_id: Uuid,
) -> Result<Address, GenericError> {
    let mut transaction = pool
        .begin()
        .await
        .context("Failed to acquire a Postgres connection from the pool")?;
    let address = fetch_user_address(&mut *transaction, user_id, address_id)
        .await?
        .ok_or_else(|| GenericError::DataNotFound("Address not found".to_string()))?;
    clear_default(&mut transaction, user_id).await?;
    sqlx::query("UPDATE address SET is_default = true, updated_on = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(address.id)
        .execute(&mut *transaction)
        .await
        .context("A database failure occurred while setting default address")?;
    transaction
        .commit()
        .await
        .context("Failed to commit SQL transaction to set default address")?;
    Ok(Address {
        is_default: true,
        ..address
    })
}

/// Soft-deletes the address. When it was the default, the newest remaining
/// address takes over.
#[tracing::instrument(name = "Delete address", skip(pool))]
pub async fn delete_address(
    pool: &PgPool,
    user_id: Uuid,
    address_id: Uuid,
) -> Result<(), GenericError> {
    let mut transaction = pool
        .begin()
        .await
        .context("Failed to acquire a Postgres connection from the pool")?;
    let address = fetch_user_address(&mut *transaction, user_id, address_id)
        .await?
        .ok_or_else(|| GenericError::DataNotFound("Address not found".to_string()))?;
    let now = Utc::now();
    sqlx::query("UPDATE address SET deleted_on = $1, is_default = false WHERE id = $2")
        .bind(now)
        .bind(address.id)
        .execute(&mut *transaction)
        .await
        .context("A database failure occurred while deleting address")?;
    if address.is_default {
        sqlx::query(
            "UPDATE address SET is_default = true, updated_on = $1 WHERE id = (\
             SELECT id FROM address WHERE user_id = $2 AND deleted_on IS NULL \
             ORDER BY created_on DESC LIMIT 1)",
        )
        .bind(now)
        .bind(user_id)
        .execute(&mut *transaction)
        .await
        .context("A database failure occurred while promoting default address")?;
    }
    transaction
        .commit()
        .await
        .context("Failed to commit SQL transaction to delete address")?;
    Ok(())
}
