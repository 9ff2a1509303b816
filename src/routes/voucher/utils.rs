use bigdecimal::{BigDecimal, RoundingMode};
use chrono::Utc;
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::models::VoucherModel;
use super::schemas::{
    CreateVoucherRequest, UpdateVoucherRequest, Voucher, VoucherEvaluation, VoucherListQuery,
    VoucherSortField,
};
use crate::errors::GenericError;
use crate::schemas::{PaginatedList, PaginationQuery, SortOrder};

const VOUCHER_COLUMNS: &str =
    "id, code, description, discount, min_order_amount, max_discount, quantity, created_on";

pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Validates a voucher against an order subtotal and computes the discount.
///
/// The discount is `subtotal * discount / 100`, capped by `max_discount`
/// when set and never larger than the subtotal. Amounts are kept at two
/// decimal places, the precision orders are stored with.
pub fn evaluate_voucher(voucher: Option<&Voucher>, subtotal: &BigDecimal) -> VoucherEvaluation {
    let zero = BigDecimal::from(0);
    let invalid = |message: String| VoucherEvaluation {
        valid: false,
        discount_amount: zero.clone(),
        message,
    };
    let Some(voucher) = voucher else {
        return invalid("Voucher code does not exist".to_string());
    };
    if voucher.quantity <= 0 {
        return invalid("Voucher has no uses left".to_string());
    }
    if let Some(min_order_amount) = &voucher.min_order_amount {
        if subtotal < min_order_amount {
            return invalid(format!(
                "Minimum order of {} is required to use this voucher",
                min_order_amount.with_scale_round(0, RoundingMode::HalfUp)
            ));
        }
    }

    let mut discount_amount = (subtotal * &voucher.discount / BigDecimal::from(100))
        .with_scale_round(2, RoundingMode::HalfUp);
    if let Some(max_discount) = &voucher.max_discount {
        if *max_discount > zero && discount_amount > *max_discount {
            discount_amount = max_discount.clone();
        }
    }
    if discount_amount > *subtotal {
        discount_amount = subtotal.clone();
    }
    if discount_amount < zero {
        discount_amount = zero;
    }

    VoucherEvaluation {
        valid: true,
        discount_amount,
        message: format!("Voucher {} applied", voucher.code),
    }
}

pub fn validate_voucher_fields(
    discount: &BigDecimal,
    min_order_amount: Option<&BigDecimal>,
    max_discount: Option<&BigDecimal>,
    quantity: i32,
) -> Result<(), String> {
    let zero = BigDecimal::from(0);
    if *discount < zero || *discount > BigDecimal::from(100) {
        return Err("Discount must be a percentage between 0 and 100".to_string());
    }
    if min_order_amount.is_some_and(|v| *v < zero) {
        return Err("Minimum order amount cannot be negative".to_string());
    }
    if max_discount.is_some_and(|v| *v < zero) {
        return Err("Maximum discount cannot be negative".to_string());
    }
    if quantity < 0 {
        return Err("Quantity cannot be negative".to_string());
    }
    Ok(())
}

#[tracing::instrument(name = "Fetch voucher by code", skip(executor))]
pub async fn fetch_voucher_by_code<'a, E>(
    executor: E,
    code: &str,
) -> Result<Option<Voucher>, anyhow::Error>
where
    E: PgExecutor<'a>,
{
    let query = format!(
        "SELECT {} FROM voucher WHERE code = $1 AND deleted_on IS NULL",
        VOUCHER_COLUMNS
    );
    let row = sqlx::query_as::<_, VoucherModel>(&query)
        .bind(normalize_code(code))
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            anyhow::Error::new(e).context("A database failure occurred while fetching voucher")
        })?;
    Ok(row.map(VoucherModel::into_schema))
}

#[tracing::instrument(name = "Fetch voucher", skip(pool))]
pub async fn fetch_voucher(pool: &PgPool, voucher_id: Uuid) -> Result<Option<Voucher>, anyhow::Error> {
    let query = format!(
        "SELECT {} FROM voucher WHERE id = $1 AND deleted_on IS NULL",
        VOUCHER_COLUMNS
    );
    let row = sqlx::query_as::<_, VoucherModel>(&query)
        .bind(voucher_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            anyhow::Error::new(e).context("A database failure occurred while fetching voucher")
        })?;
    Ok(row.map(VoucherModel::into_schema))
}

#[tracing::instrument(name = "Validate voucher code", skip(pool))]
pub async fn validate_voucher_code(
    pool: &PgPool,
    code: &str,
    subtotal: &BigDecimal,
) -> Result<VoucherEvaluation, anyhow::Error> {
    let voucher = fetch_voucher_by_code(pool, code).await?;
    Ok(evaluate_voucher(voucher.as_ref(), subtotal))
}

/// Uses up one redemption. Returns false when the voucher was exhausted or
/// removed in the meantime.
#[tracing::instrument(name = "Consume voucher use", skip(transaction))]
pub async fn consume_voucher(
    transaction: &mut Transaction<'_, Postgres>,
    voucher_id: Uuid,
) -> Result<bool, anyhow::Error> {
    let result = sqlx::query(
        "UPDATE voucher SET quantity = quantity - 1, updated_on = $1 \
         WHERE id = $2 AND deleted_on IS NULL AND quantity > 0",
    )
    .bind(Utc::now())
    .bind(voucher_id)
    .execute(&mut **transaction)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while consuming voucher")
    })?;
    Ok(result.rows_affected() == 1)
}

#[tracing::instrument(name = "Create voucher", skip(pool))]
pub async fn create_voucher(
    pool: &PgPool,
    request: &CreateVoucherRequest,
    created_by: Uuid,
) -> Result<Voucher, GenericError> {
    let code = normalize_code(&request.code);
    if code.is_empty() {
        return Err(GenericError::ValidationError(
            "Voucher code is required".to_string(),
        ));
    }
    validate_voucher_fields(
        &request.discount,
        request.min_order_amount.as_ref(),
        request.max_discount.as_ref(),
        request.quantity,
    )
    .map_err(GenericError::ValidationError)?;
    if fetch_voucher_by_code(pool, &code).await?.is_some() {
        return Err(GenericError::conflict("Voucher code already exists"));
    }

    let query = format!(
        "INSERT INTO voucher (id, code, description, discount, min_order_amount, max_discount, \
         quantity, created_by, created_on) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING {}",
        VOUCHER_COLUMNS
    );
    let row = sqlx::query_as::<_, VoucherModel>(&query)
        .bind(Uuid::new_v4())
        .bind(&code)
        .bind(&request.description)
        .bind(&request.discount)
        .bind(&request.min_order_amount)
        .bind(&request.max_discount)
        .bind(request.quantity)
        .bind(created_by)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if let Some(db_error) = e.as_database_error() {
                if db_error.is_unique_violation() {
                    return GenericError::conflict("Voucher code already exists");
                }
            }
            tracing::error!("Failed to execute query: {:?}", e);
            GenericError::DatabaseError(
                "A database failure occurred while saving voucher".to_string(),
                e.into(),
            )
        })?;
    Ok(row.into_schema())
}

#[tracing::instrument(name = "Update voucher", skip(pool))]
pub async fn update_voucher(
    pool: &PgPool,
    voucher_id: Uuid,
    request: &UpdateVoucherRequest,
) -> Result<Voucher, GenericError> {
    let current = fetch_voucher(pool, voucher_id)
        .await?
        .ok_or_else(|| GenericError::DataNotFound("Voucher not found".to_string()))?;
    let discount = request.discount.clone().unwrap_or(current.discount);
    let min_order_amount = request.min_order_amount.clone().or(current.min_order_amount);
    let max_discount = request.max_discount.clone().or(current.max_discount);
    let quantity = request.quantity.unwrap_or(current.quantity);
    validate_voucher_fields(
        &discount,
        min_order_amount.as_ref(),
        max_discount.as_ref(),
        quantity,
    )
    .map_err(GenericError::ValidationError)?;

    let query = format!(
        "UPDATE voucher SET description = $1, discount = $2, min_order_amount = $3, \
         max_discount = $4, quantity = $5, updated_on = $6 \
         WHERE id = $7 AND deleted_on IS NULL RETURNING {}",
        VOUCHER_COLUMNS
    );
    let row = sqlx::query_as::<_, VoucherModel>(&query)
        .bind(request.description.as_ref().or(current.description.as_ref()))
        .bind(&discount)
        .bind(&min_order_amount)
        .bind(&max_discount)
        .bind(quantity)
        .bind(Utc::now())
        .bind(voucher_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            GenericError::DatabaseError(
                "A database failure occurred while updating voucher".to_string(),
                e.into(),
            )
        })?
        .ok_or_else(|| GenericError::DataNotFound("Voucher not found".to_string()))?;
    Ok(row.into_schema())
}

#[tracing::instrument(name = "Delete voucher", skip(pool))]
pub async fn soft_delete_voucher(pool: &PgPool, voucher_id: Uuid) -> Result<(), GenericError> {
    let result = sqlx::query(
        "UPDATE voucher SET deleted_on = $1 WHERE id = $2 AND deleted_on IS NULL",
    )
    .bind(Utc::now())
    .bind(voucher_id)
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        GenericError::DatabaseError(
            "A database failure occurred while deleting voucher".to_string(),
            e.into(),
        )
    })?;
    if result.rows_affected() == 0 {
        return Err(GenericError::DataNotFound("Voucher not found".to_string()));
    }
    Ok(())
}

#[tracing::instrument(name = "List vouchers", skip(pool))]
pub async fn list_vouchers(
    pool: &PgPool,
    query: &VoucherListQuery,
) -> Result<PaginatedList<Voucher>, anyhow::Error> {
    let pagination = PaginationQuery {
        page: query.page,
        limit: query.limit,
    };
    let search = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| format!("%{}%", q));
    let filter = "deleted_on IS NULL \
                  AND ($1::TEXT IS NULL OR code ILIKE $1 OR description ILIKE $1) \
                  AND ($2::NUMERIC IS NULL OR discount >= $2) \
                  AND ($3::NUMERIC IS NULL OR discount <= $3)";

    let (total,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM voucher WHERE {}", filter))
        .bind(&search)
        .bind(&query.min_discount)
        .bind(&query.max_discount)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            anyhow::Error::new(e).context("A database failure occurred while counting vouchers")
        })?;

    // Sort column and direction come from closed enums, never from raw input.
    let sql = format!(
        "SELECT {} FROM voucher WHERE {} ORDER BY {} {}, id LIMIT $4 OFFSET $5",
        VOUCHER_COLUMNS,
        filter,
        query
            .sort_by
            .unwrap_or(VoucherSortField::CreatedOn)
            .column(),
        query.sort_order.unwrap_or(SortOrder::Desc).as_sql()
    );
    let rows = sqlx::query_as::<_, VoucherModel>(&sql)
        .bind(&search)
        .bind(&query.min_discount)
        .bind(&query.max_discount)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            anyhow::Error::new(e).context("A database failure occurred while listing vouchers")
        })?;

    Ok(PaginatedList {
        items: rows.into_iter().map(VoucherModel::into_schema).collect(),
        total,
        page: query.page.unwrap_or(1).max(1),
        limit: pagination.limit(),
    })
}
