use std::collections::HashMap;

use anyhow::Context;
use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::errors::CheckoutError;
use super::models::{OrderModel, PaymentModel};
use super::schemas::{
    AppliedVoucher, CheckoutItem, CreateOrderRequest, OrderPreview, OrderStatus, PaymentMethod,
    PaymentStatus, PreviewLineItem, SePayWebhookRequest, TransitionActor, WebhookResponse,
};
use crate::routes::address::utils::fetch_user_address;
use crate::routes::cart::utils::delete_cart_lines;
use crate::routes::notification::schemas::{NewNotification, NotificationType};
use crate::routes::notification::utils::{create_notification, notify_admins};
use crate::routes::product::schemas::ProductVariant;
use crate::routes::product::utils::{fetch_variant, fetch_variants_by_ids, reserve_stock, restore_stock};
use crate::routes::voucher::schemas::Voucher;
use crate::routes::voucher::utils::{consume_voucher, evaluate_voucher, fetch_voucher_by_code};
use crate::sepay_client::{extract_payment_codes, generate_payment_code};

const ORDER_COLUMNS: &str = "id, user_id, address_id, voucher_id, payment_code, status, \
     payment_method, total_amount, discount_amount, final_amount, note, created_on, updated_on";
const PAYMENT_COLUMNS: &str =
    "id, order_id, method, status, transaction_id, amount, created_on, updated_on";
const PAYMENT_CODE_ATTEMPTS: usize = 5;

pub fn payment_deadline(created_on: DateTime<Utc>, timeout_minutes: i64) -> DateTime<Utc> {
    created_on + Duration::minutes(timeout_minutes)
}

/// Only pending bank transfer orders can run out of time.
pub fn is_payment_expired(
    status: OrderStatus,
    method: PaymentMethod,
    created_on: DateTime<Utc>,
    timeout_minutes: i64,
    now: DateTime<Utc>,
) -> bool {
    status == OrderStatus::Pending
        && method == PaymentMethod::Sepay
        && now > payment_deadline(created_on, timeout_minutes)
}

pub fn remaining_seconds(
    status: OrderStatus,
    method: PaymentMethod,
    created_on: DateTime<Utc>,
    timeout_minutes: i64,
    now: DateTime<Utc>,
) -> i64 {
    if status != OrderStatus::Pending || method != PaymentMethod::Sepay {
        return 0;
    }
    (payment_deadline(created_on, timeout_minutes) - now)
        .num_seconds()
        .max(0)
}

/// Order lifecycle rules.
///
/// `pending -> confirmed -> processing -> shipping -> delivered -> completed`,
/// with `cancelled` reachable from `pending` only. A pending bank transfer
/// order is confirmed by the payment, a pending COD order by an admin.
/// Customers may only cancel their pending COD orders.
pub fn check_transition(
    current: OrderStatus,
    method: PaymentMethod,
    target: OrderStatus,
    actor: TransitionActor,
) -> Result<(), CheckoutError> {
    use OrderStatus::*;

    let allowed = match (current, target) {
        (Pending, Cancelled) => match actor {
            TransitionActor::Customer => method == PaymentMethod::Cod,
            TransitionActor::System | TransitionActor::Admin => true,
        },
        (Pending, Confirmed) => match method {
            PaymentMethod::Sepay => actor == TransitionActor::System,
            PaymentMethod::Cod => actor == TransitionActor::Admin,
        },
        (Confirmed, Processing)
        | (Processing, Shipping)
        | (Shipping, Delivered)
        | (Delivered, Completed) => actor == TransitionActor::Admin,
        _ => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(CheckoutError::InvalidState(current))
    }
}

pub fn amount_matches(received: &BigDecimal, expected: &BigDecimal, tolerance: i64) -> bool {
    (received - expected).abs() <= BigDecimal::from(tolerance)
}

pub fn validate_items(items: &[CheckoutItem]) -> Result<(), CheckoutError> {
    if items.is_empty() {
        return Err(CheckoutError::InvalidRequest(
            "At least one item is required".to_string(),
        ));
    }
    if let Some(item) = items.iter().find(|i| i.quantity <= 0) {
        return Err(CheckoutError::InvalidRequest(format!(
            "Quantity for variant {} must be at least 1",
            item.variant_id
        )));
    }
    Ok(())
}

/// Prices the requested lines against live variants. An invalid voucher is
/// skipped, never an error.
pub fn build_preview(
    items: &[CheckoutItem],
    variants: &[ProductVariant],
    voucher: Option<&Voucher>,
    address_id: Option<Uuid>,
) -> Result<OrderPreview, CheckoutError> {
    validate_items(items)?;
    let variant_map: HashMap<Uuid, &ProductVariant> = variants.iter().map(|v| (v.id, v)).collect();

    let mut subtotal = BigDecimal::from(0);
    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        let variant = variant_map
            .get(&item.variant_id)
            .ok_or(CheckoutError::VariantNotFound(item.variant_id))?;
        if variant.stock < item.quantity {
            return Err(CheckoutError::InsufficientStock {
                variant: Box::new((*variant).clone()),
                requested: item.quantity,
            });
        }
        let unit_price = variant.unit_price();
        let line_total = &unit_price * BigDecimal::from(item.quantity);
        subtotal += &line_total;
        lines.push(PreviewLineItem {
            cart_line_id: item.cart_line_id,
            variant_id: variant.id,
            product_name: variant.product_name.clone(),
            variant_name: variant.variant_name.clone(),
            image: variant.image_path.clone(),
            quantity: item.quantity,
            price: variant.price.clone(),
            discount_price: variant.discount_price.clone(),
            unit_price,
            line_total,
        });
    }
    let subtotal = subtotal.with_scale_round(2, RoundingMode::HalfUp);

    let mut discount = BigDecimal::from(0);
    let mut applied = None;
    if let Some(voucher) = voucher {
        let evaluation = evaluate_voucher(Some(voucher), &subtotal);
        if evaluation.valid {
            discount = evaluation.discount_amount.clone();
            applied = Some(AppliedVoucher {
                id: voucher.id,
                code: voucher.code.clone(),
                description: voucher.description.clone(),
                discount_amount: evaluation.discount_amount,
            });
        }
    }
    let zero = BigDecimal::from(0);
    let total = (&subtotal - &discount).max(zero.clone());

    Ok(OrderPreview {
        items: lines,
        subtotal,
        discount,
        shipping_fee: zero,
        total,
        voucher: applied,
        address_id,
    })
}

fn requested_voucher_code(code: Option<&str>) -> Option<&str> {
    code.map(str::trim).filter(|c| !c.is_empty())
}

async fn load_preview(
    connection: &mut sqlx::PgConnection,
    items: &[CheckoutItem],
    voucher_code: Option<&str>,
    address_id: Option<Uuid>,
) -> Result<OrderPreview, CheckoutError> {
    validate_items(items)?;
    let variant_ids: Vec<Uuid> = items.iter().map(|i| i.variant_id).collect();
    let variants = fetch_variants_by_ids(&mut *connection, &variant_ids).await?;
    let voucher = match requested_voucher_code(voucher_code) {
        Some(code) => fetch_voucher_by_code(&mut *connection, code).await?,
        None => None,
    };
    build_preview(items, &variants, voucher.as_ref(), address_id)
}

/// Read only pricing of a prospective order.
#[tracing::instrument(name = "Preview order", skip(pool, items))]
pub async fn preview_order(
    pool: &PgPool,
    user_id: Uuid,
    items: &[CheckoutItem],
    voucher_code: Option<&str>,
    address_id: Option<Uuid>,
) -> Result<OrderPreview, CheckoutError> {
    let mut connection = pool
        .acquire()
        .await
        .context("Failed to acquire a Postgres connection from the pool")?;
    if let Some(address_id) = address_id {
        fetch_user_address(&mut *connection, user_id, address_id)
            .await?
            .ok_or(CheckoutError::AddressNotFound)?;
    }
    load_preview(&mut connection, items, voucher_code, address_id).await
}

#[tracing::instrument(name = "Check payment code usage", skip(transaction))]
async fn payment_code_taken(
    transaction: &mut Transaction<'_, Postgres>,
    payment_code: &str,
) -> Result<bool, anyhow::Error> {
    let (taken,): (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM commerce_order WHERE payment_code = $1)")
            .bind(payment_code)
            .fetch_one(&mut **transaction)
            .await
            .map_err(|e| {
                tracing::error!("Failed to execute query: {:?}", e);
                anyhow::Error::new(e).context("A database failure occurred while checking payment code")
            })?;
    Ok(taken)
}

/// Fresh order id whose payment code is not yet in use.
async fn allocate_order_identity(
    transaction: &mut Transaction<'_, Postgres>,
) -> Result<(Uuid, String), CheckoutError> {
    for _ in 0..PAYMENT_CODE_ATTEMPTS {
        let order_id = Uuid::new_v4();
        let payment_code = generate_payment_code(&order_id);
        if !payment_code_taken(transaction, &payment_code).await? {
            return Ok((order_id, payment_code));
        }
        tracing::warn!("Payment code {} collided, regenerating", payment_code);
    }
    Err(CheckoutError::PaymentCodeExhausted)
}

async fn insert_order(
    transaction: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    user_id: Uuid,
    payment_code: &str,
    request: &CreateOrderRequest,
    preview: &OrderPreview,
    created_on: DateTime<Utc>,
) -> Result<OrderModel, anyhow::Error> {
    let query = format!(
        "INSERT INTO commerce_order (id, user_id, address_id, voucher_id, payment_code, status, \
         payment_method, total_amount, discount_amount, final_amount, note, created_on) \
         VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7, $8, $9, $10, $11) RETURNING {}",
        ORDER_COLUMNS
    );
    sqlx::query_as::<_, OrderModel>(&query)
        .bind(order_id)
        .bind(user_id)
        .bind(request.address_id)
        .bind(preview.voucher.as_ref().map(|v| v.id))
        .bind(payment_code)
        .bind(request.payment_method)
        .bind(&preview.subtotal)
        .bind(&preview.discount)
        .bind(&preview.total)
        .bind(request.note.as_deref().map(str::trim).filter(|n| !n.is_empty()))
        .bind(created_on)
        .fetch_one(&mut **transaction)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            anyhow::Error::new(e).context("A database failure occurred while saving order")
        })
}

async fn insert_order_line(
    transaction: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    line: &PreviewLineItem,
    created_on: DateTime<Utc>,
) -> Result<(), anyhow::Error> {
    sqlx::query(
        "INSERT INTO order_line (id, order_id, product_type_id, quantity, unit_price, created_on) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(Uuid::new_v4())
    .bind(order_id)
    .bind(line.variant_id)
    .bind(line.quantity)
    .bind(&line.unit_price)
    .bind(created_on)
    .execute(&mut **transaction)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while saving order line")
    })?;
    Ok(())
}

#[tracing::instrument(name = "Open payment", skip(transaction))]
pub async fn insert_payment(
    transaction: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    method: PaymentMethod,
    amount: &BigDecimal,
) -> Result<PaymentModel, anyhow::Error> {
    let query = format!(
        "INSERT INTO payment (id, order_id, method, status, amount, created_on) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
        PAYMENT_COLUMNS
    );
    sqlx::query_as::<_, PaymentModel>(&query)
        .bind(Uuid::new_v4())
        .bind(order_id)
        .bind(method)
        .bind(method.initial_payment_status())
        .bind(amount)
        .bind(Utc::now())
        .fetch_one(&mut **transaction)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            anyhow::Error::new(e).context("A database failure occurred while saving payment")
        })
}

/// Persists a new order in one transaction: address ownership, server side
/// pricing, voucher use, conditional stock reservation, the opening payment,
/// cart cleanup and the admin notification either all commit or none do.
#[tracing::instrument(name = "Create order", skip(pool, request))]
pub async fn create_order(
    pool: &PgPool,
    user_id: Uuid,
    request: &CreateOrderRequest,
) -> Result<(OrderModel, OrderPreview), CheckoutError> {
    validate_items(&request.items)?;
    let mut transaction = pool
        .begin()
        .await
        .context("Failed to acquire a Postgres connection from the pool")?;

    fetch_user_address(&mut *transaction, user_id, request.address_id)
        .await?
        .ok_or(CheckoutError::AddressNotFound)?;
    let preview = load_preview(
        &mut transaction,
        &request.items,
        request.voucher_code.as_deref(),
        Some(request.address_id),
    )
    .await?;

    if let Some(voucher) = &preview.voucher {
        if !consume_voucher(&mut transaction, voucher.id).await? {
            return Err(CheckoutError::VoucherExhausted(voucher.code.clone()));
        }
    }

    let (order_id, payment_code) = allocate_order_identity(&mut transaction).await?;
    let created_on = Utc::now();
    let order = insert_order(
        &mut transaction,
        order_id,
        user_id,
        &payment_code,
        request,
        &preview,
        created_on,
    )
    .await?;

    for line in &preview.items {
        insert_order_line(&mut transaction, order_id, line, created_on).await?;
        if !reserve_stock(&mut transaction, line.variant_id, line.quantity).await? {
            let variant = fetch_variant(&mut *transaction, line.variant_id)
                .await?
                .ok_or(CheckoutError::VariantNotFound(line.variant_id))?;
            return Err(CheckoutError::InsufficientStock {
                variant: Box::new(variant),
                requested: line.quantity,
            });
        }
    }

    insert_payment(
        &mut transaction,
        order_id,
        request.payment_method,
        &order.final_amount,
    )
    .await?;

    let cart_line_ids: Vec<Uuid> = request.items.iter().filter_map(|i| i.cart_line_id).collect();
    delete_cart_lines(&mut transaction, user_id, &cart_line_ids).await?;

    notify_admins(
        &mut transaction,
        &NewNotification {
            title: "New order".to_string(),
            content: format!(
                "Order {} was placed with {} for {}",
                payment_code,
                order.payment_method,
                order.final_amount.with_scale_round(0, RoundingMode::HalfUp)
            ),
            notification_type: NotificationType::Order,
            sender_id: Some(user_id),
            order_id: Some(order_id),
        },
    )
    .await?;

    transaction
        .commit()
        .await
        .context("Failed to commit SQL transaction to store a new order")?;
    tracing::info!(order_id = %order.id, "Order created");
    Ok((order, preview))
}

#[tracing::instrument(name = "Fetch order", skip(executor))]
pub async fn fetch_order<'a, E>(executor: E, order_id: Uuid) -> Result<Option<OrderModel>, anyhow::Error>
where
    E: PgExecutor<'a>,
{
    let query = format!(
        "SELECT {} FROM commerce_order WHERE id = $1 AND deleted_on IS NULL",
        ORDER_COLUMNS
    );
    sqlx::query_as::<_, OrderModel>(&query)
        .bind(order_id)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            anyhow::Error::new(e).context("A database failure occurred while fetching order")
        })
}

#[tracing::instrument(name = "Fetch order of user", skip(executor))]
pub async fn fetch_user_order<'a, E>(
    executor: E,
    user_id: Uuid,
    order_id: Uuid,
) -> Result<Option<OrderModel>, anyhow::Error>
where
    E: PgExecutor<'a>,
{
    let query = format!(
        "SELECT {} FROM commerce_order WHERE id = $1 AND user_id = $2 AND deleted_on IS NULL",
        ORDER_COLUMNS
    );
    sqlx::query_as::<_, OrderModel>(&query)
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            anyhow::Error::new(e).context("A database failure occurred while fetching order")
        })
}

async fn fetch_order_by_payment_code(
    pool: &PgPool,
    payment_code: &str,
) -> Result<Option<OrderModel>, anyhow::Error> {
    let query = format!(
        "SELECT {} FROM commerce_order WHERE payment_code = $1 AND deleted_on IS NULL",
        ORDER_COLUMNS
    );
    sqlx::query_as::<_, OrderModel>(&query)
        .bind(payment_code.to_uppercase())
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            anyhow::Error::new(e).context("A database failure occurred while fetching order")
        })
}

/// Most recent payment of the order.
#[tracing::instrument(name = "Fetch latest payment", skip(executor))]
pub async fn fetch_latest_payment<'a, E>(
    executor: E,
    order_id: Uuid,
) -> Result<Option<PaymentModel>, anyhow::Error>
where
    E: PgExecutor<'a>,
{
    let query = format!(
        "SELECT {} FROM payment WHERE order_id = $1 ORDER BY created_on DESC, id LIMIT 1",
        PAYMENT_COLUMNS
    );
    sqlx::query_as::<_, PaymentModel>(&query)
        .bind(order_id)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            anyhow::Error::new(e).context("A database failure occurred while fetching payment")
        })
}

/// Which pending orders a cancellation may touch.
#[derive(Debug, Clone, Copy)]
pub enum CancelGuard {
    AnyPending,
    PendingWithMethod(PaymentMethod),
    /// Pending bank transfer orders created before the cutoff.
    ExpiredSepay(DateTime<Utc>),
}

/// Compare-and-set `pending -> cancelled`, closing open payments and putting
/// the reserved units back. Returns false when the order was no longer
/// pending, in which case nothing changed.
#[tracing::instrument(name = "Cancel pending order", skip(transaction))]
pub async fn cancel_pending_order(
    transaction: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    guard: CancelGuard,
) -> Result<bool, anyhow::Error> {
    let (method, cutoff) = match guard {
        CancelGuard::AnyPending => (None, None),
        CancelGuard::PendingWithMethod(method) => (Some(method), None),
        CancelGuard::ExpiredSepay(cutoff) => (Some(PaymentMethod::Sepay), Some(cutoff)),
    };
    let now = Utc::now();
    let result = sqlx::query(
        "UPDATE commerce_order SET status = 'cancelled', updated_on = $1 \
         WHERE id = $2 AND status = 'pending' \
         AND ($3::payment_method IS NULL OR payment_method = $3) \
         AND ($4::TIMESTAMPTZ IS NULL OR created_on < $4)",
    )
    .bind(now)
    .bind(order_id)
    .bind(method)
    .bind(cutoff)
    .execute(&mut **transaction)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while cancelling order")
    })?;
    if result.rows_affected() == 0 {
        return Ok(false);
    }

    sqlx::query(
        "UPDATE payment SET status = 'cancelled', updated_on = $1 \
         WHERE order_id = $2 AND status IN ('pending', 'cod_pending')",
    )
    .bind(now)
    .bind(order_id)
    .execute(&mut **transaction)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while cancelling payment")
    })?;

    let lines: Vec<(Uuid, i32)> =
        sqlx::query_as("SELECT product_type_id, quantity FROM order_line WHERE order_id = $1")
            .bind(order_id)
            .fetch_all(&mut **transaction)
            .await
            .map_err(|e| {
                tracing::error!("Failed to execute query: {:?}", e);
                anyhow::Error::new(e).context("A database failure occurred while fetching order lines")
            })?;
    for (variant_id, quantity) in lines {
        restore_stock(transaction, variant_id, quantity).await?;
    }
    Ok(true)
}

pub async fn cancel_order_and_restore_stock(
    pool: &PgPool,
    order_id: Uuid,
    guard: CancelGuard,
) -> Result<bool, anyhow::Error> {
    let mut transaction = pool
        .begin()
        .await
        .context("Failed to acquire a Postgres connection from the pool")?;
    let cancelled = cancel_pending_order(&mut transaction, order_id, guard).await?;
    transaction
        .commit()
        .await
        .context("Failed to commit SQL transaction to cancel order")?;
    Ok(cancelled)
}

/// Cancels every pending bank transfer order older than the payment window.
/// Each order is handled in its own transaction.
#[tracing::instrument(name = "Expire pending payments", skip(pool))]
pub async fn expire_pending_payments(
    pool: &PgPool,
    timeout_minutes: i64,
) -> Result<Vec<Uuid>, anyhow::Error> {
    let cutoff = Utc::now() - Duration::minutes(timeout_minutes);
    let candidates: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM commerce_order WHERE status = 'pending' AND payment_method = 'SEPAY' \
         AND created_on < $1 AND deleted_on IS NULL ORDER BY created_on",
    )
    .bind(cutoff)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while fetching expired orders")
    })?;

    let mut expired = Vec::with_capacity(candidates.len());
    for (order_id,) in candidates {
        match cancel_order_and_restore_stock(pool, order_id, CancelGuard::ExpiredSepay(cutoff)).await {
            Ok(true) => expired.push(order_id),
            Ok(false) => {}
            Err(e) => tracing::error!(order_id = %order_id, "Failed to expire order: {:?}", e),
        }
    }
    if !expired.is_empty() {
        tracing::info!("Cancelled {} expired bank transfer orders", expired.len());
    }
    Ok(expired)
}

/// Cancels the order through the expiry path when its payment window has
/// passed and returns the current row.
#[tracing::instrument(name = "Self heal expired order", skip(pool, order), fields(order_id = %order.id))]
pub async fn heal_expired_order(
    pool: &PgPool,
    order: OrderModel,
    timeout_minutes: i64,
) -> Result<OrderModel, anyhow::Error> {
    let now = Utc::now();
    if !order.is_payment_expired(timeout_minutes, now) {
        return Ok(order);
    }
    let cutoff = now - Duration::minutes(timeout_minutes);
    cancel_order_and_restore_stock(pool, order.id, CancelGuard::ExpiredSepay(cutoff)).await?;
    fetch_order(pool, order.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Order {} vanished while expiring", order.id))
}

fn outcome_for_settled_order(order: &OrderModel) -> WebhookResponse {
    match order.status {
        OrderStatus::Cancelled => WebhookResponse::for_order(false, "Order is not pending", order.id),
        OrderStatus::Pending => WebhookResponse::for_order(false, "Order is not pending", order.id),
        _ => WebhookResponse::for_order(true, "Payment already confirmed", order.id),
    }
}

/// Applies a SePay transfer notification. Business outcomes are reported in
/// the response, only infrastructure failures are errors.
#[tracing::instrument(name = "Reconcile bank transfer", skip(pool, payload), fields(order_id = tracing::field::Empty))]
pub async fn reconcile_bank_transfer(
    pool: &PgPool,
    payload: &SePayWebhookRequest,
    amount_tolerance: i64,
) -> Result<WebhookResponse, anyhow::Error> {
    if payload.is_outgoing() {
        return Ok(WebhookResponse::rejected("Outgoing transfer ignored"));
    }
    let codes = extract_payment_codes(&payload.content);
    if codes.is_empty() {
        return Ok(WebhookResponse::rejected("Invalid content format"));
    }
    let mut order = None;
    for code in &codes {
        if let Some(found) = fetch_order_by_payment_code(pool, code).await? {
            order = Some(found);
            break;
        }
    }
    let Some(order) = order else {
        return Ok(WebhookResponse::rejected("Order not found"));
    };
    tracing::Span::current().record("order_id", tracing::field::display(order.id));

    if order.payment_method != PaymentMethod::Sepay {
        return Ok(WebhookResponse::for_order(
            false,
            "Order is not paid by bank transfer",
            order.id,
        ));
    }
    if order.status != OrderStatus::Pending {
        return Ok(outcome_for_settled_order(&order));
    }
    if !amount_matches(&payload.transfer_amount, &order.final_amount, amount_tolerance) {
        tracing::warn!(
            "Transfer amount {} does not match order amount {}",
            payload.transfer_amount,
            order.final_amount
        );
        return Ok(WebhookResponse::for_order(false, "Amount mismatch", order.id));
    }

    let mut transaction = pool
        .begin()
        .await
        .context("Failed to acquire a Postgres connection from the pool")?;
    let now = Utc::now();
    let confirmed = sqlx::query(
        "UPDATE commerce_order SET status = 'confirmed', updated_on = $1 \
         WHERE id = $2 AND status = 'pending' AND payment_method = 'SEPAY'",
    )
    .bind(now)
    .bind(order.id)
    .execute(&mut *transaction)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while confirming order")
    })?;
    if confirmed.rows_affected() == 0 {
        transaction.rollback().await.context("Failed to roll back transaction")?;
        let current = fetch_order(pool, order.id).await?.unwrap_or(order);
        return Ok(outcome_for_settled_order(&current));
    }

    sqlx::query(
        "UPDATE payment SET status = 'success', transaction_id = $1, updated_on = $2 \
         WHERE id = (SELECT id FROM payment WHERE order_id = $3 AND status = 'pending' \
         ORDER BY created_on DESC LIMIT 1)",
    )
    .bind(payload.transaction_id())
    .bind(now)
    .bind(order.id)
    .execute(&mut *transaction)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while settling payment")
    })?;

    create_notification(
        &mut transaction,
        &NewNotification {
            title: "Payment received".to_string(),
            content: format!(
                "We received your transfer for order {}. The order is confirmed.",
                order.payment_code
            ),
            notification_type: NotificationType::Payment,
            sender_id: None,
            order_id: Some(order.id),
        },
        &[order.user_id],
    )
    .await?;
    transaction
        .commit()
        .await
        .context("Failed to commit SQL transaction to confirm payment")?;
    tracing::info!("Bank transfer confirmed");
    Ok(WebhookResponse::for_order(true, "Payment confirmed", order.id))
}

/// Owner's order, self-healed when its payment window has passed.
pub async fn fetch_current_user_order(
    pool: &PgPool,
    user_id: Uuid,
    order_id: Uuid,
    timeout_minutes: i64,
) -> Result<OrderModel, CheckoutError> {
    let order = fetch_user_order(pool, user_id, order_id)
        .await?
        .ok_or(CheckoutError::OrderNotFound)?;
    Ok(heal_expired_order(pool, order, timeout_minutes).await?)
}

/// Swaps the payment method of a pending order. The open payment is marked
/// failed and a new one opened for the new method.
#[tracing::instrument(name = "Change payment method", skip(pool))]
pub async fn change_payment_method(
    pool: &PgPool,
    user_id: Uuid,
    order_id: Uuid,
    new_method: PaymentMethod,
    timeout_minutes: i64,
) -> Result<(OrderModel, PaymentModel), CheckoutError> {
    let order = fetch_user_order(pool, user_id, order_id)
        .await?
        .ok_or(CheckoutError::OrderNotFound)?;
    if order.is_payment_expired(timeout_minutes, Utc::now()) {
        heal_expired_order(pool, order, timeout_minutes).await?;
        return Err(CheckoutError::PaymentExpired);
    }
    if order.status != OrderStatus::Pending {
        return Err(CheckoutError::InvalidState(order.status));
    }
    if order.payment_method == new_method {
        return Err(CheckoutError::InvalidRequest(format!(
            "Order is already paid with {}",
            new_method
        )));
    }
    if new_method == PaymentMethod::Sepay
        && Utc::now() > payment_deadline(order.created_on, timeout_minutes)
    {
        return Err(CheckoutError::InvalidRequest(
            "The bank transfer window for this order has passed".to_string(),
        ));
    }

    let mut transaction = pool
        .begin()
        .await
        .context("Failed to acquire a Postgres connection from the pool")?;
    let now = Utc::now();
    let switched = sqlx::query(
        "UPDATE commerce_order SET payment_method = $1, updated_on = $2 \
         WHERE id = $3 AND status = 'pending' AND payment_method = $4",
    )
    .bind(new_method)
    .bind(now)
    .bind(order.id)
    .bind(order.payment_method)
    .execute(&mut *transaction)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while changing payment method")
    })?;
    if switched.rows_affected() == 0 {
        let current = fetch_order(&mut *transaction, order.id)
            .await?
            .map(|o| o.status)
            .unwrap_or(order.status);
        return Err(CheckoutError::InvalidState(current));
    }

    sqlx::query(
        "UPDATE payment SET status = 'failed', updated_on = $1 \
         WHERE order_id = $2 AND status IN ('pending', 'cod_pending')",
    )
    .bind(now)
    .bind(order.id)
    .execute(&mut *transaction)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while closing payment")
    })?;
    let payment = insert_payment(&mut transaction, order.id, new_method, &order.final_amount).await?;
    transaction
        .commit()
        .await
        .context("Failed to commit SQL transaction to change payment method")?;

    Ok((
        OrderModel {
            payment_method: new_method,
            updated_on: Some(now),
            ..order
        },
        payment,
    ))
}

/// Customer cancellation, allowed for pending COD orders only.
#[tracing::instrument(name = "Cancel customer order", skip(pool))]
pub async fn cancel_customer_order(
    pool: &PgPool,
    user_id: Uuid,
    order_id: Uuid,
) -> Result<(), CheckoutError> {
    let order = fetch_user_order(pool, user_id, order_id)
        .await?
        .ok_or(CheckoutError::OrderNotFound)?;
    check_transition(
        order.status,
        order.payment_method,
        OrderStatus::Cancelled,
        TransitionActor::Customer,
    )?;
    let cancelled = cancel_order_and_restore_stock(
        pool,
        order.id,
        CancelGuard::PendingWithMethod(PaymentMethod::Cod),
    )
    .await?;
    if !cancelled {
        let current = fetch_order(pool, order.id)
            .await?
            .map(|o| o.status)
            .unwrap_or(order.status);
        return Err(CheckoutError::InvalidState(current));
    }
    Ok(())
}

pub fn payment_status_of(payment: Option<&PaymentModel>) -> (Option<PaymentStatus>, Option<String>) {
    match payment {
        Some(payment) => (Some(payment.status), payment.transaction_id.clone()),
        None => (None, None),
    }
}
