use anyhow::Context;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::OrderSummaryModel;
use super::schemas::{OrderDetail, OrderLineView, OrderSummary};
use crate::routes::address::utils::fetch_address_for_order;
use crate::routes::checkout::errors::CheckoutError;
use crate::routes::checkout::models::{OrderLineModel, OrderModel};
use crate::routes::checkout::schemas::{OrderStatus, PaymentMethod, TransitionActor};
use crate::routes::checkout::utils::{
    cancel_order_and_restore_stock, cancel_pending_order, check_transition, fetch_latest_payment,
    fetch_order, heal_expired_order, CancelGuard,
};
use crate::routes::notification::schemas::{NewNotification, NotificationType};
use crate::routes::notification::utils::create_notification;
use crate::schemas::{PaginatedList, PaginationQuery, SortOrder};

/// Filters shared by the customer and admin listings.
#[derive(Debug, Default)]
pub struct OrderFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Cancels the caller's pending bank transfer orders whose window has passed
/// so listings never show a stale `pending`.
#[tracing::instrument(name = "Heal expired orders of user", skip(pool))]
async fn heal_expired_user_orders(
    pool: &PgPool,
    user_id: Uuid,
    timeout_minutes: i64,
) -> Result<(), anyhow::Error> {
    let cutoff = Utc::now() - Duration::minutes(timeout_minutes);
    let expired: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM commerce_order WHERE user_id = $1 AND status = 'pending' \
         AND payment_method = 'SEPAY' AND created_on < $2 AND deleted_on IS NULL",
    )
    .bind(user_id)
    .bind(cutoff)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while fetching expired orders")
    })?;
    for (order_id,) in expired {
        cancel_order_and_restore_stock(pool, order_id, CancelGuard::ExpiredSepay(cutoff)).await?;
    }
    Ok(())
}

#[tracing::instrument(name = "List orders", skip(pool))]
pub async fn list_orders(
    pool: &PgPool,
    filter: &OrderFilter,
    timeout_minutes: i64,
) -> Result<PaginatedList<OrderSummary>, anyhow::Error> {
    if let Some(user_id) = filter.user_id {
        heal_expired_user_orders(pool, user_id, timeout_minutes).await?;
    }
    let pagination = PaginationQuery {
        page: filter.page,
        limit: filter.limit,
    };
    let condition = "o.deleted_on IS NULL \
                     AND ($1::UUID IS NULL OR o.user_id = $1) \
                     AND ($2::order_status IS NULL OR o.status = $2)";

    let (total,): (i64,) = sqlx::query_as(&format!(
        "SELECT COUNT(*) FROM commerce_order o WHERE {}",
        condition
    ))
    .bind(filter.user_id)
    .bind(filter.status)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while counting orders")
    })?;

    let rows = sqlx::query_as::<_, OrderSummaryModel>(&format!(
        "SELECT o.id, o.user_id, o.payment_code, o.status, o.payment_method, o.total_amount, \
         o.discount_amount, o.final_amount, o.created_on, \
         (SELECT COALESCE(SUM(ol.quantity), 0)::BIGINT FROM order_line ol WHERE ol.order_id = o.id) \
         AS item_count FROM commerce_order o WHERE {} \
         ORDER BY o.created_on {}, o.id LIMIT $3 OFFSET $4",
        condition,
        filter.sort_order.unwrap_or(SortOrder::Desc).as_sql()
    ))
    .bind(filter.user_id)
    .bind(filter.status)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while listing orders")
    })?;

    let now = Utc::now();
    Ok(PaginatedList {
        items: rows
            .into_iter()
            .map(|row| row.into_schema(timeout_minutes, now))
            .collect(),
        total,
        page: filter.page.unwrap_or(1).max(1),
        limit: pagination.limit(),
    })
}

#[tracing::instrument(name = "Fetch order lines", skip(pool))]
async fn fetch_order_lines(pool: &PgPool, order_id: Uuid) -> Result<Vec<OrderLineModel>, anyhow::Error> {
    sqlx::query_as::<_, OrderLineModel>(
        "SELECT ol.id, ol.order_id, ol.product_type_id, p.name AS product_name, pt.variant_name, \
         pt.image_path, ol.quantity, ol.unit_price FROM order_line ol \
         INNER JOIN product_type pt ON pt.id = ol.product_type_id \
         INNER JOIN product p ON p.id = pt.product_id \
         WHERE ol.order_id = $1 ORDER BY ol.created_on, ol.id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while fetching order lines")
    })
}

/// Full view of an order, self-healing an expired bank transfer first.
/// `viewer` restricts the lookup to the owner's orders.
#[tracing::instrument(name = "Fetch order detail", skip(pool))]
pub async fn fetch_order_detail(
    pool: &PgPool,
    order_id: Uuid,
    viewer: Option<Uuid>,
    timeout_minutes: i64,
) -> Result<OrderDetail, CheckoutError> {
    let order = fetch_order(pool, order_id)
        .await?
        .filter(|o| viewer.is_none_or(|user_id| o.user_id == user_id))
        .ok_or(CheckoutError::OrderNotFound)?;
    let order = heal_expired_order(pool, order, timeout_minutes).await?;

    let lines = fetch_order_lines(pool, order.id).await?;
    let payment = fetch_latest_payment(pool, order.id).await?;
    let address = match order.address_id {
        Some(address_id) => fetch_address_for_order(pool, address_id).await?,
        None => None,
    };
    let now = Utc::now();
    Ok(OrderDetail {
        is_payment_expired: order.is_payment_expired(timeout_minutes, now),
        remaining_seconds: order.remaining_seconds(timeout_minutes, now),
        payment_expire_at: (order.payment_method == PaymentMethod::Sepay)
            .then(|| order.payment_expire_at(timeout_minutes)),
        id: order.id,
        user_id: order.user_id,
        payment_code: order.payment_code,
        status: order.status,
        payment_method: order.payment_method,
        total_amount: order.total_amount,
        discount_amount: order.discount_amount,
        final_amount: order.final_amount,
        note: order.note,
        address,
        voucher_id: order.voucher_id,
        lines: lines.into_iter().map(OrderLineView::from).collect(),
        payment: payment.map(Into::into),
        created_on: order.created_on,
        updated_on: order.updated_on,
    })
}

fn status_notification(order: &OrderModel, status: OrderStatus, admin_id: Uuid) -> NewNotification {
    NewNotification {
        title: "Order update".to_string(),
        content: format!("Order {} is now {}", order.payment_code, status),
        notification_type: NotificationType::Order,
        sender_id: Some(admin_id),
        order_id: Some(order.id),
    }
}

/// Admin driven status change. Forward moves are compare-and-set on the
/// current status; cancelling goes through the stock restoring path.
#[tracing::instrument(name = "Update order status", skip(pool))]
pub async fn update_order_status(
    pool: &PgPool,
    order_id: Uuid,
    target: OrderStatus,
    admin_id: Uuid,
    timeout_minutes: i64,
) -> Result<OrderModel, CheckoutError> {
    let order = fetch_order(pool, order_id)
        .await?
        .ok_or(CheckoutError::OrderNotFound)?;
    let order = heal_expired_order(pool, order, timeout_minutes).await?;
    check_transition(order.status, order.payment_method, target, TransitionActor::Admin)?;

    let mut transaction = pool
        .begin()
        .await
        .context("Failed to acquire a Postgres connection from the pool")?;
    let applied = if target == OrderStatus::Cancelled {
        cancel_pending_order(&mut transaction, order.id, CancelGuard::AnyPending).await?
    } else {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE commerce_order SET status = $1, updated_on = $2 WHERE id = $3 AND status = $4",
        )
        .bind(target)
        .bind(now)
        .bind(order.id)
        .bind(order.status)
        .execute(&mut *transaction)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            anyhow::Error::new(e).context("A database failure occurred while updating order status")
        })?;
        if result.rows_affected() == 1
            && target == OrderStatus::Delivered
            && order.payment_method == PaymentMethod::Cod
        {
            sqlx::query(
                "UPDATE payment SET status = 'success', updated_on = $1 \
                 WHERE order_id = $2 AND status = 'cod_pending'",
            )
            .bind(now)
            .bind(order.id)
            .execute(&mut *transaction)
            .await
            .map_err(|e| {
                tracing::error!("Failed to execute query: {:?}", e);
                anyhow::Error::new(e).context("A database failure occurred while settling COD payment")
            })?;
        }
        result.rows_affected() == 1
    };
    if !applied {
        let current = fetch_order(&mut *transaction, order.id)
            .await?
            .map(|o| o.status)
            .unwrap_or(order.status);
        return Err(CheckoutError::InvalidState(current));
    }

    create_notification(
        &mut transaction,
        &status_notification(&order, target, admin_id),
        &[order.user_id],
    )
    .await?;
    transaction
        .commit()
        .await
        .context("Failed to commit SQL transaction to update order status")?;
    tracing::info!(order_id = %order.id, status = %target, "Order status updated");

    fetch_order(pool, order.id)
        .await?
        .ok_or(CheckoutError::OrderNotFound)
}
