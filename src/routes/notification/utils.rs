use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::models::UserNotificationModel;
use super::schemas::{NewNotification, NotificationListQuery, UserNotification};
use crate::errors::GenericError;
use crate::routes::user::utils::fetch_admin_user_ids;
use crate::schemas::{PaginatedList, PaginationQuery};

/// Stores one notification and a delivery row per recipient. Runs inside the
/// caller's transaction so the fan out commits or rolls back with it.
#[tracing::instrument(name = "Create notification", skip(transaction, notification))]
pub async fn create_notification(
    transaction: &mut Transaction<'_, Postgres>,
    notification: &NewNotification,
    recipients: &[Uuid],
) -> Result<Uuid, anyhow::Error> {
    let notification_id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO notification (id, title, content, notification_type, sender_id, order_id, \
         created_on) VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(notification_id)
    .bind(&notification.title)
    .bind(&notification.content)
    .bind(notification.notification_type)
    .bind(notification.sender_id)
    .bind(notification.order_id)
    .bind(now)
    .execute(&mut **transaction)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while saving notification")
    })?;

    if recipients.is_empty() {
        return Ok(notification_id);
    }
    let ids: Vec<Uuid> = recipients.iter().map(|_| Uuid::new_v4()).collect();
    sqlx::query(
        "INSERT INTO user_notification (id, user_id, notification_id, is_read, created_on) \
         SELECT id, user_id, $3, false, $4 FROM UNNEST($1::uuid[], $2::uuid[]) AS t(id, user_id)",
    )
    .bind(&ids)
    .bind(recipients)
    .bind(notification_id)
    .bind(now)
    .execute(&mut **transaction)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while delivering notification")
    })?;
    Ok(notification_id)
}

#[tracing::instrument(name = "Notify admins", skip(transaction, notification))]
pub async fn notify_admins(
    transaction: &mut Transaction<'_, Postgres>,
    notification: &NewNotification,
) -> Result<Uuid, anyhow::Error> {
    let admins = fetch_admin_user_ids(&mut **transaction).await?;
    if admins.is_empty() {
        tracing::warn!("No active admin to notify");
    }
    create_notification(transaction, notification, &admins).await
}

#[tracing::instrument(name = "List notifications", skip(pool))]
pub async fn list_notifications(
    pool: &PgPool,
    user_id: Uuid,
    query: &NotificationListQuery,
) -> Result<PaginatedList<UserNotification>, anyhow::Error> {
    let pagination = PaginationQuery {
        page: query.page,
        limit: query.limit,
    };
    let filter = "un.user_id = $1 AND (NOT $2 OR NOT un.is_read)";
    let (total,): (i64,) = sqlx::query_as(&format!(
        "SELECT COUNT(*) FROM user_notification un WHERE {}",
        filter
    ))
    .bind(user_id)
    .bind(query.unread_only)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while counting notifications")
    })?;

    let rows = sqlx::query_as::<_, UserNotificationModel>(&format!(
        "SELECT un.id, un.notification_id, n.title, n.content, n.notification_type, n.sender_id, \
         n.order_id, un.is_read, un.read_on, un.created_on FROM user_notification un \
         INNER JOIN notification n ON n.id = un.notification_id WHERE {} \
         ORDER BY un.created_on DESC, un.id LIMIT $3 OFFSET $4",
        filter
    ))
    .bind(user_id)
    .bind(query.unread_only)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while listing notifications")
    })?;

    Ok(PaginatedList {
        items: rows.into_iter().map(UserNotificationModel::into_schema).collect(),
        total,
        page: query.page.unwrap_or(1).max(1),
        limit: pagination.limit(),
    })
}

#[tracing::instrument(name = "Count unread notifications", skip(pool))]
pub async fn count_unread(pool: &PgPool, user_id: Uuid) -> Result<i64, anyhow::Error> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM user_notification WHERE user_id = $1 AND NOT is_read",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while counting notifications")
    })?;
    Ok(count)
}

#[tracing::instrument(name = "Mark notification read", skip(pool))]
pub async fn mark_read(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), GenericError> {
    let result = sqlx::query(
        "UPDATE user_notification SET is_read = true, read_on = COALESCE(read_on, $1) \
         WHERE id = $2 AND user_id = $3",
    )
    .bind(Utc::now())
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        GenericError::DatabaseError(
            "A database failure occurred while updating notification".to_string(),
            e.into(),
        )
    })?;
    if result.rows_affected() == 0 {
        return Err(GenericError::DataNotFound(
            "Notification not found".to_string(),
        ));
    }
    Ok(())
}

#[tracing::instrument(name = "Mark all notifications read", skip(pool))]
pub async fn mark_all_read(pool: &PgPool, user_id: Uuid) -> Result<u64, anyhow::Error> {
    let result = sqlx::query(
        "UPDATE user_notification SET is_read = true, read_on = $1 \
         WHERE user_id = $2 AND NOT is_read",
    )
    .bind(Utc::now())
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while updating notifications")
    })?;
    Ok(result.rows_affected())
}
