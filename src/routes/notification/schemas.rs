use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, ToSchema)]
#[sqlx(type_name = "notification_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Order,
    Payment,
    System,
}

/// A message to fan out to one or more recipients.
#[derive(Debug)]
pub struct NewNotification {
    pub title: String,
    pub content: String,
    pub notification_type: NotificationType,
    pub sender_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserNotification {
    pub id: Uuid,
    pub notification_id: Uuid,
    pub title: String,
    pub content: String,
    pub notification_type: NotificationType,
    pub sender_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub is_read: bool,
    pub read_on: Option<DateTime<Utc>>,
    pub created_on: DateTime<Utc>,
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct NotificationListQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCount {
    pub unread: i64,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadAllResult {
    pub updated: u64,
}
