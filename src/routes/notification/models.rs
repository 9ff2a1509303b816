use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::schemas::{NotificationType, UserNotification};

#[derive(Debug, FromRow)]
pub struct UserNotificationModel {
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

impl UserNotificationModel {
    pub fn into_schema(self) -> UserNotification {
        UserNotification {
            id: self.id,
            notification_id: self.notification_id,
            title: self.title,
            content: self.content,
            notification_type: self.notification_type,
            sender_id: self.sender_id,
            order_id: self.order_id,
            is_read: self.is_read,
            read_on: self.read_on,
            created_on: self.created_on,
        }
    }
}
