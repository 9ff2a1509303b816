use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::schemas::{UserAccount, UserRole};

#[derive(Debug, FromRow)]
pub struct UserAccountModel {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub password_hash: String,
    pub role: UserRole,
    pub is_active: bool,
    pub email_verified: bool,
    pub refresh_token_hash: Option<String>,
    pub created_on: DateTime<Utc>,
}

impl UserAccountModel {
    pub fn into_schema(self) -> UserAccount {
        UserAccount {
            id: self.id,
            email: self.email,
            full_name: self.full_name,
            phone_number: self.phone_number,
            role: self.role,
            is_active: self.is_active,
            email_verified: self.email_verified,
            created_on: self.created_on,
        }
    }
}

#[derive(Debug, FromRow, Clone)]
pub struct EmailVerificationModel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code_hash: String,
    pub expires_on: DateTime<Utc>,
    pub attempts: i32,
    pub resend_count: i32,
    pub last_sent_on: DateTime<Utc>,
    pub verified_on: Option<DateTime<Utc>>,
}
