use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::schemas::{OrderStatus, PaymentMethod, PaymentStatus};
use super::utils::{is_payment_expired, remaining_seconds};

#[derive(Debug, Clone, FromRow)]
pub struct OrderModel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub address_id: Option<Uuid>,
    pub voucher_id: Option<Uuid>,
    pub payment_code: String,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub total_amount: BigDecimal,
    pub discount_amount: BigDecimal,
    pub final_amount: BigDecimal,
    pub note: Option<String>,
    pub created_on: DateTime<Utc>,
    pub updated_on: Option<DateTime<Utc>>,
}

impl OrderModel {
    pub fn is_payment_expired(&self, timeout_minutes: i64, now: DateTime<Utc>) -> bool {
        is_payment_expired(
            self.status,
            self.payment_method,
            self.created_on,
            timeout_minutes,
            now,
        )
    }

    pub fn remaining_seconds(&self, timeout_minutes: i64, now: DateTime<Utc>) -> i64 {
        remaining_seconds(
            self.status,
            self.payment_method,
            self.created_on,
            timeout_minutes,
            now,
        )
    }

    pub fn payment_expire_at(&self, timeout_minutes: i64) -> DateTime<Utc> {
        self.created_on + Duration::minutes(timeout_minutes)
    }
}

#[derive(Debug, FromRow)]
pub struct OrderLineModel {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_type_id: Uuid,
    pub product_name: String,
    pub variant_name: String,
    pub image_path: Option<String>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone, FromRow)]
pub struct PaymentModel {
    pub id: Uuid,
    pub order_id: Uuid,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub amount: BigDecimal,
    pub created_on: DateTime<Utc>,
    pub updated_on: Option<DateTime<Utc>>,
}
