use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::schemas::Voucher;

#[derive(Debug, FromRow)]
pub struct VoucherModel {
    pub id: Uuid,
    pub code: String,
    pub description: Option<String>,
    pub discount: BigDecimal,
    pub min_order_amount: Option<BigDecimal>,
    pub max_discount: Option<BigDecimal>,
    pub quantity: i32,
    pub created_on: DateTime<Utc>,
}

impl VoucherModel {
    pub fn into_schema(self) -> Voucher {
        Voucher {
            id: self.id,
            code: self.code,
            description: self.description,
            discount: self.discount,
            min_order_amount: self.min_order_amount,
            max_discount: self.max_discount,
            quantity: self.quantity,
            created_on: self.created_on,
        }
    }
}
