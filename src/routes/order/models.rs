use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::schemas::{OrderLineView, OrderSummary, PaymentView};
use crate::routes::checkout::models::{OrderLineModel, PaymentModel};
use crate::routes::checkout::schemas::{OrderStatus, PaymentMethod};
use crate::routes::checkout::utils::{is_payment_expired, remaining_seconds};

#[derive(Debug, FromRow)]
pub struct OrderSummaryModel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub payment_code: String,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub total_amount: BigDecimal,
    pub discount_amount: BigDecimal,
    pub final_amount: BigDecimal,
    pub item_count: i64,
    pub created_on: DateTime<Utc>,
}

impl OrderSummaryModel {
    pub fn into_schema(self, timeout_minutes: i64, now: DateTime<Utc>) -> OrderSummary {
        OrderSummary {
            is_payment_expired: is_payment_expired(
                self.status,
                self.payment_method,
                self.created_on,
                timeout_minutes,
                now,
            ),
            remaining_seconds: remaining_seconds(
                self.status,
                self.payment_method,
                self.created_on,
                timeout_minutes,
                now,
            ),
            id: self.id,
            user_id: self.user_id,
            payment_code: self.payment_code,
            status: self.status,
            payment_method: self.payment_method,
            total_amount: self.total_amount,
            discount_amount: self.discount_amount,
            final_amount: self.final_amount,
            item_count: self.item_count,
            created_on: self.created_on,
        }
    }
}

impl From<OrderLineModel> for OrderLineView {
    fn from(line: OrderLineModel) -> Self {
        OrderLineView {
            line_total: &line.unit_price * BigDecimal::from(line.quantity),
            id: line.id,
            variant_id: line.product_type_id,
            product_name: line.product_name,
            variant_name: line.variant_name,
            image: line.image_path,
            quantity: line.quantity,
            unit_price: line.unit_price,
        }
    }
}

impl From<PaymentModel> for PaymentView {
    fn from(payment: PaymentModel) -> Self {
        PaymentView {
            id: payment.id,
            method: payment.method,
            status: payment.status,
            transaction_id: payment.transaction_id,
            amount: payment.amount,
            created_on: payment.created_on,
        }
    }
}
