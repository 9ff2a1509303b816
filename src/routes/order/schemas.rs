use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::impl_json_request;
use crate::routes::address::schemas::Address;
use crate::routes::checkout::schemas::{OrderStatus, PaymentMethod, PaymentStatus};
use crate::schemas::SortOrder;

#[derive(Deserialize, Debug, IntoParams)]
pub struct OrderListQuery {
    #[param(value_type = Option<String>)]
    pub status: Option<OrderStatus>,
    #[param(value_type = Option<String>)]
    pub sort_order: Option<SortOrder>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct AdminOrderListQuery {
    #[param(value_type = Option<String>)]
    pub status: Option<OrderStatus>,
    pub user_id: Option<Uuid>,
    #[param(value_type = Option<String>)]
    pub sort_order: Option<SortOrder>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub payment_code: String,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    #[schema(value_type = String)]
    pub total_amount: BigDecimal,
    #[schema(value_type = String)]
    pub discount_amount: BigDecimal,
    #[schema(value_type = String)]
    pub final_amount: BigDecimal,
    pub item_count: i64,
    pub is_payment_expired: bool,
    pub remaining_seconds: i64,
    pub created_on: DateTime<Utc>,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineView {
    pub id: Uuid,
    pub variant_id: Uuid,
    pub product_name: String,
    pub variant_name: String,
    pub image: Option<String>,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub unit_price: BigDecimal,
    #[schema(value_type = String)]
    pub line_total: BigDecimal,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentView {
    pub id: Uuid,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    #[schema(value_type = String)]
    pub amount: BigDecimal,
    pub created_on: DateTime<Utc>,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    pub id: Uuid,
    pub user_id: Uuid,
    pub payment_code: String,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    #[schema(value_type = String)]
    pub total_amount: BigDecimal,
    #[schema(value_type = String)]
    pub discount_amount: BigDecimal,
    #[schema(value_type = String)]
    pub final_amount: BigDecimal,
    pub note: Option<String>,
    pub address: Option<Address>,
    pub voucher_id: Option<Uuid>,
    pub lines: Vec<OrderLineView>,
    pub payment: Option<PaymentView>,
    pub is_payment_expired: bool,
    pub remaining_seconds: i64,
    pub payment_expire_at: Option<DateTime<Utc>>,
    pub created_on: DateTime<Utc>,
    pub updated_on: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}
impl_json_request!(UpdateOrderStatusRequest);
