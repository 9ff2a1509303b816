use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::impl_json_request;
use crate::sepay_client::SePayPaymentInfo;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipping,
    Delivered,
    Completed,
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipping => "shipping",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    #[serde(alias = "cod", alias = "Cod")]
    Cod,
    #[serde(alias = "sepay", alias = "SePay", alias = "Sepay")]
    Sepay,
}

impl PaymentMethod {
    /// Status of the payment row opened for this method.
    pub fn initial_payment_status(&self) -> PaymentStatus {
        match self {
            PaymentMethod::Cod => PaymentStatus::CodPending,
            PaymentMethod::Sepay => PaymentStatus::Pending,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cod => f.write_str("COD"),
            PaymentMethod::Sepay => f.write_str("SEPAY"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    CodPending,
    Success,
    Failed,
    Cancelled,
}

/// Who asks for an order status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionActor {
    /// Payment reconciliation and the expiry sweep.
    System,
    Customer,
    Admin,
}

#[derive(Deserialize, Serialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub cart_line_id: Option<Uuid>,
    pub variant_id: Uuid,
    pub quantity: i32,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreviewOrderRequest {
    pub items: Vec<CheckoutItem>,
    pub voucher_code: Option<String>,
    pub address_id: Option<Uuid>,
}
impl_json_request!(PreviewOrderRequest);

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreviewLineItem {
    pub cart_line_id: Option<Uuid>,
    pub variant_id: Uuid,
    pub product_name: String,
    pub variant_name: String,
    pub image: Option<String>,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub price: BigDecimal,
    #[schema(value_type = Option<String>)]
    pub discount_price: Option<BigDecimal>,
    #[schema(value_type = String)]
    pub unit_price: BigDecimal,
    #[schema(value_type = String)]
    pub line_total: BigDecimal,
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppliedVoucher {
    pub id: Uuid,
    pub code: String,
    pub description: Option<String>,
    #[schema(value_type = String)]
    pub discount_amount: BigDecimal,
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderPreview {
    pub items: Vec<PreviewLineItem>,
    #[schema(value_type = String)]
    pub subtotal: BigDecimal,
    #[schema(value_type = String)]
    pub discount: BigDecimal,
    #[schema(value_type = String)]
    pub shipping_fee: BigDecimal,
    #[schema(value_type = String)]
    pub total: BigDecimal,
    pub voucher: Option<AppliedVoucher>,
    pub address_id: Option<Uuid>,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<CheckoutItem>,
    pub address_id: Uuid,
    pub payment_method: PaymentMethod,
    pub voucher_code: Option<String>,
    pub note: Option<String>,
}
impl_json_request!(CreateOrderRequest);

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    #[schema(value_type = String)]
    pub total_amount: BigDecimal,
    #[schema(value_type = String)]
    pub discount_amount: BigDecimal,
    #[schema(value_type = String)]
    pub final_amount: BigDecimal,
    pub payment_code: String,
    pub payment_url: Option<String>,
    pub payment_content: Option<String>,
    pub created_on: DateTime<Utc>,
}

/// Bank transfer notification pushed by SePay.
#[derive(Deserialize, Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SePayWebhookRequest {
    #[schema(value_type = Option<i64>)]
    pub id: Option<serde_json::Value>,
    pub gateway: Option<String>,
    pub transaction_date: Option<String>,
    pub account_number: Option<String>,
    pub code: Option<String>,
    #[serde(default)]
    pub content: String,
    pub transfer_type: Option<String>,
    #[schema(value_type = f64)]
    #[serde(default)]
    pub transfer_amount: BigDecimal,
    pub reference_code: Option<String>,
    pub description: Option<String>,
}

impl SePayWebhookRequest {
    /// The bank reference when present, otherwise SePay's own id.
    pub fn transaction_id(&self) -> Option<String> {
        self.reference_code
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .or_else(|| match &self.id {
                Some(serde_json::Value::String(id)) if !id.is_empty() => Some(id.clone()),
                Some(serde_json::Value::Number(id)) => Some(id.to_string()),
                _ => None,
            })
    }

    pub fn is_outgoing(&self) -> bool {
        self.transfer_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("out"))
    }
}

#[derive(Serialize, Debug, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Uuid>,
}

impl WebhookResponse {
    pub fn rejected(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            order_id: None,
        }
    }

    pub fn for_order(success: bool, message: &str, order_id: Uuid) -> Self {
        Self {
            success,
            message: message.to_string(),
            order_id: Some(order_id),
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusResponse {
    pub order_id: Uuid,
    pub order_status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: Option<PaymentStatus>,
    pub transaction_id: Option<String>,
    pub is_payment_expired: bool,
    pub remaining_seconds: i64,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfoResponse {
    pub order_id: Uuid,
    #[schema(value_type = String)]
    pub final_amount: BigDecimal,
    pub remaining_seconds: i64,
    #[serde(flatten)]
    pub payment: SePayPaymentInfo,
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct ChangePaymentMethodQuery {
    pub new_method: PaymentMethod,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePaymentMethodResponse {
    pub order_id: Uuid,
    pub payment_method: PaymentMethod,
    pub payment_id: Uuid,
    pub payment_url: Option<String>,
    pub payment_content: Option<String>,
}
