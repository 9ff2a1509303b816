use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::impl_json_request;
use crate::schemas::SortOrder;

#[derive(Serialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
    pub id: Uuid,
    pub code: String,
    pub description: Option<String>,
    /// Percentage, 0 to 100.
    #[schema(value_type = String)]
    pub discount: BigDecimal,
    #[schema(value_type = Option<String>)]
    pub min_order_amount: Option<BigDecimal>,
    #[schema(value_type = Option<String>)]
    pub max_discount: Option<BigDecimal>,
    pub quantity: i32,
    pub created_on: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoucherEvaluation {
    pub valid: bool,
    #[schema(value_type = String)]
    pub discount_amount: BigDecimal,
    pub message: String,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateVoucherRequest {
    pub code: String,
    #[schema(value_type = String)]
    pub subtotal: BigDecimal,
}
impl_json_request!(ValidateVoucherRequest);

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVoucherRequest {
    pub code: String,
    pub description: Option<String>,
    #[schema(value_type = String)]
    pub discount: BigDecimal,
    #[schema(value_type = Option<String>)]
    pub min_order_amount: Option<BigDecimal>,
    #[schema(value_type = Option<String>)]
    pub max_discount: Option<BigDecimal>,
    pub quantity: i32,
}
impl_json_request!(CreateVoucherRequest);

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVoucherRequest {
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub discount: Option<BigDecimal>,
    #[schema(value_type = Option<String>)]
    pub min_order_amount: Option<BigDecimal>,
    #[schema(value_type = Option<String>)]
    pub max_discount: Option<BigDecimal>,
    pub quantity: Option<i32>,
}
impl_json_request!(UpdateVoucherRequest);

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VoucherSortField {
    CreatedOn,
    Discount,
    Code,
}

impl VoucherSortField {
    pub fn column(&self) -> &'static str {
        match self {
            VoucherSortField::CreatedOn => "created_on",
            VoucherSortField::Discount => "discount",
            VoucherSortField::Code => "code",
        }
    }
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct VoucherListQuery {
    /// Matches code or description.
    pub q: Option<String>,
    #[param(value_type = Option<f64>)]
    pub min_discount: Option<BigDecimal>,
    #[param(value_type = Option<f64>)]
    pub max_discount: Option<BigDecimal>,
    pub sort_by: Option<VoucherSortField>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
