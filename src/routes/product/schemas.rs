use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::impl_json_request;
use crate::schemas::SortOrder;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub created_on: DateTime<Utc>,
}

/// A purchasable variant together with its parent product label.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub brand: Option<String>,
    pub variant_name: String,
    pub image_path: Option<String>,
    #[schema(value_type = String)]
    pub price: BigDecimal,
    #[schema(value_type = Option<String>)]
    pub discount_price: Option<BigDecimal>,
    pub stock: i32,
    pub sold: i32,
}

impl ProductVariant {
    /// Discount price wins when set.
    pub fn unit_price(&self) -> BigDecimal {
        self.discount_price
            .clone()
            .unwrap_or_else(|| self.price.clone())
    }
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub brand: Option<String>,
}
impl_json_request!(CreateProductRequest);

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVariantRequest {
    pub product_id: Uuid,
    pub variant_name: String,
    pub image_path: Option<String>,
    #[schema(value_type = String)]
    pub price: BigDecimal,
    #[schema(value_type = Option<String>)]
    pub discount_price: Option<BigDecimal>,
    pub stock: i32,
}
impl_json_request!(CreateVariantRequest);

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVariantRequest {
    pub variant_name: Option<String>,
    pub image_path: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<BigDecimal>,
    #[schema(value_type = Option<String>)]
    pub discount_price: Option<BigDecimal>,
    #[serde(default)]
    pub clear_discount_price: bool,
    pub stock: Option<i32>,
}
impl_json_request!(UpdateVariantRequest);

/// Catalog card: a product with figures rolled up from its live variants.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub brand: Option<String>,
    /// Lowest unit price across variants, discount price included.
    #[schema(value_type = Option<String>)]
    pub min_price: Option<BigDecimal>,
    pub total_stock: i64,
    pub total_sold: i64,
    pub variant_count: i64,
    pub created_on: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<ProductVariant>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortField {
    CreatedOn,
    Name,
    Price,
    Sold,
}

impl ProductSortField {
    pub fn column(&self) -> &'static str {
        match self {
            ProductSortField::CreatedOn => "created_on",
            ProductSortField::Name => "name",
            ProductSortField::Price => "min_price",
            ProductSortField::Sold => "total_sold",
        }
    }
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct ProductListQuery {
    /// Matches name or description.
    pub keyword: Option<String>,
    pub brand: Option<String>,
    #[param(value_type = Option<f64>)]
    pub min_price: Option<BigDecimal>,
    #[param(value_type = Option<f64>)]
    pub max_price: Option<BigDecimal>,
    pub sort_by: Option<ProductSortField>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct BestSellingQuery {
    pub limit: Option<i64>,
}
