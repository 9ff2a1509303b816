use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::schemas::{Product, ProductSummary, ProductVariant};

#[derive(Debug, FromRow)]
pub struct ProductModel {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub created_on: DateTime<Utc>,
}

impl ProductModel {
    pub fn into_schema(self) -> Product {
        Product {
            id: self.id,
            name: self.name,
            description: self.description,
            brand: self.brand,
            created_on: self.created_on,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct ProductVariantModel {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub brand: Option<String>,
    pub variant_name: String,
    pub image_path: Option<String>,
    pub price: BigDecimal,
    pub discount_price: Option<BigDecimal>,
    pub stock: i32,
    pub sold: i32,
}

impl ProductVariantModel {
    pub fn into_schema(self) -> ProductVariant {
        ProductVariant {
            id: self.id,
            product_id: self.product_id,
            product_name: self.product_name,
            brand: self.brand,
            variant_name: self.variant_name,
            image_path: self.image_path,
            price: self.price,
            discount_price: self.discount_price,
            stock: self.stock,
            sold: self.sold,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct ProductSummaryModel {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<BigDecimal>,
    pub total_stock: i64,
    pub total_sold: i64,
    pub variant_count: i64,
    pub created_on: DateTime<Utc>,
}

impl ProductSummaryModel {
    pub fn into_schema(self) -> ProductSummary {
        ProductSummary {
            id: self.id,
            name: self.name,
            description: self.description,
            brand: self.brand,
            min_price: self.min_price,
            total_stock: self.total_stock,
            total_sold: self.total_sold,
            variant_count: self.variant_count,
            created_on: self.created_on,
        }
    }
}
