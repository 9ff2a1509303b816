use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, FromRow)]
pub struct CartItemModel {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_type_id: Uuid,
    pub quantity: i32,
}
