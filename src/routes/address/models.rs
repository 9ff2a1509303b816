use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::schemas::Address;

#[derive(Debug, FromRow)]
pub struct AddressModel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub phone_number: String,
    pub province: String,
    pub district: String,
    pub ward: String,
    pub detail: String,
    pub is_default: bool,
    pub created_on: DateTime<Utc>,
}

impl AddressModel {
    pub fn into_schema(self) -> Address {
        Address {
            id: self.id,
            full_name: self.full_name,
            phone_number: self.phone_number,
            province: self.province,
            district: self.district,
            ward: self.ward,
            detail: self.detail,
            is_default: self.is_default,
            created_on: self.created_on,
        }
    }
}
