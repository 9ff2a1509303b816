use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::impl_json_request;

#[derive(Deserialize, Debug, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAddressRequest {
    #[validate(length(min = 1, max = 120, message = "Full name is required"))]
    pub full_name: String,
    #[validate(length(min = 8, max = 15, message = "Invalid phone number"))]
    pub phone_number: String,
    #[validate(length(min = 1, message = "Province is required"))]
    pub province: String,
    #[validate(length(min = 1, message = "District is required"))]
    pub district: String,
    #[validate(length(min = 1, message = "Ward is required"))]
    pub ward: String,
    #[validate(length(min = 1, max = 255, message = "Address detail is required"))]
    pub detail: String,
    #[serde(default)]
    pub is_default: bool,
}
impl_json_request!(CreateAddressRequest);

#[derive(Serialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Uuid,
    pub full_name: String,
    pub phone_number: String,
    pub province: String,
    pub district: String,
    pub ward: String,
    pub detail: String,
    pub is_default: bool,
    pub created_on: DateTime<Utc>,
}
