use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::impl_json_request;
use crate::routes::product::schemas::ProductVariant;

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddWishlistItemRequest {
    pub variant_id: Uuid,
}
impl_json_request!(AddWishlistItemRequest);

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub id: Uuid,
    pub variant: ProductVariant,
    pub created_on: DateTime<Utc>,
}
