use uuid::Uuid;

use super::schemas::OrderStatus;
use crate::errors::GenericError;
use crate::routes::product::schemas::ProductVariant;
use crate::routes::product::utils::insufficient_stock;
use crate::schemas::error_context;
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum CheckoutError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Product variant {0} not found")]
    VariantNotFound(Uuid),
    #[error("Insufficient stock for {}", .variant.product_name)]
    InsufficientStock {
        variant: Box<ProductVariant>,
        requested: i32,
    },
    #[error("Invalid shipping address")]
    AddressNotFound,
    #[error("Order not found")]
    OrderNotFound,
    #[error("Voucher {0} has no uses left")]
    VoucherExhausted(String),
    #[error("Invalid state for this action")]
    InvalidState(OrderStatus),
    #[error("Payment window has expired, the order was cancelled")]
    PaymentExpired,
    #[error("Could not allocate a unique payment code")]
    PaymentCodeExhausted,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for CheckoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<CheckoutError> for GenericError {
    fn from(err: CheckoutError) -> GenericError {
        match err {
            CheckoutError::InvalidRequest(message) => GenericError::ValidationError(message),
            CheckoutError::AddressNotFound => GenericError::ValidationError(err.to_string()),
            CheckoutError::VariantNotFound(_) | CheckoutError::OrderNotFound => {
                GenericError::DataNotFound(err.to_string())
            }
            CheckoutError::InsufficientStock { variant, requested } => {
                insufficient_stock(&variant, requested)
            }
            CheckoutError::VoucherExhausted(ref code) => GenericError::ConflictError(
                err.to_string(),
                error_context([("voucherCode", serde_json::json!(code))]),
            ),
            CheckoutError::InvalidState(status) => GenericError::ConflictError(
                err.to_string(),
                error_context([("status", serde_json::json!(status))]),
            ),
            CheckoutError::PaymentExpired => GenericError::conflict(err.to_string()),
            CheckoutError::PaymentCodeExhausted => GenericError::UnexpectedCustomError(err.to_string()),
            CheckoutError::UnexpectedError(error) => GenericError::UnexpectedError(error),
        }
    }
}
