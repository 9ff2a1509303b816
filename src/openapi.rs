use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::administrative::AdministrativeUnit;
use crate::routes::address::schemas::{Address, CreateAddressRequest};
use crate::routes::cart::schemas::{AddCartItemRequest, CartLine, CartView, UpdateCartItemRequest};
use crate::routes::checkout::schemas::{
    AppliedVoucher, ChangePaymentMethodResponse, CheckoutItem, CreateOrderRequest,
    CreateOrderResponse, OrderPreview, OrderStatus, PaymentInfoResponse, PaymentMethod,
    PaymentStatus, PaymentStatusResponse, PreviewLineItem, PreviewOrderRequest,
    SePayWebhookRequest, WebhookResponse,
};
use crate::routes::notification::schemas::{
    NotificationType, ReadAllResult, UnreadCount, UserNotification,
};
use crate::routes::order::schemas::{
    OrderDetail, OrderLineView, OrderSummary, PaymentView, UpdateOrderStatusRequest,
};
use crate::routes::product::schemas::{
    CreateProductRequest, CreateVariantRequest, Product, ProductDetail, ProductSortField,
    ProductSummary, ProductVariant, UpdateVariantRequest,
};
use crate::routes::user::schemas::{
    AuthData, AuthenticateRequest, CreateUserAccount, RefreshTokenRequest,
    SendVerificationCodeRequest, UserAccount, UserRole, VerifyEmailRequest,
};
use crate::routes::voucher::schemas::{
    CreateVoucherRequest, UpdateVoucherRequest, ValidateVoucherRequest, Voucher,
    VoucherEvaluation, VoucherSortField,
};
use crate::routes::wishlist::schemas::{AddWishlistItemRequest, WishlistItem};
use crate::schemas::SortOrder;
use crate::sepay_client::SePayPaymentInfo;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Cosmetic Storefront API", description = "Storefront, checkout and SePay reconciliation endpoints"),
    modifiers(&BearerAuth),
    paths(
        crate::routes::util::handlers::health_check,
        crate::routes::util::handlers::readiness,
        crate::routes::user::handlers::register_user_account,
        crate::routes::user::handlers::authenticate,
        crate::routes::user::handlers::refresh_token,
        crate::routes::user::handlers::current_user,
        crate::routes::user::handlers::send_email_code,
        crate::routes::user::handlers::verify_email_code,
        crate::routes::product::handlers::list_product_req,
        crate::routes::product::handlers::best_selling_req,
        crate::routes::product::handlers::get_product_req,
        crate::routes::product::handlers::get_variant,
        crate::routes::product::handlers::list_variants,
        crate::routes::product::handlers::create_product_req,
        crate::routes::product::handlers::create_variant_req,
        crate::routes::product::handlers::update_variant_req,
        crate::routes::cart::handlers::get_cart,
        crate::routes::cart::handlers::add_cart_item_req,
        crate::routes::cart::handlers::update_cart_item_req,
        crate::routes::cart::handlers::delete_cart_item_req,
        crate::routes::wishlist::handlers::get_wishlist,
        crate::routes::wishlist::handlers::add_wishlist_item_req,
        crate::routes::wishlist::handlers::delete_wishlist_item_req,
        crate::routes::address::handlers::create_address_req,
        crate::routes::address::handlers::list_addresses,
        crate::routes::address::handlers::set_default,
        crate::routes::address::handlers::delete_address_req,
        crate::routes::administrative::handlers::list_provinces,
        crate::routes::administrative::handlers::list_districts,
        crate::routes::administrative::handlers::list_wards,
        crate::routes::voucher::handlers::list_voucher_req,
        crate::routes::voucher::handlers::create_voucher_req,
        crate::routes::voucher::handlers::update_voucher_req,
        crate::routes::voucher::handlers::delete_voucher_req,
        crate::routes::checkout::handlers::preview_order_req,
        crate::routes::checkout::handlers::validate_voucher_req,
        crate::routes::checkout::handlers::create_order_req,
        crate::routes::checkout::handlers::payment_status_req,
        crate::routes::checkout::handlers::payment_info_req,
        crate::routes::checkout::handlers::change_payment_method_req,
        crate::routes::checkout::handlers::cancel_order_req,
        crate::routes::checkout::handlers::sepay_webhook_req,
        crate::routes::order::handlers::list_order_req,
        crate::routes::order::handlers::get_order_req,
        crate::routes::order::handlers::admin_list_order_req,
        crate::routes::order::handlers::admin_get_order_req,
        crate::routes::order::handlers::admin_update_status_req,
        crate::routes::notification::handlers::list_notification_req,
        crate::routes::notification::handlers::unread_count_req,
        crate::routes::notification::handlers::mark_read_req,
        crate::routes::notification::handlers::mark_all_read_req,
    ),
    components(schemas(
        SortOrder,
        AdministrativeUnit,
        UserRole, UserAccount, CreateUserAccount, AuthenticateRequest, RefreshTokenRequest,
        SendVerificationCodeRequest, VerifyEmailRequest, AuthData,
        Product, ProductVariant, CreateProductRequest, CreateVariantRequest, UpdateVariantRequest,
        ProductSummary, ProductDetail, ProductSortField,
        AddCartItemRequest, UpdateCartItemRequest, CartLine, CartView,
        AddWishlistItemRequest, WishlistItem,
        Address, CreateAddressRequest,
        Voucher, VoucherEvaluation, ValidateVoucherRequest, CreateVoucherRequest,
        UpdateVoucherRequest, VoucherSortField,
        OrderStatus, PaymentMethod, PaymentStatus, CheckoutItem, PreviewOrderRequest,
        PreviewLineItem, AppliedVoucher, OrderPreview, CreateOrderRequest, CreateOrderResponse,
        SePayWebhookRequest, WebhookResponse, PaymentStatusResponse, PaymentInfoResponse,
        ChangePaymentMethodResponse, SePayPaymentInfo,
        OrderSummary, OrderLineView, PaymentView, OrderDetail, UpdateOrderStatusRequest,
        NotificationType, UserNotification, UnreadCount, ReadAllResult,
    )),
    tags(
        (name = "Util", description = "Liveness and readiness"),
        (name = "User", description = "Registration, login and email verification"),
        (name = "Product", description = "Catalog"),
        (name = "Cart", description = "Shopping cart"),
        (name = "Wishlist", description = "Saved variants"),
        (name = "Address", description = "Shipping addresses"),
        (name = "Administrative", description = "Provinces, districts and wards"),
        (name = "Voucher", description = "Voucher administration"),
        (name = "Checkout", description = "Preview, order creation and SePay payments"),
        (name = "Order", description = "Order history and fulfilment"),
        (name = "Notification", description = "In-app notifications"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use utoipa::OpenApi;

    use super::ApiDoc;

    #[test]
    fn test_api_doc_lists_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        for path in [
            "/product",
            "/product/best-selling",
            "/product/{id}",
            "/checkout/create-order",
            "/checkout/sepay-webhook",
            "/order/admin/{id}/status",
            "/notification/read-all",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("ProductDetail"));
        assert!(components.schemas.contains_key("SePayWebhookRequest"));
    }

    #[test]
    fn test_api_doc_serializes() {
        let json = ApiDoc::openapi().to_json().expect("openapi json");
        assert!(json.contains("Cosmetic Storefront API"));
    }
}
