#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use crate::routes::address::utils::delete_address;
    use crate::routes::checkout::errors::CheckoutError;
    use crate::routes::checkout::models::OrderLineModel;
    use crate::routes::checkout::schemas::{
        CheckoutItem, CreateOrderRequest, OrderStatus, PaymentMethod, PaymentStatus,
    };
    use crate::routes::checkout::utils::create_order;
    use crate::routes::order::models::OrderSummaryModel;
    use crate::routes::order::schemas::OrderLineView;
    use crate::routes::order::utils::{
        fetch_order_detail, list_orders, update_order_status, OrderFilter,
    };
    use crate::routes::user::schemas::UserRole;
    use crate::tests::tests::{
        create_test_address, create_test_user, create_test_variant, fetch_stock, get_test_pool,
    };

    fn summary(method: PaymentMethod, minutes_ago: i64) -> OrderSummaryModel {
        OrderSummaryModel {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            payment_code: "1A2B3C4D".to_string(),
            status: OrderStatus::Pending,
            payment_method: method,
            total_amount: BigDecimal::from(200000),
            discount_amount: BigDecimal::from(0),
            final_amount: BigDecimal::from(200000),
            item_count: 2,
            created_on: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn test_summary_projection() {
        let now = Utc::now();
        let fresh = summary(PaymentMethod::Sepay, 5).into_schema(15, now);
        assert!(!fresh.is_payment_expired);
        assert!(fresh.remaining_seconds > 0 && fresh.remaining_seconds <= 600);

        let stale = summary(PaymentMethod::Sepay, 20).into_schema(15, now);
        assert!(stale.is_payment_expired);
        assert_eq!(stale.remaining_seconds, 0);

        let cod = summary(PaymentMethod::Cod, 20).into_schema(15, now);
        assert!(!cod.is_payment_expired);
        assert_eq!(cod.remaining_seconds, 0);
    }

    #[test]
    fn test_line_view_total() {
        let view = OrderLineView::from(OrderLineModel {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            product_type_id: Uuid::new_v4(),
            product_name: "Clay Mask".to_string(),
            variant_name: "100g".to_string(),
            image_path: None,
            quantity: 3,
            unit_price: BigDecimal::from(45000),
        });
        assert_eq!(view.line_total, BigDecimal::from(135000));
    }

    async fn place_order(
        pool: &sqlx::PgPool,
        user_id: Uuid,
        variant_id: Uuid,
        quantity: i32,
        method: PaymentMethod,
    ) -> Uuid {
        let request = CreateOrderRequest {
            items: vec![CheckoutItem {
                cart_line_id: None,
                variant_id,
                quantity,
            }],
            address_id: create_test_address(pool, user_id).await,
            payment_method: method,
            voucher_code: None,
            note: Some("Leave at the front desk".to_string()),
        };
        create_order(pool, user_id, &request).await.unwrap().0.id
    }

    #[tokio::test]
    #[ignore = "requires a running postgres instance"]
    async fn test_admin_drives_cod_order_to_delivery() {
        let pool = get_test_pool().await;
        let admin = create_test_user(&pool, UserRole::Admin).await;
        let user = create_test_user(&pool, UserRole::Customer).await;
        let variant_id = create_test_variant(&pool, 80000, None, 5).await;
        let order_id = place_order(&pool, user, variant_id, 2, PaymentMethod::Cod).await;

        assert!(matches!(
            update_order_status(&pool, order_id, OrderStatus::Shipping, admin, 15).await,
            Err(CheckoutError::InvalidState(OrderStatus::Pending))
        ));
        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipping,
            OrderStatus::Delivered,
        ] {
            let order = update_order_status(&pool, order_id, status, admin, 15)
                .await
                .unwrap();
            assert_eq!(order.status, status);
        }
        let detail = fetch_order_detail(&pool, order_id, Some(user), 15).await.unwrap();
        assert_eq!(detail.payment.unwrap().status, PaymentStatus::Success);
        assert_eq!(detail.lines.len(), 1);
        assert!(detail.address.is_some());

        assert!(matches!(
            update_order_status(&pool, order_id, OrderStatus::Cancelled, admin, 15).await,
            Err(CheckoutError::InvalidState(OrderStatus::Delivered))
        ));
        let stranger = create_test_user(&pool, UserRole::Customer).await;
        assert!(matches!(
            fetch_order_detail(&pool, order_id, Some(stranger), 15).await,
            Err(CheckoutError::OrderNotFound)
        ));
    }

    #[tokio::test]
    #[ignore = "requires a running postgres instance"]
    async fn test_admin_cancel_restores_stock() {
        let pool = get_test_pool().await;
        let admin = create_test_user(&pool, UserRole::Admin).await;
        let user = create_test_user(&pool, UserRole::Customer).await;
        let variant_id = create_test_variant(&pool, 80000, None, 5).await;
        let order_id = place_order(&pool, user, variant_id, 4, PaymentMethod::Sepay).await;
        assert_eq!(fetch_stock(&pool, variant_id).await, (1, 4));

        let order = update_order_status(&pool, order_id, OrderStatus::Cancelled, admin, 15)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(fetch_stock(&pool, variant_id).await, (5, 0));
    }

    #[tokio::test]
    #[ignore = "requires a running postgres instance"]
    async fn test_listing_heals_expired_orders() {
        let pool = get_test_pool().await;
        let user = create_test_user(&pool, UserRole::Customer).await;
        let variant_id = create_test_variant(&pool, 50000, None, 3).await;
        let order_id = place_order(&pool, user, variant_id, 1, PaymentMethod::Sepay).await;

        let filter = OrderFilter {
            user_id: Some(user),
            ..Default::default()
        };
        let orders = list_orders(&pool, &filter, 0).await.unwrap();
        assert_eq!(orders.total, 1);
        assert_eq!(orders.items[0].id, order_id);
        assert_eq!(orders.items[0].status, OrderStatus::Cancelled);
        assert_eq!(orders.items[0].item_count, 1);
        assert_eq!(fetch_stock(&pool, variant_id).await, (3, 0));
    }

    #[tokio::test]
    #[ignore = "requires a running postgres instance"]
    async fn test_detail_keeps_deleted_shipping_address() {
        let pool = get_test_pool().await;
        let user = create_test_user(&pool, UserRole::Customer).await;
        let variant_id = create_test_variant(&pool, 65000, None, 4).await;
        let order_id = place_order(&pool, user, variant_id, 1, PaymentMethod::Cod).await;
        let address_id = fetch_order_detail(&pool, order_id, Some(user), 15)
            .await
            .unwrap()
            .address
            .unwrap()
            .id;

        delete_address(&pool, user, address_id).await.unwrap();
        let detail = fetch_order_detail(&pool, order_id, Some(user), 15).await.unwrap();
        let address = detail.address.expect("order lost its shipping address");
        assert_eq!(address.id, address_id);
        assert_eq!(address.detail, "12 Hang Bai");
    }
}
