#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use crate::routes::checkout::errors::CheckoutError;
    use crate::routes::checkout::schemas::{
        CheckoutItem, CreateOrderRequest, OrderStatus, PaymentMethod, PaymentStatus,
        SePayWebhookRequest, TransitionActor,
    };
    use crate::routes::checkout::utils::{
        amount_matches, build_preview, cancel_customer_order, check_transition, create_order,
        expire_pending_payments, fetch_latest_payment, fetch_order, is_payment_expired,
        preview_order, reconcile_bank_transfer, remaining_seconds,
    };
    use crate::routes::product::schemas::ProductVariant;
    use crate::routes::user::schemas::UserRole;
    use crate::routes::voucher::schemas::Voucher;
    use crate::sepay_client::SePayClient;
    use crate::tests::tests::{
        create_test_address, create_test_user, create_test_variant, create_test_voucher,
        fetch_stock, get_test_pool,
    };

    fn variant(price: i64, discount: Option<i64>, stock: i32) -> ProductVariant {
        ProductVariant {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            product_name: "Vitamin C Serum".to_string(),
            brand: Some("Lumi".to_string()),
            variant_name: "30ml".to_string(),
            image_path: Some("serum.png".to_string()),
            price: BigDecimal::from(price),
            discount_price: discount.map(BigDecimal::from),
            stock,
            sold: 0,
        }
    }

    fn item(variant_id: Uuid, quantity: i32) -> CheckoutItem {
        CheckoutItem {
            cart_line_id: None,
            variant_id,
            quantity,
        }
    }

    fn transfer(content: &str, amount: &BigDecimal, reference: &str) -> SePayWebhookRequest {
        SePayWebhookRequest {
            id: Some(serde_json::json!(92704)),
            gateway: Some("Vietcombank".to_string()),
            transaction_date: None,
            account_number: None,
            code: None,
            content: content.to_string(),
            transfer_type: Some("in".to_string()),
            transfer_amount: amount.clone(),
            reference_code: Some(reference.to_string()),
            description: None,
        }
    }

    #[test]
    fn test_preview_prices_lines_and_applies_voucher() {
        let serum = variant(300000, Some(250000), 10);
        let mask = variant(50000, None, 10);
        let voucher = Voucher {
            id: Uuid::new_v4(),
            code: "GLOW10".to_string(),
            description: Some("10% off".to_string()),
            discount: BigDecimal::from(10),
            min_order_amount: Some(BigDecimal::from(100000)),
            max_discount: Some(BigDecimal::from(30000)),
            quantity: 3,
            created_on: Utc::now(),
        };
        let preview = build_preview(
            &[item(serum.id, 1), item(mask.id, 2)],
            &[serum.clone(), mask.clone()],
            Some(&voucher),
            None,
        )
        .unwrap();
        assert_eq!(preview.items.len(), 2);
        assert_eq!(preview.items[0].unit_price, BigDecimal::from(250000));
        assert_eq!(preview.items[1].line_total, BigDecimal::from(100000));
        assert_eq!(preview.subtotal, BigDecimal::from(350000));
        assert_eq!(preview.discount, BigDecimal::from(30000));
        assert_eq!(preview.shipping_fee, BigDecimal::from(0));
        assert_eq!(preview.total, BigDecimal::from(320000));
        assert_eq!(preview.voucher.unwrap().code, "GLOW10");
    }

    #[test]
    fn test_preview_skips_invalid_voucher() {
        let mask = variant(50000, None, 10);
        let voucher = Voucher {
            id: Uuid::new_v4(),
            code: "BIG".to_string(),
            description: None,
            discount: BigDecimal::from(20),
            min_order_amount: Some(BigDecimal::from(500000)),
            max_discount: None,
            quantity: 3,
            created_on: Utc::now(),
        };
        let preview =
            build_preview(&[item(mask.id, 1)], &[mask.clone()], Some(&voucher), None).unwrap();
        assert!(preview.voucher.is_none());
        assert_eq!(preview.discount, BigDecimal::from(0));
        assert_eq!(preview.total, BigDecimal::from(50000));
    }

    #[test]
    fn test_preview_rejects_missing_variant_and_short_stock() {
        let mask = variant(50000, None, 1);
        let missing = Uuid::new_v4();
        assert!(matches!(
            build_preview(&[item(missing, 1)], &[mask.clone()], None, None),
            Err(CheckoutError::VariantNotFound(id)) if id == missing
        ));
        assert!(matches!(
            build_preview(&[item(mask.id, 2)], &[mask.clone()], None, None),
            Err(CheckoutError::InsufficientStock { requested: 2, .. })
        ));
        assert!(matches!(
            build_preview(&[], &[mask], None, None),
            Err(CheckoutError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_state_machine() {
        use OrderStatus::*;
        let cod = PaymentMethod::Cod;
        let sepay = PaymentMethod::Sepay;

        assert!(check_transition(Pending, sepay, Confirmed, TransitionActor::System).is_ok());
        assert!(check_transition(Pending, sepay, Confirmed, TransitionActor::Admin).is_err());
        assert!(check_transition(Pending, cod, Confirmed, TransitionActor::Admin).is_ok());
        assert!(check_transition(Pending, cod, Cancelled, TransitionActor::Customer).is_ok());
        assert!(check_transition(Pending, sepay, Cancelled, TransitionActor::Customer).is_err());
        assert!(check_transition(Pending, sepay, Cancelled, TransitionActor::System).is_ok());
        assert!(check_transition(Confirmed, cod, Cancelled, TransitionActor::Admin).is_err());
        assert!(check_transition(Confirmed, cod, Processing, TransitionActor::Admin).is_ok());
        assert!(check_transition(Shipping, cod, Delivered, TransitionActor::Admin).is_ok());
        assert!(check_transition(Delivered, cod, Completed, TransitionActor::Admin).is_ok());
        assert!(check_transition(Processing, cod, Delivered, TransitionActor::Admin).is_err());
        assert!(matches!(
            check_transition(Cancelled, sepay, Confirmed, TransitionActor::System),
            Err(CheckoutError::InvalidState(Cancelled))
        ));
    }

    #[test]
    fn test_payment_window_projection() {
        let now = Utc::now();
        let created = now - Duration::minutes(10);
        let status = OrderStatus::Pending;
        assert!(!is_payment_expired(status, PaymentMethod::Sepay, created, 15, now));
        assert_eq!(remaining_seconds(status, PaymentMethod::Sepay, created, 15, now), 300);
        assert!(is_payment_expired(status, PaymentMethod::Sepay, created, 5, now));
        assert_eq!(remaining_seconds(status, PaymentMethod::Sepay, created, 5, now), 0);
        assert!(!is_payment_expired(status, PaymentMethod::Cod, created, 5, now));
        assert_eq!(remaining_seconds(status, PaymentMethod::Cod, created, 15, now), 0);
        assert!(!is_payment_expired(
            OrderStatus::Confirmed,
            PaymentMethod::Sepay,
            created,
            5,
            now
        ));
    }

    #[test]
    fn test_amount_tolerance() {
        let expected = BigDecimal::from(250000);
        assert!(amount_matches(&BigDecimal::from(250000), &expected, 1000));
        assert!(amount_matches(&BigDecimal::from(249000), &expected, 1000));
        assert!(amount_matches(&BigDecimal::from_str("251000.00").unwrap(), &expected, 1000));
        assert!(!amount_matches(&BigDecimal::from(248999), &expected, 1000));
        assert!(!amount_matches(&BigDecimal::from(251001), &expected, 1000));
    }

    #[test]
    fn test_webhook_payload_shape() {
        let payload: SePayWebhookRequest = serde_json::from_str(
            r#"{"id": 92704, "gateway": "Vietcombank", "content": "MBVCB.123 DH1A2B3C4D FT",
                "transferType": "in", "transferAmount": 250000, "referenceCode": ""}"#,
        )
        .unwrap();
        assert_eq!(payload.transfer_amount, BigDecimal::from(250000));
        assert_eq!(payload.transaction_id().as_deref(), Some("92704"));
        assert!(!payload.is_outgoing());

        let payload = transfer("DH1A2B3C4D", &BigDecimal::from(1), "FT2401");
        assert_eq!(payload.transaction_id().as_deref(), Some("FT2401"));
    }

    #[test]
    fn test_payment_method_accepts_lowercase() {
        let method: PaymentMethod = serde_json::from_str(r#""sepay""#).unwrap();
        assert_eq!(method, PaymentMethod::Sepay);
        let method: PaymentMethod = serde_json::from_str(r#""COD""#).unwrap();
        assert_eq!(method, PaymentMethod::Cod);
        assert_eq!(serde_json::to_string(&PaymentMethod::Sepay).unwrap(), r#""SEPAY""#);
        assert_eq!(PaymentMethod::Cod.initial_payment_status(), PaymentStatus::CodPending);
    }

    async fn order_request(
        pool: &sqlx::PgPool,
        user_id: Uuid,
        variant_id: Uuid,
        quantity: i32,
        method: PaymentMethod,
        voucher_code: Option<String>,
    ) -> CreateOrderRequest {
        CreateOrderRequest {
            items: vec![item(variant_id, quantity)],
            address_id: create_test_address(pool, user_id).await,
            payment_method: method,
            voucher_code,
            note: None,
        }
    }

    #[tokio::test]
    #[ignore = "requires a running postgres instance"]
    async fn test_create_order_matches_preview_and_reserves_stock() {
        let pool = get_test_pool().await;
        let user_id = create_test_user(&pool, UserRole::Customer).await;
        let variant_id = create_test_variant(&pool, 120000, Some(100000), 5).await;
        let code = create_test_voucher(&pool, 50, None, Some(20000), 1).await;
        let request =
            order_request(&pool, user_id, variant_id, 2, PaymentMethod::Cod, Some(code)).await;

        let preview = preview_order(
            &pool,
            user_id,
            &request.items,
            request.voucher_code.as_deref(),
            Some(request.address_id),
        )
        .await
        .unwrap();
        let (order, _) = create_order(&pool, user_id, &request).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, preview.subtotal);
        assert_eq!(order.discount_amount, BigDecimal::from(20000));
        assert_eq!(order.final_amount, preview.total);
        assert_eq!(order.final_amount, &order.total_amount - &order.discount_amount);
        assert_eq!(fetch_stock(&pool, variant_id).await, (3, 2));

        let payment = fetch_latest_payment(&pool, order.id).await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::CodPending);
        assert_eq!(payment.amount, order.final_amount);

        // The single voucher use is gone, a second order pays full price.
        let again = order_request(
            &pool,
            user_id,
            variant_id,
            1,
            PaymentMethod::Cod,
            request.voucher_code.clone(),
        )
        .await;
        let (second, _) = create_order(&pool, user_id, &again).await.unwrap();
        assert_eq!(second.discount_amount, BigDecimal::from(0));
    }

    #[tokio::test]
    #[ignore = "requires a running postgres instance"]
    async fn test_duplicate_webhook_confirms_once() {
        let pool = get_test_pool().await;
        let user_id = create_test_user(&pool, UserRole::Customer).await;
        let variant_id = create_test_variant(&pool, 150000, None, 3).await;
        let request = order_request(&pool, user_id, variant_id, 1, PaymentMethod::Sepay, None).await;
        let (order, _) = create_order(&pool, user_id, &request).await.unwrap();

        let content = format!("IB {} thanh toan", SePayClient::payment_content(&order.payment_code));
        let short = transfer(&content, &BigDecimal::from(100000), "FT-SHORT");
        let outcome = reconcile_bank_transfer(&pool, &short, 1000).await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Amount mismatch");
        let unchanged = fetch_order(&pool, order.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, OrderStatus::Pending);

        let reference = format!("FT{}", Uuid::new_v4().simple());
        let paid = transfer(&content.to_lowercase(), &order.final_amount, &reference);
        let first = reconcile_bank_transfer(&pool, &paid, 1000).await.unwrap();
        assert!(first.success);
        assert_eq!(first.order_id, Some(order.id));
        let second = reconcile_bank_transfer(&pool, &paid, 1000).await.unwrap();
        assert!(second.success);
        assert_eq!(second.message, "Payment already confirmed");

        let confirmed = fetch_order(&pool, order.id).await.unwrap().unwrap();
        assert_eq!(confirmed.status, OrderStatus::Confirmed);
        let payment = fetch_latest_payment(&pool, order.id).await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::Success);
        assert_eq!(payment.transaction_id, Some(reference));

        let unknown = transfer("DHFFFFFFFF", &order.final_amount, "FT-X");
        let outcome = reconcile_bank_transfer(&pool, &unknown, 1000).await.unwrap();
        assert!(!outcome.success);
        let outcome =
            reconcile_bank_transfer(&pool, &transfer("hello", &order.final_amount, "FT-Y"), 1000)
                .await
                .unwrap();
        assert_eq!(outcome.message, "Invalid content format");
    }

    #[tokio::test]
    #[ignore = "requires a running postgres instance"]
    async fn test_expiry_sweep_cancels_and_blocks_late_payment() {
        let pool = get_test_pool().await;
        let user_id = create_test_user(&pool, UserRole::Customer).await;
        let variant_id = create_test_variant(&pool, 90000, None, 4).await;
        let request = order_request(&pool, user_id, variant_id, 3, PaymentMethod::Sepay, None).await;
        let (order, _) = create_order(&pool, user_id, &request).await.unwrap();
        assert_eq!(fetch_stock(&pool, variant_id).await, (1, 3));

        let expired = expire_pending_payments(&pool, 0).await.unwrap();
        assert!(expired.contains(&order.id));
        let cancelled = fetch_order(&pool, order.id).await.unwrap().unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(fetch_stock(&pool, variant_id).await, (4, 0));
        let payment = fetch_latest_payment(&pool, order.id).await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::Cancelled);

        // A second sweep finds nothing left to do for this order.
        assert!(!expire_pending_payments(&pool, 0).await.unwrap().contains(&order.id));

        let late = transfer(
            &SePayClient::payment_content(&order.payment_code),
            &order.final_amount,
            &format!("FT{}", Uuid::new_v4().simple()),
        );
        let outcome = reconcile_bank_transfer(&pool, &late, 1000).await.unwrap();
        assert!(!outcome.success);
        let still = fetch_order(&pool, order.id).await.unwrap().unwrap();
        assert_eq!(still.status, OrderStatus::Cancelled);
        assert_eq!(fetch_stock(&pool, variant_id).await, (4, 0));
    }

    #[tokio::test]
    #[ignore = "requires a running postgres instance"]
    async fn test_expiry_sweep_continues_past_failing_order() {
        let pool = get_test_pool().await;
        let user_id = create_test_user(&pool, UserRole::Customer).await;
        let broken_variant = create_test_variant(&pool, 40000, None, 2).await;
        let healthy_variant = create_test_variant(&pool, 40000, None, 2).await;
        let broken_request =
            order_request(&pool, user_id, broken_variant, 1, PaymentMethod::Sepay, None).await;
        let (broken, _) = create_order(&pool, user_id, &broken_request).await.unwrap();
        let healthy_request =
            order_request(&pool, user_id, healthy_variant, 1, PaymentMethod::Sepay, None).await;
        let (healthy, _) = create_order(&pool, user_id, &healthy_request).await.unwrap();

        // Putting units back would overflow the stock column.
        sqlx::query("UPDATE product_type SET stock = 2147483647 WHERE id = $1")
            .bind(broken_variant)
            .execute(&pool)
            .await
            .unwrap();

        let expired = expire_pending_payments(&pool, 0).await.unwrap();
        assert!(expired.contains(&healthy.id));
        assert!(!expired.contains(&broken.id));
        let stuck = fetch_order(&pool, broken.id).await.unwrap().unwrap();
        assert_eq!(stuck.status, OrderStatus::Pending);
        assert_eq!(fetch_stock(&pool, healthy_variant).await, (2, 0));

        sqlx::query("UPDATE product_type SET stock = 1 WHERE id = $1")
            .bind(broken_variant)
            .execute(&pool)
            .await
            .unwrap();
        assert!(expire_pending_payments(&pool, 0).await.unwrap().contains(&broken.id));
        assert_eq!(fetch_stock(&pool, broken_variant).await, (2, 0));
    }

    #[tokio::test]
    #[ignore = "requires a running postgres instance"]
    async fn test_concurrent_orders_for_last_unit() {
        let pool = get_test_pool().await;
        let variant_id = create_test_variant(&pool, 70000, None, 1).await;
        let first_user = create_test_user(&pool, UserRole::Customer).await;
        let second_user = create_test_user(&pool, UserRole::Customer).await;
        let first = order_request(&pool, first_user, variant_id, 1, PaymentMethod::Cod, None).await;
        let second =
            order_request(&pool, second_user, variant_id, 1, PaymentMethod::Cod, None).await;

        let (a, b) = tokio::join!(
            create_order(&pool, first_user, &first),
            create_order(&pool, second_user, &second)
        );
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        let failure = if a.is_err() { a.err() } else { b.err() };
        assert!(matches!(failure, Some(CheckoutError::InsufficientStock { .. })));
        assert_eq!(fetch_stock(&pool, variant_id).await, (0, 1));
    }

    #[tokio::test]
    #[ignore = "requires a running postgres instance"]
    async fn test_concurrent_orders_for_last_voucher_use() {
        let pool = get_test_pool().await;
        let variant_id = create_test_variant(&pool, 100000, None, 10).await;
        let code = create_test_voucher(&pool, 10, None, None, 1).await;
        let first_user = create_test_user(&pool, UserRole::Customer).await;
        let second_user = create_test_user(&pool, UserRole::Customer).await;
        let first = order_request(
            &pool,
            first_user,
            variant_id,
            1,
            PaymentMethod::Cod,
            Some(code.clone()),
        )
        .await;
        let second = order_request(
            &pool,
            second_user,
            variant_id,
            1,
            PaymentMethod::Cod,
            Some(code.clone()),
        )
        .await;

        let (a, b) = tokio::join!(
            create_order(&pool, first_user, &first),
            create_order(&pool, second_user, &second)
        );
        // The loser either saw the voucher as used up while pricing (full
        // price order) or lost the conditional decrement (rejected).
        let mut discounted = 0;
        let mut placed = 0;
        for outcome in [a, b] {
            match outcome {
                Ok((order, _)) => {
                    placed += 1;
                    if order.discount_amount > BigDecimal::from(0) {
                        assert_eq!(order.discount_amount, BigDecimal::from(10000));
                        discounted += 1;
                    }
                }
                Err(e) => assert!(matches!(e, CheckoutError::VoucherExhausted(ref c) if *c == code)),
            }
        }
        assert_eq!(discounted, 1);
        let (remaining,): (i32,) = sqlx::query_as("SELECT quantity FROM voucher WHERE code = $1")
            .bind(&code)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
        assert_eq!(fetch_stock(&pool, variant_id).await, (10 - placed, placed));
    }

    #[tokio::test]
    #[ignore = "requires a running postgres instance"]
    async fn test_customer_cancel_rules() {
        let pool = get_test_pool().await;
        let user_id = create_test_user(&pool, UserRole::Customer).await;
        let variant_id = create_test_variant(&pool, 60000, None, 5).await;

        let cod = order_request(&pool, user_id, variant_id, 2, PaymentMethod::Cod, None).await;
        let (cod_order, _) = create_order(&pool, user_id, &cod).await.unwrap();
        cancel_customer_order(&pool, user_id, cod_order.id).await.unwrap();
        assert_eq!(fetch_stock(&pool, variant_id).await, (5, 0));
        assert!(matches!(
            cancel_customer_order(&pool, user_id, cod_order.id).await,
            Err(CheckoutError::InvalidState(OrderStatus::Cancelled))
        ));

        let sepay = order_request(&pool, user_id, variant_id, 1, PaymentMethod::Sepay, None).await;
        let (sepay_order, _) = create_order(&pool, user_id, &sepay).await.unwrap();
        let paid = transfer(
            &SePayClient::payment_content(&sepay_order.payment_code),
            &sepay_order.final_amount,
            &format!("FT{}", Uuid::new_v4().simple()),
        );
        assert!(reconcile_bank_transfer(&pool, &paid, 1000).await.unwrap().success);
        assert!(matches!(
            cancel_customer_order(&pool, user_id, sepay_order.id).await,
            Err(CheckoutError::InvalidState(OrderStatus::Confirmed))
        ));

        let stranger = create_test_user(&pool, UserRole::Customer).await;
        assert!(matches!(
            cancel_customer_order(&pool, stranger, sepay_order.id).await,
            Err(CheckoutError::OrderNotFound)
        ));
    }
}
