#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use chrono::Utc;
    use quickcheck_macros::quickcheck;
    use uuid::Uuid;

    use crate::routes::voucher::schemas::Voucher;
    use crate::routes::voucher::utils::{evaluate_voucher, normalize_code, validate_voucher_fields};

    fn voucher(discount: i64, min: Option<i64>, max: Option<i64>, quantity: i32) -> Voucher {
        Voucher {
            id: Uuid::new_v4(),
            code: "GLOW50".to_string(),
            description: None,
            discount: BigDecimal::from(discount),
            min_order_amount: min.map(BigDecimal::from),
            max_discount: max.map(BigDecimal::from),
            quantity,
            created_on: Utc::now(),
        }
    }

    #[test]
    fn test_minimum_order_boundary() {
        let v = voucher(10, Some(100000), None, 5);
        let below = evaluate_voucher(Some(&v), &BigDecimal::from(99999));
        assert!(!below.valid);
        assert_eq!(below.discount_amount, BigDecimal::from(0));

        let at = evaluate_voucher(Some(&v), &BigDecimal::from(100000));
        assert!(at.valid);
        assert_eq!(at.discount_amount, BigDecimal::from(10000));
    }

    #[test]
    fn test_cap_applies_to_percentage_discount() {
        let v = voucher(50, None, Some(20000), 5);
        let result = evaluate_voucher(Some(&v), &BigDecimal::from(100000));
        assert!(result.valid);
        assert_eq!(result.discount_amount, BigDecimal::from(20000));
    }

    #[test]
    fn test_unknown_and_exhausted_vouchers_are_invalid() {
        let missing = evaluate_voucher(None, &BigDecimal::from(100000));
        assert!(!missing.valid);
        assert_eq!(missing.message, "Voucher code does not exist");

        let exhausted = evaluate_voucher(Some(&voucher(10, None, None, 0)), &BigDecimal::from(1));
        assert!(!exhausted.valid);
        assert_eq!(exhausted.message, "Voucher has no uses left");
    }

    #[test]
    fn test_discount_never_exceeds_subtotal() {
        let v = voucher(100, None, None, 1);
        let result = evaluate_voucher(Some(&v), &BigDecimal::from_str("45500.50").unwrap());
        assert_eq!(result.discount_amount, BigDecimal::from_str("45500.50").unwrap());
    }

    #[test]
    fn test_codes_are_normalized() {
        assert_eq!(normalize_code("  glow50 "), "GLOW50");
    }

    #[test]
    fn test_voucher_field_validation() {
        assert!(validate_voucher_fields(&BigDecimal::from(10), None, None, 3).is_ok());
        assert!(validate_voucher_fields(&BigDecimal::from(101), None, None, 3).is_err());
        assert!(
            validate_voucher_fields(&BigDecimal::from(10), Some(&BigDecimal::from(-1)), None, 3)
                .is_err()
        );
        assert!(validate_voucher_fields(&BigDecimal::from(10), None, None, -1).is_err());
    }

    #[quickcheck]
    fn prop_discount_is_bounded(subtotal: u32, percent: u8, cap: Option<u32>) -> bool {
        let percent = i64::from(percent % 101);
        let v = voucher(percent, None, cap.map(i64::from), 1);
        let subtotal = BigDecimal::from(subtotal);
        let result = evaluate_voucher(Some(&v), &subtotal);
        let within_cap = match &v.max_discount {
            Some(cap) if *cap > BigDecimal::from(0) => result.discount_amount <= *cap,
            _ => true,
        };
        result.valid
            && result.discount_amount >= BigDecimal::from(0)
            && result.discount_amount <= subtotal
            && within_cap
    }
}
