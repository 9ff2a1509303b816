use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use sha2::Sha256;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::configuration::SePaySettings;
use crate::constants::{PAYMENT_CODE_LENGTH, PAYMENT_CONTENT_PREFIX, PAYMENT_TOKEN_PATTERN};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, PartialEq, Eq)]
pub enum SignatureCheck {
    NotConfigured,
    Valid,
    Missing,
    Invalid,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SePayPaymentInfo {
    pub bank_id: String,
    pub account_number: String,
    pub account_name: String,
    #[schema(value_type = f64)]
    pub amount: BigDecimal,
    pub content: String,
    pub qr_url: String,
    pub expire_at: DateTime<Utc>,
}

/// SePay bank transfer collaborator: builds QR links and transfer memos,
/// verifies webhook signatures.
#[derive(Debug, Clone)]
pub struct SePayClient {
    account_number: String,
    account_name: String,
    bank_id: String,
    qr_base_url: String,
    template: Option<String>,
    webhook_secret: Option<SecretString>,
}

impl SePayClient {
    pub fn new(settings: &SePaySettings) -> Self {
        Self {
            account_number: settings.account_number.clone(),
            account_name: settings.account_name.clone(),
            bank_id: settings.bank_id.clone(),
            qr_base_url: settings.qr_base_url.clone(),
            template: settings.template.clone(),
            webhook_secret: settings.webhook_secret.clone(),
        }
    }

    pub fn payment_content(payment_code: &str) -> String {
        format!("{}{}", PAYMENT_CONTENT_PREFIX, payment_code.to_uppercase())
    }

    pub fn qr_url(&self, amount: &BigDecimal, content: &str) -> String {
        let amount = amount.with_scale_round(0, RoundingMode::HalfUp);
        let mut url = format!(
            "{}?acc={}&bank={}&amount={}&des={}",
            self.qr_base_url, self.account_number, self.bank_id, amount, content
        );
        if let Some(template) = &self.template {
            url.push_str(&format!("&template={}", template));
        }
        url
    }

    pub fn payment_info(
        &self,
        amount: &BigDecimal,
        payment_code: &str,
        expire_at: DateTime<Utc>,
    ) -> SePayPaymentInfo {
        let content = Self::payment_content(payment_code);
        SePayPaymentInfo {
            bank_id: self.bank_id.clone(),
            account_number: self.account_number.clone(),
            account_name: self.account_name.clone(),
            amount: amount.clone(),
            qr_url: self.qr_url(amount, &content),
            content,
            expire_at,
        }
    }

    /// HMAC-SHA256 over the raw request body, hex encoded in the signature
    /// header. Comparison is constant time.
    pub fn verify_signature(&self, payload: &[u8], signature: Option<&str>) -> SignatureCheck {
        let Some(secret) = &self.webhook_secret else {
            return SignatureCheck::NotConfigured;
        };
        let Some(signature) = signature.map(str::trim).filter(|s| !s.is_empty()) else {
            return SignatureCheck::Missing;
        };
        let signature = signature.strip_prefix("sha256=").unwrap_or(signature);
        let Ok(expected) = hex::decode(signature) else {
            return SignatureCheck::Invalid;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose_secret().as_bytes()) else {
            return SignatureCheck::Invalid;
        };
        mac.update(payload);
        match mac.verify_slice(&expected) {
            Ok(()) => SignatureCheck::Valid,
            Err(_) => SignatureCheck::Invalid,
        }
    }
}

/// Correlation token embedded in the transfer memo: the last eight hex
/// digits of the order id, upper-cased.
pub fn generate_payment_code(order_id: &Uuid) -> String {
    let simple = order_id.simple().to_string();
    simple[simple.len() - PAYMENT_CODE_LENGTH..].to_uppercase()
}

/// Every 8 alphanumeric token that directly follows a `DH` in a bank memo,
/// in order of appearance. Each `DH` is a candidate, so a stray prefix such
/// as `DHDH1A2B3C4D` still yields the real token. Banks prepend and append
/// their own references.
pub fn extract_payment_codes(memo: &str) -> Vec<String> {
    let normalized = memo.trim().to_uppercase();
    let mut codes: Vec<String> = Vec::new();
    for (index, prefix) in normalized.match_indices(PAYMENT_CONTENT_PREFIX) {
        let rest = &normalized[index + prefix.len()..];
        if let Some(token) = PAYMENT_TOKEN_PATTERN.find(rest) {
            let token = token.as_str().to_string();
            if !codes.contains(&token) {
                codes.push(token);
            }
        }
    }
    codes
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use chrono::Utc;
    use hmac::Mac;
    use secrecy::SecretString;
    use uuid::Uuid;

    use super::{
        extract_payment_codes, generate_payment_code, HmacSha256, SePayClient, SignatureCheck,
    };
    use crate::configuration::SePaySettings;

    fn settings(secret: Option<&str>) -> SePaySettings {
        SePaySettings {
            account_number: "0123456789".to_string(),
            account_name: "COSMETIC STOREFRONT".to_string(),
            bank_id: "MB".to_string(),
            qr_base_url: "https://qr.sepay.vn/img".to_string(),
            template: None,
            webhook_secret: secret.map(SecretString::from),
            payment_timeout_minutes: 15,
            amount_tolerance: 1000,
            sweep_interval_seconds: 60,
        }
    }

    fn sign(secret: &str, payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_memo_extraction_ignores_bank_noise() {
        assert_eq!(
            extract_payment_codes("MBVCB.123456.dh1a2b3c4d.CT tu 0123 toi 4567"),
            vec!["1A2B3C4D".to_string()]
        );
        assert_eq!(
            extract_payment_codes("  DHABCD1234  "),
            vec!["ABCD1234".to_string()]
        );
        assert!(extract_payment_codes("thanh toan don hang").is_empty());
        assert_eq!(
            extract_payment_codes("CHUYENTIENDHDH1A2B3C4D"),
            vec!["DH1A2B3C".to_string(), "1A2B3C4D".to_string()]
        );
        assert_eq!(
            extract_payment_codes("dh dhABCD1234 DHABCD1234"),
            vec!["ABCD1234".to_string()]
        );
        assert!(extract_payment_codes("DH12345").is_empty());
    }

    #[test]
    fn test_payment_code_is_the_order_id_suffix() {
        let order_id = Uuid::from_str("8f14e45f-ceea-467f-a0e6-b2c1d3e4f5a6").unwrap();
        let code = generate_payment_code(&order_id);
        assert_eq!(code, "D3E4F5A6");
        let content = SePayClient::payment_content(&code);
        assert_eq!(extract_payment_codes(&content), vec![code]);
    }

    #[test]
    fn test_qr_url_uses_whole_currency_units() {
        let client = SePayClient::new(&settings(None));
        let url = client.qr_url(&BigDecimal::from_str("150000.00").unwrap(), "DHD3E4F5A6");
        assert_eq!(
            url,
            "https://qr.sepay.vn/img?acc=0123456789&bank=MB&amount=150000&des=DHD3E4F5A6"
        );
        let info = client.payment_info(&BigDecimal::from(99000), "d3e4f5a6", Utc::now());
        assert_eq!(info.content, "DHD3E4F5A6");
        assert!(info.qr_url.ends_with("&amount=99000&des=DHD3E4F5A6"));
    }

    #[test]
    fn test_signature_verification() {
        let payload = br#"{"content":"DHD3E4F5A6","transferAmount":150000}"#;
        let client = SePayClient::new(&settings(Some("whsec")));
        let signature = sign("whsec", payload);

        assert_eq!(
            client.verify_signature(payload, Some(&signature)),
            SignatureCheck::Valid
        );
        assert_eq!(
            client.verify_signature(payload, Some(&format!("sha256={}", signature))),
            SignatureCheck::Valid
        );
        assert_eq!(
            client.verify_signature(payload, Some(&sign("other", payload))),
            SignatureCheck::Invalid
        );
        assert_eq!(
            client.verify_signature(payload, Some("not-hex")),
            SignatureCheck::Invalid
        );
        assert_eq!(client.verify_signature(payload, None), SignatureCheck::Missing);

        let unsigned = SePayClient::new(&settings(None));
        assert_eq!(
            unsigned.verify_signature(payload, None),
            SignatureCheck::NotConfigured
        );
    }
}
