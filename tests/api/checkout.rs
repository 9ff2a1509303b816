use hmac::{Hmac, Mac};
use secrecy::SecretString;
use serde_json::{json, Value};
use sha2::Sha256;

use crate::helpers::{spawn_app, spawn_app_with, TestApp};

const WEBHOOK_SECRET: &str = "integration-webhook-secret";

fn sign(body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes())
        .expect("HMAC accepts keys of any size");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

async fn spawn_signed_app() -> TestApp {
    spawn_app_with(|c| {
        c.sepay.webhook_secret = Some(SecretString::from(WEBHOOK_SECRET));
    })
    .await
}

async fn post_webhook(app: &TestApp, body: &[u8], signature: Option<&str>) -> reqwest::Response {
    let mut request = reqwest::Client::new()
        .post(format!("{}/checkout/sepay-webhook", &app.address))
        .header("Content-Type", "application/json")
        .body(body.to_vec());
    if let Some(signature) = signature {
        request = request.header("X-SePay-Signature", signature);
    }
    request.send().await.expect("Failed to execute request.")
}

#[actix_web::test]
async fn webhook_without_signature_is_rejected() {
    let app = spawn_signed_app().await;
    let body = json!({"id": 1, "content": "DH1A2B3C4D", "transferType": "in", "transferAmount": 100000})
        .to_string();

    let response = post_webhook(&app, body.as_bytes(), None).await;
    assert_eq!(response.status().as_u16(), 401);
    let payload: Value = response.json().await.expect("Response is not JSON");
    assert_eq!(payload["success"], false);
    assert_eq!(payload["message"], "Invalid signature");

    let response = post_webhook(&app, body.as_bytes(), Some("deadbeef")).await;
    assert_eq!(response.status().as_u16(), 401);
}

#[actix_web::test]
async fn signed_outgoing_transfer_is_ignored() {
    let app = spawn_signed_app().await;
    let body = json!({"id": 2, "content": "DH1A2B3C4D", "transferType": "out", "transferAmount": 100000})
        .to_string();
    let signature = sign(body.as_bytes());

    let response = post_webhook(&app, body.as_bytes(), Some(&signature)).await;
    assert_eq!(response.status().as_u16(), 200);
    let payload: Value = response.json().await.expect("Response is not JSON");
    assert_eq!(payload["success"], false);
    assert_eq!(payload["message"], "Outgoing transfer ignored");
}

#[actix_web::test]
async fn webhook_reports_malformed_payloads() {
    let app = spawn_app().await;

    let response = post_webhook(&app, b"{not json", None).await;
    assert_eq!(response.status().as_u16(), 200);
    let payload: Value = response.json().await.expect("Response is not JSON");
    assert_eq!(payload["message"], "Invalid payload");

    let body = json!({"id": 3, "content": "thanks for the lipstick", "transferType": "in"}).to_string();
    let response = post_webhook(&app, body.as_bytes(), None).await;
    let payload: Value = response.json().await.expect("Response is not JSON");
    assert_eq!(payload["success"], false);
    assert_eq!(payload["message"], "Invalid content format");
}

#[actix_web::test]
async fn preview_requires_a_bearer_token() {
    let app = spawn_app().await;

    let response = reqwest::Client::new()
        .post(format!("{}/checkout/preview", &app.address))
        .json(&json!({"items": []}))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status().as_u16(), 401);
}
