#![allow(dead_code)]

use std::time::Duration;

use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::MockServer;
use yookassa_bridge::Settings;

pub const PAYMENT_ID: &str = "2d6a1a4b-000f-5000-9000-1b68e7b15f3f";
pub const CLIENT_ID: &str = "app-1";

/// Настройки, направленные на mock-сервер.
pub fn settings(server: &MockServer) -> Settings {
    Settings {
        shop_id: Some("100500".to_string()),
        secret_key: Some(SecretString::from("test_secret_key".to_string())),
        client_id: Some(CLIENT_ID.to_string()),
        client_secret: Some(SecretString::from("client-secret".to_string())),
        return_url: Some("https://shop.example/return".to_string()),
        api_url: format!("{}/v3/", server.uri()),
        oauth_token_url: format!("{}/oauth/v2/token", server.uri()),
        http_timeout: Duration::from_secs(5),
    }
}

pub fn payment_json(status: &str, uniq_id: &str) -> Value {
    json!({
        "id": PAYMENT_ID,
        "status": status,
        "paid": status == "succeeded",
        "amount": { "value": "250.00", "currency": "RUB" },
        "recipient": { "account_id": "100500", "gateway_id": "100700" },
        "created_at": "2024-01-01T10:00:00.000Z",
        "description": "Заказ №7",
        "test": true,
        "refundable": false,
        "metadata": { "uniq_id": uniq_id }
    })
}

pub fn notification_json(status: &str, uniq_id: &str) -> Value {
    json!({
        "type": "notification",
        "event": format!("payment.{status}"),
        "object": payment_json(status, uniq_id)
    })
}
