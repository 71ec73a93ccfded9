mod common;

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use yookassa_bridge::{
    ApiErrorKind, InMemoryStore, NotificationEventType, Store, StoreExt, WebhookManager,
    YooKassaError,
};

async fn manager(server: &MockServer) -> WebhookManager {
    let store = InMemoryStore::new();
    store.save_access_token("oauth-token".into()).await.unwrap();
    WebhookManager::from_settings(&common::settings(server), Arc::new(store)).unwrap()
}

#[tokio::test]
async fn add_webhook_defaults_to_payment_succeeded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/webhooks"))
        .and(header("authorization", "Bearer app-1:oauth-token"))
        .and(header_exists("idempotence-key"))
        .and(body_json(json!({
            "event": "payment.succeeded",
            "url": "https://shop.example/yookassa/notifications"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "wh-e44e8088-bd73-43b1-959a-954f3a7d0c54",
            "event": "payment.succeeded",
            "url": "https://shop.example/yookassa/notifications"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let webhook = manager(&server)
        .await
        .add_webhook("https://shop.example/yookassa/notifications", None)
        .await
        .unwrap();

    assert_eq!(webhook.id, "wh-e44e8088-bd73-43b1-959a-954f3a7d0c54");
    assert_eq!(webhook.event, NotificationEventType::PaymentSucceeded);
}

#[tokio::test]
async fn add_webhook_with_explicit_event() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/webhooks"))
        .and(body_json(json!({
            "event": "payment.canceled",
            "url": "https://shop.example/hooks"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "wh-2",
            "event": "payment.canceled",
            "url": "https://shop.example/hooks"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let webhook = manager(&server)
        .await
        .add_webhook("https://shop.example/hooks", Some(NotificationEventType::PaymentCanceled))
        .await
        .unwrap();

    assert_eq!(webhook.event, NotificationEventType::PaymentCanceled);
}

#[tokio::test]
async fn lists_all_subscriptions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/webhooks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "list",
            "items": [
                { "id": "wh-1", "event": "payment.succeeded", "url": "https://shop.example/a" },
                { "id": "wh-2", "event": "refund.succeeded", "url": "https://shop.example/b" }
            ]
        })))
        .mount(&server)
        .await;

    let webhooks = manager(&server).await.list_webhooks().await.unwrap();

    assert_eq!(webhooks.len(), 2);
    assert_eq!(webhooks[1].event, NotificationEventType::RefundSucceeded);
}

#[tokio::test]
async fn delete_unknown_webhook_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v3/webhooks/wh-missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "type": "error",
            "id": "0b6d2b3f-8b4e-4c5d-9a6c-2a0b4e1c2d3f",
            "code": "not_found",
            "description": "Webhook doesn't exist"
        })))
        .mount(&server)
        .await;

    let err = manager(&server).await.delete_webhook("wh-missing").await.unwrap_err();

    assert_eq!(err.api_kind(), Some(ApiErrorKind::NotFound));
    match err {
        YooKassaError::ApiError { error_details, .. } => {
            assert_eq!(error_details.unwrap().code, "not_found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn delete_existing_webhook() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v3/webhooks/wh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    manager(&server).await.delete_webhook("wh-1").await.unwrap();
}

#[tokio::test]
async fn expired_token_surfaces_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/webhooks"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "type": "error",
            "id": "1",
            "code": "invalid_credentials",
            "description": "Authentication token expired"
        })))
        .mount(&server)
        .await;

    let err = manager(&server).await.list_webhooks().await.unwrap_err();

    assert_eq!(err.api_kind(), Some(ApiErrorKind::Unauthorized));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn manager_without_token_fails_before_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
    let manager = WebhookManager::from_settings(&common::settings(&server), store).unwrap();

    assert!(matches!(
        manager.list_webhooks().await,
        Err(YooKassaError::Config(_))
    ));
}
