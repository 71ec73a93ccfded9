mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use yookassa_bridge::http::{NOTIFICATIONS_PATH, OAUTH_CALLBACK_PATH};
use yookassa_bridge::{
    AppState, HandlerRegistry, InMemoryStore, NotificationDispatcher, OAuthExchange, Outcome,
    PaymentGateway, RemoteStatusResolver, Settings, Store, StoreExt, router,
};

fn app(settings: &Settings, handlers: HandlerRegistry, store: InMemoryStore) -> axum::Router {
    let store: Arc<dyn Store> = Arc::new(store);
    let gateway = PaymentGateway::from_settings(settings).unwrap();
    let resolver = Arc::new(RemoteStatusResolver::new(gateway.client().clone()));
    router(AppState {
        dispatcher: Arc::new(NotificationDispatcher::new(resolver, handlers, store.clone())),
        oauth: Arc::new(OAuthExchange::from_settings(settings, store).unwrap()),
    })
}

fn post_json(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(NOTIFICATIONS_PATH)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn mock_payment(server: &MockServer, status: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/v3/payments/{}", common::PAYMENT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::payment_json(status, "order-7")))
        .mount(server)
        .await;
}

fn counting(counter: &Arc<AtomicUsize>) -> HandlerRegistry {
    let counter = counter.clone();
    HandlerRegistry::new().register_fn(Outcome::Success, move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn settled_notification_is_acknowledged() {
    let server = MockServer::start().await;
    mock_payment(&server, "succeeded").await;
    let calls = Arc::new(AtomicUsize::new(0));
    let app = app(&common::settings(&server), counting(&calls), InMemoryStore::new());

    let response = app
        .clone()
        .oneshot(post_json(&common::notification_json("succeeded", "order-7")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Повторная доставка тоже подтверждается, но обработчик не зовется
    let response = app
        .oneshot(post_json(&common::notification_json("succeeded", "order-7")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unrelated_body_is_acknowledged_without_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    let calls = Arc::new(AtomicUsize::new(0));
    let app = app(&common::settings(&server), counting(&calls), InMemoryStore::new());

    let response = app.oneshot(post_json(&json!({ "type": "ping" }))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failing_handler_is_not_acknowledged() {
    let server = MockServer::start().await;
    mock_payment(&server, "succeeded").await;
    let handlers = HandlerRegistry::new()
        .register_fn(Outcome::Success, |_, _| Err("заказ не найден".into()));
    let app = app(&common::settings(&server), handlers, InMemoryStore::new());

    let response = app
        .oneshot(post_json(&common::notification_json("succeeded", "order-7")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await, json!({ "error": "handler" }));
}

#[tokio::test]
async fn panicking_handler_is_not_acknowledged() {
    let server = MockServer::start().await;
    mock_payment(&server, "succeeded").await;
    let handlers =
        HandlerRegistry::new().register_fn(Outcome::Success, |_, _| panic!("склад недоступен"));
    let app = app(&common::settings(&server), handlers, InMemoryStore::new());

    let response = app
        .oneshot(post_json(&common::notification_json("succeeded", "order-7")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await, json!({ "error": "handler" }));
}

#[tokio::test]
async fn refund_notification_is_acknowledged_without_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    let calls = Arc::new(AtomicUsize::new(0));
    let app = app(&common::settings(&server), counting(&calls), InMemoryStore::new());
    let refund = json!({
        "type": "notification",
        "event": "refund.succeeded",
        "object": {
            "id": "216749f7-0016-50be-b000-078d43a63ae4",
            "payment_id": common::PAYMENT_ID,
            "status": "succeeded",
            "amount": { "value": "250.00", "currency": "RUB" },
            "created_at": "2024-01-02T10:00:00.000Z"
        }
    });
    let mut foreign_payment = common::notification_json("succeeded", "order-7");
    foreign_payment["object"]["metadata"] = json!({});

    for body in [refund, foreign_payment] {
        let response = app.clone().oneshot(post_json(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn oauth_popup_gets_closing_page() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "t-1" })))
        .mount(&server)
        .await;
    let store = InMemoryStore::new();
    let app = app(&common::settings(&server), HandlerRegistry::new(), store.clone());

    let request = Request::builder()
        .uri(format!("{OAUTH_CALLBACK_PATH}?code=abc"))
        .header("accept", "text/html,application/xhtml+xml")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"<script>window.close()</script>");
    assert_eq!(store.access_token().await.unwrap().as_deref(), Some("t-1"));
}

#[tokio::test]
async fn oauth_api_caller_gets_json_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "t-2" })))
        .mount(&server)
        .await;
    let app = app(&common::settings(&server), HandlerRegistry::new(), InMemoryStore::new());

    let request = Request::builder()
        .uri(format!("{OAUTH_CALLBACK_PATH}?code=abc"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn oauth_without_secret_is_server_error() {
    let server = MockServer::start().await;
    let mut settings = common::settings(&server);
    settings.client_secret = None;
    let app = app(&settings, HandlerRegistry::new(), InMemoryStore::new());

    let request = Request::builder()
        .uri(format!("{OAUTH_CALLBACK_PATH}?code=abc"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await, json!({ "error": "config" }));
}

#[tokio::test]
async fn oauth_without_code_is_bad_request() {
    let server = MockServer::start().await;
    let app = app(&common::settings(&server), HandlerRegistry::new(), InMemoryStore::new());

    let request = Request::builder()
        .uri(OAUTH_CALLBACK_PATH)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
