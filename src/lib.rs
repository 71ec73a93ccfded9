//! Интеграция веб-приложения с YooKassa: создание платежей, управление
//! вебхуками, OAuth авторизация и разбор входящих уведомлений.
//!
//! # Пример
//!
//! ```no_run
//! use std::sync::Arc;
//! use yookassa_bridge::{
//!     AppState, HandlerRegistry, InMemoryStore, NotificationDispatcher, OAuthExchange, Outcome,
//!     PaymentGateway, RemoteStatusResolver, Settings, Store,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::from_env()?;
//! let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
//!
//! let gateway = PaymentGateway::from_settings(&settings)?;
//! let handlers = HandlerRegistry::new().register_fn(Outcome::Success, |payment, invoice| {
//!     println!("оплачен заказ {} ({})", invoice.uniq_id, payment.amount.value);
//!     Ok(())
//! });
//! let resolver = Arc::new(RemoteStatusResolver::new(gateway.client().clone()));
//!
//! let app = yookassa_bridge::router(AppState {
//!     dispatcher: Arc::new(NotificationDispatcher::new(resolver, handlers, store.clone())),
//!     oauth: Arc::new(OAuthExchange::from_settings(&settings, store)?),
//! });
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod models;
pub mod notification;
pub mod oauth;
pub mod store;
pub mod webhooks;

pub use client::{Auth, YooKassaClient};
pub use config::Settings;
pub use error::{ApiErrorKind, BoxError, YooKassaApiError, YooKassaError};
pub use gateway::{CreatedPayment, PaymentGateway};
pub use http::{AppState, router};
pub use models::{
    Amount, CreatePaymentRequest, NotificationEventType, Payment, PaymentStatus, Webhook,
    WebhookList,
};
pub use notification::{
    DispatchOutcome, HandlerRegistry, Invoice, NotificationDispatcher, Outcome, PaymentHandler,
    PaymentStatusResolver, RemoteStatusResolver, Resolution,
};
pub use oauth::{CallbackOutcome, CallbackQuery, OAuthExchange};
pub use store::{InMemoryStore, Store, StoreExt, TOKEN_KEY};
pub use webhooks::WebhookManager;
