//! Управление подписками на уведомления (вебхуками).
//!
//! Подписки живут только на стороне YooKassa, локально ничего не хранится.
//! Для работы с вебхуками нужен OAuth токен, поэтому [`WebhookManager`]
//! собирает клиента из хранилища на каждый вызов.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;

use crate::client::{YooKassaClient, api_error};
use crate::config::{Settings, require};
use crate::error::YooKassaError;
use crate::models::{CreateWebhookRequest, NotificationEventType, Webhook, WebhookList};
use crate::store::Store;

impl YooKassaClient {
    /// Создает подписку на событие.
    pub async fn add_webhook(
        &self,
        event: NotificationEventType,
        url: &str,
    ) -> Result<Webhook, YooKassaError> {
        let request = CreateWebhookRequest {
            event,
            url: url.to_string(),
        };
        let response = self
            .send_request(Method::POST, "webhooks", Some(&request), true)
            .await?;
        self.process_response(response).await
    }

    /// Список подписок магазина.
    pub async fn list_webhooks(&self) -> Result<WebhookList, YooKassaError> {
        let response = self
            .send_request::<()>(Method::GET, "webhooks", None, false)
            .await?;
        self.process_response(response).await
    }

    /// Удаляет подписку. Несуществующий id - ошибка `NotFound` от API.
    pub async fn remove_webhook(&self, webhook_id: &str) -> Result<(), YooKassaError> {
        let endpoint = format!("webhooks/{}", webhook_id);
        let response = self
            .send_request::<()>(Method::DELETE, &endpoint, None, true)
            .await?;
        // В ответ приходит пустой объект, разбирать нечего
        if response.status().is_success() {
            Ok(())
        } else {
            Err(api_error(response).await)
        }
    }
}

pub struct WebhookManager {
    client_id: String,
    store: Arc<dyn Store>,
    base_url: String,
    timeout: Duration,
}

impl WebhookManager {
    pub fn from_settings(settings: &Settings, store: Arc<dyn Store>) -> Result<Self, YooKassaError> {
        let client_id = require(settings.client_id.clone(), "YOOKASSA_CLIENT_ID")?;
        Ok(WebhookManager {
            client_id,
            store,
            base_url: settings.api_url.clone(),
            timeout: settings.http_timeout,
        })
    }

    // Токен читается при каждом вызове, чтобы не работать со старым
    async fn client(&self) -> Result<YooKassaClient, YooKassaError> {
        let client =
            YooKassaClient::from_store(self.client_id.clone(), self.store.as_ref(), self.timeout)
                .await?;
        Ok(client.set_base_url(self.base_url.clone()))
    }

    /// Подписывает `url` на событие; по умолчанию `payment.succeeded`.
    pub async fn add_webhook(
        &self,
        url: &str,
        event: Option<NotificationEventType>,
    ) -> Result<Webhook, YooKassaError> {
        let event = event.unwrap_or_default();
        let webhook = self.client().await?.add_webhook(event, url).await?;
        tracing::info!(webhook_id = %webhook.id, ?event, "вебхук создан");
        Ok(webhook)
    }

    pub async fn list_webhooks(&self) -> Result<Vec<Webhook>, YooKassaError> {
        Ok(self.client().await?.list_webhooks().await?.items)
    }

    pub async fn delete_webhook(&self, webhook_id: &str) -> Result<(), YooKassaError> {
        self.client().await?.remove_webhook(webhook_id).await?;
        tracing::info!(webhook_id, "вебхук удален");
        Ok(())
    }
}
