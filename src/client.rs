use std::fmt;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Method, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::YOOKASSA_API_BASE_URL;
use crate::error::{YooKassaApiError, YooKassaError};
use crate::models::{CreatePaymentRequest, Payment};
use crate::store::{Store, StoreExt};

const IDEMPOTENCE_KEY_HEADER: &str = "Idempotence-Key";

/// Способ авторизации клиента. Один клиент - один способ.
#[derive(Clone)]
pub enum Auth {
    /// `Authorization: Bearer <client_id>:<token>`, токен получен через OAuth.
    BearerComposite { client_id: String, token: SecretString },
    /// HTTP Basic по идентификатору магазина и секретному ключу.
    ShopCredential { shop_id: String, secret_key: SecretString },
}

impl Auth {
    pub(crate) fn bearer_header(&self) -> Result<Option<HeaderValue>, YooKassaError> {
        match self {
            Auth::BearerComposite { client_id, token } => {
                let mut value = HeaderValue::from_str(&format!(
                    "Bearer {}:{}",
                    client_id,
                    token.expose_secret()
                ))?;
                value.set_sensitive(true);
                Ok(Some(value))
            }
            Auth::ShopCredential { .. } => Ok(None),
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::BearerComposite { client_id, .. } => f
                .debug_struct("BearerComposite")
                .field("client_id", client_id)
                .finish_non_exhaustive(),
            Auth::ShopCredential { shop_id, .. } => f
                .debug_struct("ShopCredential")
                .field("shop_id", shop_id)
                .finish_non_exhaustive(),
        }
    }
}

// --- Клиент YooKassa ---

#[derive(Clone, Debug)]
pub struct YooKassaClient {
    client: ReqwestClient,
    auth: Auth,
    base_url: String,
}

impl YooKassaClient {
    /// Создает новый клиент YooKassa API.
    ///
    /// # Arguments
    ///
    /// * `auth` - Способ авторизации.
    /// * `timeout` - Ограничение на время одного запроса.
    pub fn new(auth: Auth, timeout: Duration) -> Result<Self, YooKassaError> {
        Ok(YooKassaClient {
            client: ReqwestClient::builder().timeout(timeout).build()?,
            auth,
            base_url: YOOKASSA_API_BASE_URL.to_string(),
        })
    }

    /// Клиент с OAuth токеном, прочитанным из хранилища в момент вызова.
    pub async fn from_store<S: Store + ?Sized>(
        client_id: String,
        store: &S,
        timeout: Duration,
    ) -> Result<Self, YooKassaError> {
        let token = store.access_token().await?.ok_or_else(|| {
            YooKassaError::Config("OAuth токен еще не получен, пройдите авторизацию".to_string())
        })?;
        Self::new(
            Auth::BearerComposite {
                client_id,
                token: SecretString::from(token),
            },
            timeout,
        )
    }

    /// Устанавливает кастомный базовый URL (для тестирования или прокси).
    pub fn set_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    // Внутренний метод для отправки запросов
    pub(crate) async fn send_request<T: Serialize>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&T>,
        idempotency_key_required: bool,
    ) -> Result<Response, YooKassaError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        // Ключ идемпотентности новый на каждый вызов
        if idempotency_key_required {
            let idempotency_key = Uuid::new_v4().to_string();
            headers.insert(
                IDEMPOTENCE_KEY_HEADER,
                HeaderValue::from_str(&idempotency_key)?,
            );
        }

        if let Some(value) = self.auth.bearer_header()? {
            headers.insert(AUTHORIZATION, value);
        }

        let mut request_builder = self.client.request(method.clone(), &url).headers(headers);
        if let Auth::ShopCredential {
            shop_id,
            secret_key,
        } = &self.auth
        {
            request_builder = request_builder.basic_auth(shop_id, Some(secret_key.expose_secret()));
        }

        if let Some(payload) = body {
            request_builder = request_builder.json(payload);
        }

        tracing::debug!(%method, %url, "запрос к YooKassa");
        let response = request_builder.send().await?;

        Ok(response)
    }

    // Внутренний метод для обработки ответа и парсинга JSON
    pub(crate) async fn process_response<R: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<R, YooKassaError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json::<R>().await?)
        } else {
            Err(api_error(response).await)
        }
    }

    /// Создает новый платеж.
    ///
    /// # Arguments
    ///
    /// * `request` - Данные для создания платежа.
    pub async fn create_payment(
        &self,
        request: &CreatePaymentRequest,
    ) -> Result<Payment, YooKassaError> {
        let response = self
            .send_request(Method::POST, "payments", Some(request), true)
            .await?;
        self.process_response(response).await
    }

    /// Получает информацию о конкретном платеже.
    pub async fn get_payment(&self, payment_id: &str) -> Result<Payment, YooKassaError> {
        let endpoint = format!("payments/{}", payment_id);
        let response = self
            .send_request::<()>(Method::GET, &endpoint, None, false)
            .await?;
        self.process_response(response).await
    }
}

/// Превращает неуспешный ответ в [`YooKassaError::ApiError`].
pub(crate) async fn api_error(response: Response) -> YooKassaError {
    let status = response.status();
    let body_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Не удалось прочитать тело ответа".to_string());
    // Пытаемся распарсить как ошибку API
    let error_details: Option<YooKassaApiError> = serde_json::from_str(&body_text).ok();
    tracing::warn!(
        %status,
        code = error_details.as_ref().map(|d| d.code.as_str()),
        "YooKassa вернула ошибку"
    );
    YooKassaError::ApiError {
        status,
        message: body_text,
        error_details,
    }
}
