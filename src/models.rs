use serde::{Deserialize, Serialize};

// --- Модели данных (Запросы и Ответы) ---

// Сумма
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Amount {
    pub value: String,    // Сумма в виде строки (например, "100.00")
    pub currency: String, // Код валюты (например, "RUB")
}

// Данные для подтверждения платежа (в запросе)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConfirmationRequest {
    #[serde(rename = "type")]
    pub confirmation_type: String, // Тип подтверждения ("redirect")
    pub return_url: String, // URL для возврата пользователя
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>, // Язык интерфейса платежной формы (ru_RU, en_US)
}

impl ConfirmationRequest {
    pub fn redirect(return_url: impl Into<String>) -> Self {
        ConfirmationRequest {
            confirmation_type: "redirect".to_string(),
            return_url: return_url.into(),
            locale: None,
        }
    }
}

// Запрос на создание платежа
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreatePaymentRequest {
    pub amount: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<ConfirmationRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture: Option<bool>, // true для одностадийной оплаты
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>, // Сюда кладется uniq_id для сопоставления уведомлений
}

// --- Структуры ответа API ---

// Статус платежа
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    WaitingForCapture,
    Succeeded,
    Canceled,
}

// Детали подтверждения (в ответе)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConfirmationResponse {
    #[serde(rename = "type")]
    pub confirmation_type: String, // "redirect", "external", "qr", "embedded", "mobile_application"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_url: Option<String>, // URL для редиректа пользователя
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
}

// Получатель платежа
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Recipient {
    pub account_id: String,
    pub gateway_id: String,
}

// Способ оплаты в ответе, подробности держим как есть
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PaymentMethod {
    #[serde(rename = "type")]
    pub payment_method_type: String, // "bank_card", "yoo_money", "sbp", etc.
    pub id: String,
    pub saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>, // "Bank card *4444"
}

// Детали отмены
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CancellationDetails {
    pub party: String,  // "yookassa", "merchant", "payment_network"
    pub reason: String, // "expired_on_confirmation", "payment_rejected", etc.
}

// Объект платежа (ответ API и тело уведомления)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Payment {
    pub id: String,
    pub status: PaymentStatus,
    pub amount: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub income_amount: Option<Amount>, // Сумма за вычетом комиссии
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<Recipient>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<String>, // ISO 8601 timestamp
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<ConfirmationResponse>,
    #[serde(default)]
    pub test: bool,
    #[serde(default)]
    pub paid: bool, // true если status = succeeded или waiting_for_capture
    #[serde(default)]
    pub refundable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_details: Option<CancellationDetails>,
}

impl Payment {
    /// Идентификатор корреляции, переданный при создании платежа.
    pub fn uniq_id(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("uniq_id"))
            .and_then(|v| v.as_str())
    }

    /// URL, на который нужно перенаправить пользователя для оплаты.
    pub fn confirmation_url(&self) -> Option<&str> {
        self.confirmation
            .as_ref()
            .and_then(|c| c.confirmation_url.as_deref())
    }
}

// --- Вебхуки ---

// Событие, на которое оформляется подписка
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NotificationEventType {
    #[serde(rename = "payment.waiting_for_capture")]
    PaymentWaitingForCapture,
    #[default]
    #[serde(rename = "payment.succeeded")]
    PaymentSucceeded,
    #[serde(rename = "payment.canceled")]
    PaymentCanceled,
    #[serde(rename = "refund.succeeded")]
    RefundSucceeded,
    #[serde(rename = "payout.succeeded")]
    PayoutSucceeded,
    #[serde(rename = "payout.canceled")]
    PayoutCanceled,
    #[serde(rename = "deal.closed")]
    DealClosed,
}

// Запрос на создание вебхука
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateWebhookRequest {
    pub event: NotificationEventType,
    pub url: String,
}

// Вебхук (ответ)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Webhook {
    pub id: String,
    pub event: NotificationEventType,
    pub url: String,
}

// Список вебхуков (ответ)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WebhookList {
    #[serde(rename = "type")]
    pub list_type: String, // "list"
    pub items: Vec<Webhook>,
}
