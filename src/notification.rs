//! Разбор входящих уведомлений YooKassa и вызов пользовательских обработчиков.
//!
//! Статус платежа из тела уведомления не считается окончательным: его
//! подтверждает [`PaymentStatusResolver`], и только после этого вызывается
//! обработчик из [`HandlerRegistry`] для слота `success` или `failed`.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::YooKassaClient;
use crate::error::{BoxError, YooKassaError};
use crate::models::{Amount, Payment, PaymentStatus};
use crate::store::Store;

const NOTIFICATION_TYPE: &str = "notification";

/// Исход платежа, он же имя слота обработчика.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Outcome {
    #[default]
    Success,
    Failed,
}

impl Outcome {
    pub fn slot(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failed => "failed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slot())
    }
}

impl FromStr for Outcome {
    type Err = YooKassaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Outcome::Success),
            "failed" => Ok(Outcome::Failed),
            other => Err(YooKassaError::Config(format!(
                "неизвестный слот обработчика '{other}'"
            ))),
        }
    }
}

/// Запись о заказе, к которому относится платеж.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    pub uniq_id: String,
    pub payment_id: String,
    pub amount: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Invoice {
    pub fn for_payment(uniq_id: &str, payment: &Payment) -> Self {
        Invoice {
            uniq_id: uniq_id.to_string(),
            payment_id: payment.id.clone(),
            amount: payment.amount.clone(),
            description: payment.description.clone(),
        }
    }
}

#[async_trait]
pub trait PaymentHandler: Send + Sync {
    async fn handle(&self, payment: &Payment, invoice: &Invoice) -> Result<(), BoxError>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F> PaymentHandler for FnHandler<F>
where
    F: Fn(&Payment, &Invoice) -> Result<(), BoxError> + Send + Sync,
{
    async fn handle(&self, payment: &Payment, invoice: &Invoice) -> Result<(), BoxError> {
        (self.0)(payment, invoice)
    }
}

/// Обработчики по исходам. Только поиск, перечисления нет.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<Outcome, Arc<dyn PaymentHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H: PaymentHandler + 'static>(mut self, outcome: Outcome, handler: H) -> Self {
        self.handlers.insert(outcome, Arc::new(handler));
        self
    }

    pub fn register_fn<F>(self, outcome: Outcome, handler: F) -> Self
    where
        F: Fn(&Payment, &Invoice) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.register(outcome, FnHandler(handler))
    }

    pub fn get(&self, outcome: Outcome) -> Option<Arc<dyn PaymentHandler>> {
        self.handlers.get(&outcome).cloned()
    }

    pub fn get_by_name(&self, slot: &str) -> Option<Arc<dyn PaymentHandler>> {
        slot.parse().ok().and_then(|outcome| self.get(outcome))
    }
}

/// Результат сверки платежа.
#[derive(Debug, Clone)]
pub enum Resolution {
    Succeeded { payment: Payment, invoice: Invoice },
    Failed { payment: Payment, invoice: Invoice },
    /// Платеж еще не завершен (pending, waiting_for_capture).
    Unsettled { payment: Payment },
}

#[async_trait]
pub trait PaymentStatusResolver: Send + Sync {
    /// Определяет по каноничной записи платежа, завершен ли он.
    async fn check_payment(
        &self,
        uniq_id: &str,
        notified: &Payment,
    ) -> Result<Resolution, YooKassaError>;
}

/// Сверка через повторный запрос платежа в API.
pub struct RemoteStatusResolver {
    client: YooKassaClient,
}

impl RemoteStatusResolver {
    pub fn new(client: YooKassaClient) -> Self {
        RemoteStatusResolver { client }
    }
}

#[async_trait]
impl PaymentStatusResolver for RemoteStatusResolver {
    async fn check_payment(
        &self,
        uniq_id: &str,
        notified: &Payment,
    ) -> Result<Resolution, YooKassaError> {
        let payment = self.client.get_payment(&notified.id).await?;
        if payment.uniq_id() != Some(uniq_id) {
            return Err(YooKassaError::MissingField(format!(
                "metadata.uniq_id платежа {} не совпадает с '{}'",
                payment.id, uniq_id
            )));
        }

        let invoice = Invoice::for_payment(uniq_id, &payment);
        Ok(match payment.status {
            PaymentStatus::Succeeded => Resolution::Succeeded { payment, invoice },
            PaymentStatus::Canceled => Resolution::Failed { payment, invoice },
            PaymentStatus::Pending | PaymentStatus::WaitingForCapture => {
                Resolution::Unsettled { payment }
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Тело не является уведомлением.
    Ignored,
    /// Уведомление без `metadata.uniq_id`: не относится к платежам шлюза.
    Uncorrelated,
    /// Платеж еще не в финальном статусе.
    Unsettled,
    NoHandler(Outcome),
    Handled(Outcome),
    /// Повторная доставка уже обработанного уведомления.
    Duplicate(Outcome),
}

pub struct NotificationDispatcher {
    resolver: Arc<dyn PaymentStatusResolver>,
    handlers: HandlerRegistry,
    store: Arc<dyn Store>,
}

impl NotificationDispatcher {
    pub fn new(
        resolver: Arc<dyn PaymentStatusResolver>,
        handlers: HandlerRegistry,
        store: Arc<dyn Store>,
    ) -> Self {
        NotificationDispatcher {
            resolver,
            handlers,
            store,
        }
    }

    pub async fn handle_notification(&self, body: &Value) -> Result<DispatchOutcome, YooKassaError> {
        if body.get("type").and_then(Value::as_str) != Some(NOTIFICATION_TYPE) {
            tracing::debug!("тело запроса не является уведомлением, пропускаем");
            return Ok(DispatchOutcome::Ignored);
        }

        let object = body
            .get("object")
            .ok_or_else(|| YooKassaError::MissingField("object".to_string()))?;
        let event = body.get("event").and_then(Value::as_str);

        // Возвраты и платежи, созданные в обход шлюза, метки не несут.
        // Подтверждаем их, иначе YooKassa будет слать их повторно.
        let Some(uniq_id) = object.pointer("/metadata/uniq_id").and_then(Value::as_str) else {
            let object_id = object.get("id").and_then(Value::as_str);
            tracing::warn!(event, object_id, "уведомление без metadata.uniq_id, пропускаем");
            return Ok(DispatchOutcome::Uncorrelated);
        };
        let uniq_id = uniq_id.to_string();
        let notified = Payment::deserialize(object)?;

        tracing::debug!(
            payment_id = %notified.id,
            uniq_id = %uniq_id,
            event,
            "получено уведомление"
        );

        let (outcome, payment, invoice) =
            match self.resolver.check_payment(&uniq_id, &notified).await? {
                Resolution::Succeeded { payment, invoice } => (Outcome::Success, payment, invoice),
                Resolution::Failed { payment, invoice } => (Outcome::Failed, payment, invoice),
                Resolution::Unsettled { payment } => {
                    tracing::info!(payment_id = %payment.id, status = ?payment.status, "платеж еще не завершен");
                    return Ok(DispatchOutcome::Unsettled);
                }
            };

        self.run_handler(outcome, &payment, &invoice).await
    }

    async fn run_handler(
        &self,
        outcome: Outcome,
        payment: &Payment,
        invoice: &Invoice,
    ) -> Result<DispatchOutcome, YooKassaError> {
        let Some(handler) = self.handlers.get(outcome) else {
            tracing::debug!(slot = %outcome, payment_id = %payment.id, "обработчик не зарегистрирован");
            return Ok(DispatchOutcome::NoHandler(outcome));
        };

        // Отметка ставится до вызова обработчика и снимается, если он не справился
        let processed_key = format!("yookassa_notification:{}:{}", payment.id, outcome);
        if !self
            .store
            .set_if_absent(&processed_key, invoice.uniq_id.clone())
            .await?
        {
            tracing::info!(slot = %outcome, payment_id = %payment.id, "уведомление уже обработано");
            return Ok(DispatchOutcome::Duplicate(outcome));
        }

        let result = AssertUnwindSafe(handler.handle(payment, invoice))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(panic_message(panic)));

        match result {
            Ok(()) => {
                tracing::info!(slot = %outcome, payment_id = %payment.id, uniq_id = %invoice.uniq_id, "обработчик выполнен");
                Ok(DispatchOutcome::Handled(outcome))
            }
            Err(source) => {
                tracing::error!(
                    slot = %outcome,
                    payment_id = %payment.id,
                    error = %source,
                    "ошибка в обработчике платежа"
                );
                if let Err(err) = self.store.remove(&processed_key).await {
                    tracing::error!(key = %processed_key, error = %err, "не удалось снять отметку об обработке");
                }
                Err(YooKassaError::Handler {
                    slot: outcome.slot().to_string(),
                    source,
                })
            }
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> BoxError {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "без сообщения".to_string());
    format!("паника в обработчике: {message}").into()
}
