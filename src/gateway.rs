use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use crate::client::{Auth, YooKassaClient};
use crate::config::{Settings, require};
use crate::error::YooKassaError;
use crate::models::{Amount, ConfirmationRequest, CreatePaymentRequest, Payment};

/// Созданный платеж вместе с идентификатором корреляции,
/// который вернется в `metadata.uniq_id` уведомления.
#[derive(Debug, Clone)]
pub struct CreatedPayment {
    pub uniq_id: String,
    pub payment: Payment,
}

/// Прием платежей с авторизацией по магазину.
pub struct PaymentGateway {
    client: YooKassaClient,
    return_url: String,
}

impl PaymentGateway {
    pub fn new(client: YooKassaClient, return_url: String) -> Self {
        PaymentGateway { client, return_url }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, YooKassaError> {
        let (shop_id, secret_key) = settings.shop_credentials()?;
        let return_url = require(settings.return_url.clone(), "YOOKASSA_RETURN_URL")?;
        let client = YooKassaClient::new(
            Auth::ShopCredential {
                shop_id,
                secret_key,
            },
            settings.http_timeout,
        )?
        .set_base_url(settings.api_url.clone());
        Ok(Self::new(client, return_url))
    }

    pub fn client(&self) -> &YooKassaClient {
        &self.client
    }

    /// Создает одностадийный платеж с подтверждением через редирект.
    ///
    /// # Arguments
    ///
    /// * `sum` - Сумма, округляется до копеек.
    /// * `currency` - Код валюты (например, "RUB").
    /// * `description` - Описание для покупателя.
    pub async fn create_payment(
        &self,
        sum: Decimal,
        currency: &str,
        description: &str,
    ) -> Result<CreatedPayment, YooKassaError> {
        if sum <= Decimal::ZERO {
            return Err(YooKassaError::Validation(format!(
                "сумма платежа должна быть положительной, получено {sum}"
            )));
        }

        let uniq_id = Uuid::new_v4().to_string();
        let request = CreatePaymentRequest {
            amount: Amount {
                value: format_sum(sum),
                currency: currency.to_string(),
            },
            description: Some(description.to_string()),
            confirmation: Some(ConfirmationRequest::redirect(self.return_url.clone())),
            capture: Some(true),
            metadata: Some(json!({ "uniq_id": uniq_id })),
        };

        let payment = self.client.create_payment(&request).await?;
        tracing::info!(payment_id = %payment.id, uniq_id = %uniq_id, "платеж создан");
        Ok(CreatedPayment { uniq_id, payment })
    }
}

// YooKassa принимает сумму строкой с двумя знаками после точки
fn format_sum(sum: Decimal) -> String {
    let mut rounded = sum.round_dp(2);
    rounded.rescale(2);
    rounded.to_string()
}
