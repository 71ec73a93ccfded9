//! Обмен OAuth кода авторизации на токен доступа.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client as ReqwestClient;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::client::api_error;
use crate::config::Settings;
use crate::error::YooKassaError;
use crate::store::{Store, StoreExt};

const POPUP_CLOSE_HTML: &str = "<script>window.close()</script>";

/// Параметры редиректа после авторизации.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

// Ответ OAuth сервера; кроме токена там бывают expires_in и прочее
#[derive(Deserialize, Debug)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// В запросе не было `code`, обмен не выполнялся.
    NoCode,
    /// Новый токен сохранен в хранилище.
    TokenStored,
}

impl CallbackOutcome {
    /// Страница, закрывающая всплывающее окно авторизации в браузере.
    pub fn popup_close_html() -> &'static str {
        POPUP_CLOSE_HTML
    }
}

pub struct OAuthExchange {
    http: ReqwestClient,
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    token_url: String,
    store: Arc<dyn Store>,
}

impl OAuthExchange {
    /// Учетные данные не проверяются здесь: их отсутствие - ошибка
    /// конкретного обмена, а не сборки обработчика.
    pub fn from_settings(settings: &Settings, store: Arc<dyn Store>) -> Result<Self, YooKassaError> {
        Ok(OAuthExchange {
            http: build_http(settings.http_timeout)?,
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            token_url: settings.oauth_token_url.clone(),
            store,
        })
    }

    pub async fn handle_callback(
        &self,
        query: &CallbackQuery,
    ) -> Result<CallbackOutcome, YooKassaError> {
        let Some(code) = query.code.as_deref() else {
            return Ok(CallbackOutcome::NoCode);
        };

        let client_id = self
            .client_id
            .as_deref()
            .ok_or_else(|| YooKassaError::Config("YOOKASSA_CLIENT_ID не задан".to_string()))?;
        let client_secret = self
            .client_secret
            .as_ref()
            .ok_or_else(|| YooKassaError::Config("YOOKASSA_CLIENT_SECRET не задан".to_string()))?;

        let form = TokenRequest {
            grant_type: "authorization_code",
            code,
            client_id,
            client_secret: client_secret.expose_secret(),
        };

        tracing::debug!(url = %self.token_url, client_id, "обмен кода авторизации на токен");
        let response = self.http.post(&self.token_url).form(&form).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let token: TokenResponse = response.json().await?;
        match token.access_token.filter(|t| !t.is_empty()) {
            Some(access_token) => {
                self.store.save_access_token(access_token).await?;
                tracing::info!(client_id, "OAuth токен YooKassa обновлен");
                Ok(CallbackOutcome::TokenStored)
            }
            None => {
                tracing::warn!(client_id, "OAuth сервер не выдал access_token");
                Err(YooKassaError::TokenNotIssued)
            }
        }
    }
}

fn build_http(timeout: Duration) -> Result<ReqwestClient, YooKassaError> {
    Ok(ReqwestClient::builder().timeout(timeout).build()?)
}
