//! Настройки интеграции из переменных окружения.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::YooKassaError;

// --- Константы ---
pub const YOOKASSA_API_BASE_URL: &str = "https://api.yookassa.ru/v3/";
pub const YOOKASSA_OAUTH_TOKEN_URL: &str = "https://yookassa.ru/oauth/v2/token";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Все значения необязательны при загрузке: отсутствие ключа
/// проверяет та операция, которой он нужен.
#[derive(Debug, Clone)]
pub struct Settings {
    pub shop_id: Option<String>,
    pub secret_key: Option<SecretString>,
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub return_url: Option<String>,
    pub api_url: String,
    pub oauth_token_url: String,
    pub http_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            shop_id: None,
            secret_key: None,
            client_id: None,
            client_secret: None,
            return_url: None,
            api_url: YOOKASSA_API_BASE_URL.to_string(),
            oauth_token_url: YOOKASSA_OAUTH_TOKEN_URL.to_string(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl Settings {
    /// Читает настройки из окружения, предварительно подхватив `.env`, если он есть.
    pub fn from_env() -> Result<Self, YooKassaError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Читает настройки через произвольный источник ключей.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, YooKassaError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Пустая строка в окружении равносильна отсутствию значения
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let defaults = Settings::default();
        let api_url = get("YOOKASSA_API_URL").unwrap_or(defaults.api_url);
        let oauth_token_url = get("YOOKASSA_OAUTH_TOKEN_URL").unwrap_or(defaults.oauth_token_url);
        Url::parse(&api_url)?;
        Url::parse(&oauth_token_url)?;

        let return_url = get("YOOKASSA_RETURN_URL");
        if let Some(url) = &return_url {
            Url::parse(url)?;
        }

        let http_timeout = match get("YOOKASSA_HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.parse().map_err(|_| {
                YooKassaError::Config(format!("YOOKASSA_HTTP_TIMEOUT_SECS: неверное значение '{raw}'"))
            })?),
            None => defaults.http_timeout,
        };

        Ok(Settings {
            shop_id: get("YOOKASSA_SHOP_ID"),
            secret_key: get("YOOKASSA_SECRET_KEY").map(SecretString::from),
            client_id: get("YOOKASSA_CLIENT_ID"),
            client_secret: get("YOOKASSA_CLIENT_SECRET").map(SecretString::from),
            return_url,
            api_url,
            oauth_token_url,
            http_timeout,
        })
    }

    /// Пара client_id / client_secret для OAuth.
    pub fn oauth_credentials(&self) -> Result<(String, SecretString), YooKassaError> {
        let client_id = require(self.client_id.clone(), "YOOKASSA_CLIENT_ID")?;
        let client_secret = require(self.client_secret.clone(), "YOOKASSA_CLIENT_SECRET")?;
        Ok((client_id, client_secret))
    }

    /// Пара shop_id / secret_key магазина.
    pub fn shop_credentials(&self) -> Result<(String, SecretString), YooKassaError> {
        let shop_id = require(self.shop_id.clone(), "YOOKASSA_SHOP_ID")?;
        let secret_key = require(self.secret_key.clone(), "YOOKASSA_SECRET_KEY")?;
        Ok((shop_id, secret_key))
    }
}

pub(crate) fn require<T>(value: Option<T>, key: &str) -> Result<T, YooKassaError> {
    value.ok_or_else(|| YooKassaError::Config(format!("{key} не задан")))
}
