use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ошибка, которую пользовательский обработчик может вернуть диспетчеру.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum YooKassaError {
    #[error("Ошибка конфигурации: {0}")]
    Config(String),

    #[error("Ошибка сети или HTTP запроса: {0}")]
    Reqwest(reqwest::Error),

    #[error("Превышено время ожидания ответа: {0}")]
    Timeout(String),

    #[error("Ошибка сериализации/десериализации JSON: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Ошибка API YooKassa (Статус: {status}): {message}")]
    ApiError {
        status: StatusCode,
        message: String,
        error_details: Option<YooKassaApiError>, // Детали ошибки от API
    },

    #[error("Неверный URL: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Неверное значение заголовка: {0}")]
    InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Неверные параметры: {0}")]
    Validation(String),

    #[error("Отсутствует обязательное поле: {0}")]
    MissingField(String),

    #[error("Токен не выдан, повторите авторизацию")]
    TokenNotIssued,

    #[error("Обработчик '{slot}' завершился с ошибкой: {source}")]
    Handler {
        slot: String,
        #[source]
        source: BoxError,
    },

    #[error("Ошибка хранилища: {0}")]
    Store(String),
}

// Таймауты выделяем в отдельный вид ошибки, остальное - ошибка транспорта
impl From<reqwest::Error> for YooKassaError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            YooKassaError::Timeout(err.to_string())
        } else {
            YooKassaError::Reqwest(err)
        }
    }
}

/// Классификация ошибок API по HTTP статусу.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    TooManyRequests,
    InternalServerError,
    Other,
}

impl ApiErrorKind {
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            400 => ApiErrorKind::BadRequest,
            401 => ApiErrorKind::Unauthorized,
            403 => ApiErrorKind::Forbidden,
            404 => ApiErrorKind::NotFound,
            429 => ApiErrorKind::TooManyRequests,
            500..=599 => ApiErrorKind::InternalServerError,
            _ => ApiErrorKind::Other,
        }
    }
}

impl YooKassaError {
    /// Вид ошибки API, если это ответ YooKassa с кодом ошибки.
    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        match self {
            YooKassaError::ApiError { status, .. } => Some(ApiErrorKind::from_status(*status)),
            _ => None,
        }
    }

    /// Временная ли это ошибка. Повторы этот слой не делает, решение за вызывающим.
    pub fn is_retryable(&self) -> bool {
        match self {
            YooKassaError::Timeout(_) => true,
            YooKassaError::Reqwest(err) => err.is_connect(),
            YooKassaError::ApiError { .. } => matches!(
                self.api_kind(),
                Some(ApiErrorKind::TooManyRequests | ApiErrorKind::InternalServerError)
            ),
            _ => false,
        }
    }
}

// Структура для парсинга тела ошибки от API YooKassa (если оно есть)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct YooKassaApiError {
    #[serde(rename = "type")]
    pub error_type: String, // Например, "error"
    pub id: String,          // Уникальный идентификатор ошибки
    pub code: String,        // Код ошибки (например, "invalid_request")
    pub description: String, // Описание ошибки для разработчика
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>, // Параметр, вызвавший ошибку
}
