//! Входящие HTTP точки: уведомления YooKassa и редирект OAuth.
//!
//! Уведомления и OAuth разнесены по разным маршрутам. На уведомление отвечаем
//! `200 OK` во всех случаях, кроме ошибки: любой другой ответ YooKassa считает
//! недоставкой и присылает уведомление повторно.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header::ACCEPT;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::error::YooKassaError;
use crate::notification::NotificationDispatcher;
use crate::oauth::{CallbackOutcome, CallbackQuery, OAuthExchange};

pub const NOTIFICATIONS_PATH: &str = "/yookassa/notifications";
pub const OAUTH_CALLBACK_PATH: &str = "/yookassa/oauth/callback";

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<NotificationDispatcher>,
    pub oauth: Arc<OAuthExchange>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(NOTIFICATIONS_PATH, post(notifications))
        .route(OAUTH_CALLBACK_PATH, get(oauth_callback))
        .with_state(state)
}

async fn notifications(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<StatusCode, YooKassaError> {
    let outcome = state.dispatcher.handle_notification(&body).await?;
    tracing::debug!(?outcome, "уведомление подтверждено");
    Ok(StatusCode::OK)
}

async fn oauth_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, YooKassaError> {
    match state.oauth.handle_callback(&query).await? {
        CallbackOutcome::NoCode => Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "missing_code" })),
        )
            .into_response()),
        CallbackOutcome::TokenStored if accepts_html(&headers) => {
            Ok(Html(CallbackOutcome::popup_close_html()).into_response())
        }
        CallbackOutcome::TokenStored => Ok(Json(json!({ "status": "ok" })).into_response()),
    }
}

// Браузер из всплывающего окна OAuth присылает Accept с text/html
fn accepts_html(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

impl YooKassaError {
    fn status_code(&self) -> StatusCode {
        match self {
            YooKassaError::Serde(_)
            | YooKassaError::MissingField(_)
            | YooKassaError::Validation(_) => StatusCode::BAD_REQUEST,
            YooKassaError::Config(_)
            | YooKassaError::Handler { .. }
            | YooKassaError::Store(_)
            | YooKassaError::UrlParse(_)
            | YooKassaError::InvalidHeaderValue(_) => StatusCode::INTERNAL_SERVER_ERROR,
            YooKassaError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            YooKassaError::Reqwest(_)
            | YooKassaError::ApiError { .. }
            | YooKassaError::TokenNotIssued => StatusCode::BAD_GATEWAY,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            YooKassaError::Config(_) => "config",
            YooKassaError::Reqwest(_) => "network",
            YooKassaError::Timeout(_) => "timeout",
            YooKassaError::Serde(_) | YooKassaError::MissingField(_) => "invalid_payload",
            YooKassaError::Validation(_) => "validation",
            YooKassaError::ApiError { .. } => "provider",
            YooKassaError::UrlParse(_) | YooKassaError::InvalidHeaderValue(_) => "internal",
            YooKassaError::TokenNotIssued => "token_not_issued",
            YooKassaError::Handler { .. } => "handler",
            YooKassaError::Store(_) => "store",
        }
    }
}

impl IntoResponse for YooKassaError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, %status, "запрос YooKassa завершился ошибкой");
        } else {
            tracing::warn!(error = %self, %status, "некорректный запрос YooKassa");
        }
        (status, Json(json!({ "error": self.code() }))).into_response()
    }
}
