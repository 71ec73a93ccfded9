//! Хранилище ключ-значение для OAuth токена и отметок об обработанных уведомлениях.
//!
//! Бэкенд подменяемый: в тестах и однопроцессных установках хватает
//! [`InMemoryStore`], для нескольких процессов нужна своя реализация [`Store`]
//! поверх общего кэша.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::YooKassaError;

/// Ключ, под которым лежит текущий токен доступа.
pub const TOKEN_KEY: &str = "yookassa_token";

/// Хранилище строковых значений. Запись перезаписывает значение целиком
/// (побеждает последний писатель).
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, YooKassaError>;

    async fn set(&self, key: &str, value: String) -> Result<(), YooKassaError>;

    /// Записывает значение, только если ключа еще нет. Проверка и запись
    /// атомарны: из нескольких одновременных вызовов `true` получает один.
    async fn set_if_absent(&self, key: &str, value: String) -> Result<bool, YooKassaError>;

    async fn remove(&self, key: &str) -> Result<(), YooKassaError>;
}

#[async_trait]
impl<S: Store + ?Sized> Store for Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<String>, YooKassaError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), YooKassaError> {
        (**self).set(key, value).await
    }

    async fn set_if_absent(&self, key: &str, value: String) -> Result<bool, YooKassaError> {
        (**self).set_if_absent(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), YooKassaError> {
        (**self).remove(key).await
    }
}

/// Работа с токеном доступа поверх любого [`Store`].
#[async_trait]
pub trait StoreExt: Store {
    async fn access_token(&self) -> Result<Option<String>, YooKassaError> {
        self.get(TOKEN_KEY).await
    }

    async fn save_access_token(&self, token: String) -> Result<(), YooKassaError> {
        self.set(TOKEN_KEY, token).await
    }
}

impl<S: Store + ?Sized> StoreExt for S {}

/// Хранилище в памяти процесса.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, YooKassaError> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), YooKassaError> {
        self.inner.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: String) -> Result<bool, YooKassaError> {
        let mut inner = self.inner.write().await;
        if inner.contains_key(key) {
            return Ok(false);
        }
        inner.insert(key.to_string(), value);
        Ok(true)
    }

    async fn remove(&self, key: &str) -> Result<(), YooKassaError> {
        self.inner.write().await.remove(key);
        Ok(())
    }
}
