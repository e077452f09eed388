//! Persistent key-value option storage.
//!
//! Both singletons (the breaking-news slot and the display options) live
//! here as JSON values. There is no cross-key transaction: two concurrent
//! writers of the same key are last-write-wins, except for clears that go
//! through [`OptionStore::compare_and_set`].

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use sqlx::PgPool;

use super::StoreError;

#[async_trait]
pub trait OptionStore: Send + Sync {
    /// Raw stored value for `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the value stored under `key`.
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Replace the value under `key` only if it currently equals `expected`.
    /// Returns whether the write happened.
    async fn compare_and_set(
        &self,
        key: &str,
        expected: &Value,
        value: Value,
    ) -> Result<bool, StoreError>;
}

/// Load `key` as `T`, falling back to `T::default()` when it was never
/// written.
pub async fn load<T>(store: &dyn OptionStore, key: &str) -> Result<T, StoreError>
where
    T: DeserializeOwned + Default,
{
    match store.get(key).await? {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Ok(T::default()),
    }
}

/// Like [`load`], but also hands back the stored value as read, for a later
/// [`OptionStore::compare_and_set`].
pub async fn load_raw<T>(store: &dyn OptionStore, key: &str) -> Result<(Option<Value>, T), StoreError>
where
    T: DeserializeOwned + Default,
{
    let raw = store.get(key).await?;
    let value = match &raw {
        Some(value) => serde_json::from_value(value.clone())?,
        None => T::default(),
    };
    Ok((raw, value))
}

pub async fn save<T>(store: &dyn OptionStore, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + Sync,
{
    store.set(key, serde_json::to_value(value)?).await
}

// ============================================================================
// PostgreSQL
// ============================================================================

pub struct PgOptionStore {
    pool: PgPool,
}

impl PgOptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OptionStore for PgOptionStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let value: Option<Value> =
            sqlx::query_scalar("SELECT value FROM options WHERE name = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO options (name, value)
               VALUES ($1, $2)
               ON CONFLICT (name) DO UPDATE SET
                   value = EXCLUDED.value,
                   updated_at = NOW()"#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: &Value,
        value: Value,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE options SET value = $3, updated_at = NOW() WHERE name = $1 AND value = $2",
        )
        .bind(key)
        .bind(expected)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

// ============================================================================
// In-memory (tests, local runs)
// ============================================================================

#[derive(Default)]
pub struct MemoryOptionStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryOptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OptionStore for MemoryOptionStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value);
        Ok(())
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: &Value,
        value: Value,
    ) -> Result<bool, StoreError> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        match values.get_mut(key) {
            Some(current) if current == expected => {
                *current = value;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
