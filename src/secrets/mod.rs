//! Secret retrieval for control-plane credentials.
//!
//! Supports two backends:
//! - Environment variables (default for deployed runs)
//! - In-memory (for testing)

use std::{collections::HashMap, sync::RwLock};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret not found: {0}")]
    NotFound(String),

    #[error("secret {0} is not valid JSON")]
    Malformed(String, #[source] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type SecretResult<T> = Result<T, SecretError>;

/// Trait for retrieving secrets (config-service credentials, etc.)
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Get a secret by key. Returns None if not found.
    async fn get(&self, key: &str) -> SecretResult<Option<String>>;
}

/// Environment-based secret store.
///
/// Keys are mapped to environment variable names by uppercasing and
/// replacing `-` with `_`, so `la_config` reads `LA_CONFIG`.
pub struct EnvSecretStore;

impl EnvSecretStore {
    pub fn new() -> Self {
        Self
    }

    fn env_name(key: &str) -> String {
        key.to_uppercase().replace('-', "_")
    }
}

impl Default for EnvSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn get(&self, key: &str) -> SecretResult<Option<String>> {
        Ok(std::env::var(Self::env_name(key)).ok())
    }
}

/// In-memory secret store (for testing only)
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self {
            secrets: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut secrets) = self.secrets.write() {
            secrets.insert(key.into(), value.into());
        }
    }
}

impl Default for MemorySecretStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, key: &str) -> SecretResult<Option<String>> {
        let secrets = self
            .secrets
            .read()
            .map_err(|_| SecretError::Internal("secret store lock poisoned".to_string()))?;
        Ok(secrets.get(key).cloned())
    }
}
