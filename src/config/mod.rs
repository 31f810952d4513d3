//! Run configuration: run modes, control-plane settings retrieved from the
//! secret store, and per-institution configuration records served by the
//! config service.

mod client;

use std::{fmt, path::PathBuf, str::FromStr};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
pub use client::{ConfigClient, ConfigFetchError};
use serde::Deserialize;
use thiserror::Error;

use crate::secrets::{SecretError, SecretStore};

/// Capability flag identifying institutions with the xAPI purge function
/// enabled on the config service.
pub const CAPABILITY_XAPI_ENABLED: &str = "function-uxapi-enabled";

/// Secret-store key holding the control-plane settings document.
pub const CONTROL_PLANE_SECRET: &str = "la_config";

/// How a given invocation selects institutions.
///
/// `interactive` and `testing` both target exactly one named institution.
/// `scheduled` passes run-mode validation but no institution ever matches
/// its gate, so the submission path never runs under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Interactive,
    Testing,
    Scheduled,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Interactive => "interactive",
            RunMode::Testing => "testing",
            RunMode::Scheduled => "scheduled",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unsupported run-mode string. Fatal before any institution is touched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid run mode {0:?}, expected one of: interactive, testing, scheduled")]
pub struct InvalidRunMode(pub String);

impl FromStr for RunMode {
    type Err = InvalidRunMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "interactive" => Ok(RunMode::Interactive),
            "testing" => Ok(RunMode::Testing),
            "scheduled" => Ok(RunMode::Scheduled),
            other => Err(InvalidRunMode(other.to_string())),
        }
    }
}

/// Immutable per-process run context built from command-line arguments.
#[derive(Debug, Clone)]
pub struct RunContext {
    mode: RunMode,
    institution: Option<String>,
}

impl RunContext {
    /// Validate the raw run-mode string and build the context.
    pub fn new(run_mode: &str, institution: Option<String>) -> Result<Self, InvalidRunMode> {
        Ok(Self {
            mode: run_mode.parse()?,
            institution,
        })
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Whether an institution with the given short name is in scope for
    /// this invocation.
    pub fn should_process(&self, short_name: &str) -> bool {
        matches!(self.mode, RunMode::Interactive | RunMode::Testing)
            && self.institution.as_deref() == Some(short_name)
    }
}

/// Basic-auth credentials for the store, config service, or event service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// `Authorization` header value: base64 of `username:password`.
    pub fn basic_auth_header(&self) -> String {
        let token = BASE64.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {token}")
    }
}

/// Control-plane settings loaded from the secret store as a JSON document.
#[derive(Debug, Clone, Deserialize)]
pub struct ControlPlaneConfig {
    /// Config-service base URL, with trailing slash (paths are appended).
    pub api_base: String,
    /// Config-service / event-service username.
    pub username: String,
    /// Config-service / event-service password.
    pub password: String,
    /// Event-service endpoint; query parameters are appended.
    pub postevent: String,
    /// Base URL of the statement store holding the deletable records.
    #[serde(default = "default_store_base")]
    pub store_base: String,
    /// Per-request timeout for every outbound call.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_store_base() -> String {
    "https://jisc.learninglocker.net".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl ControlPlaneConfig {
    /// Load and parse the settings document from the secret store.
    pub async fn load(store: &dyn SecretStore, key: &str) -> Result<Self, SecretError> {
        let raw = store
            .get(key)
            .await?
            .ok_or_else(|| SecretError::NotFound(key.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| SecretError::Malformed(key.to_string(), e))
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.username, &self.password)
    }
}

/// Raw institution record as served by the config service. Every field is
/// optional on the wire; [`InstitutionRecord::validate`] produces the
/// required form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstitutionRecord {
    #[serde(rename = "uxapi-username")]
    pub xapi_username: Option<String>,
    #[serde(rename = "uxapi-password")]
    pub xapi_password: Option<String>,
    #[serde(rename = "gen-shortname")]
    pub short_name: Option<String>,
    #[serde(rename = "ladata-root")]
    pub data_root: Option<String>,
}

/// Institution configuration with all required fields present.
#[derive(Debug, Clone)]
pub struct InstitutionConfig {
    pub short_name: String,
    pub credentials: Credentials,
    pub data_root: PathBuf,
}

/// Missing required institution fields. Recoverable per institution: the
/// runner logs it and moves on to the next one.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("institution record is missing required field {field:?}")]
pub struct ConfigurationError {
    pub field: &'static str,
}

impl InstitutionRecord {
    /// Check all required fields are present and build the usable config.
    pub fn validate(&self) -> Result<InstitutionConfig, ConfigurationError> {
        let username = require(&self.xapi_username, "uxapi-username")?;
        let password = require(&self.xapi_password, "uxapi-password")?;
        let short_name = require(&self.short_name, "gen-shortname")?;
        let data_root = require(&self.data_root, "ladata-root")?;

        Ok(InstitutionConfig {
            short_name,
            credentials: Credentials::new(username, password),
            data_root: PathBuf::from(data_root),
        })
    }
}

fn require(
    value: &Option<String>,
    field: &'static str,
) -> Result<String, ConfigurationError> {
    value.clone().ok_or(ConfigurationError { field })
}
