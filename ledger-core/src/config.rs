//! Configuration management
//!
//! Settings are read from an optional `settings.json`:
//! ```json
//! {
//!   "server": { "listenAddr": "127.0.0.1:3000", "requestTimeoutSecs": 30 },
//!   "database": { "path": "ledger.duckdb" },
//!   "auth": { "jwtSecret": "...", "tokenTtlSecs": 3600 },
//!   "ledger": { "overdraft": "deny" }
//! }
//! ```
//! and then overridden from `LEDGER_*` environment variables. The resulting
//! [`Config`] is passed explicitly to everything that needs it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};
use crate::domain::OverdraftPolicy;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const ENV_JWT_SECRET: &str = "LEDGER_JWT_SECRET";
pub const ENV_DATABASE: &str = "LEDGER_DATABASE";
pub const ENV_LISTEN_ADDR: &str = "LEDGER_LISTEN_ADDR";
pub const ENV_OVERDRAFT: &str = "LEDGER_OVERDRAFT";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    server: ServerSettings,
    #[serde(default)]
    database: DatabaseSettings,
    #[serde(default)]
    auth: AuthSettings,
    #[serde(default)]
    ledger: LedgerSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    listen_addr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatabaseSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    jwt_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerSettings {
    #[serde(default)]
    overdraft: OverdraftPolicy,
}

/// Ledger configuration
#[derive(Clone)]
pub struct Config {
    pub listen_addr: String,
    /// `None` runs against an in-memory database
    pub database_path: Option<PathBuf>,
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    pub request_timeout_secs: u64,
    pub overdraft: OverdraftPolicy,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            database_path: None,
            jwt_secret: String::new(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            overdraft: OverdraftPolicy::default(),
            _raw_settings: SettingsFile::default(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("listen_addr", &self.listen_addr)
            .field("database_path", &self.database_path)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("overdraft", &self.overdraft)
            .finish()
    }
}

impl Config {
    /// Load config from a settings file (if present), then apply
    /// `LEDGER_*` environment overrides
    pub fn load(settings_path: &Path) -> Result<Self> {
        let mut config = Self::from_file(settings_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load config from a settings file only; a missing file yields defaults
    pub fn from_file(settings_path: &Path) -> Result<Self> {
        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(settings_path)?;
            serde_json::from_str(&content)
                .map_err(|e| Error::Config(format!("{}: {}", settings_path.display(), e)))?
        } else {
            SettingsFile::default()
        };

        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: SettingsFile) -> Self {
        let defaults = Self::default();
        Self {
            listen_addr: raw
                .server
                .listen_addr
                .clone()
                .unwrap_or(defaults.listen_addr),
            database_path: raw.database.path.clone(),
            jwt_secret: raw.auth.jwt_secret.clone().unwrap_or_default(),
            token_ttl_secs: raw.auth.token_ttl_secs.unwrap_or(defaults.token_ttl_secs),
            request_timeout_secs: raw
                .server
                .request_timeout_secs
                .unwrap_or(defaults.request_timeout_secs),
            overdraft: raw.ledger.overdraft,
            _raw_settings: raw,
        }
    }

    /// Apply overrides from an environment-like lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup(ENV_JWT_SECRET) {
            self.jwt_secret = secret;
        }
        if let Some(path) = lookup(ENV_DATABASE).filter(|p| !p.is_empty()) {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(addr) = lookup(ENV_LISTEN_ADDR).filter(|a| !a.is_empty()) {
            self.listen_addr = addr;
        }
        if let Some(policy) = lookup(ENV_OVERDRAFT) {
            self.overdraft = policy.parse()?;
        }
        Ok(())
    }

    /// Check the settings required to serve requests
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(Error::Config(format!(
                "no token secret configured (set auth.jwtSecret or {})",
                ENV_JWT_SECRET
            )));
        }
        if self.token_ttl_secs == 0 {
            return Err(Error::Config("token ttl must be positive".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config("request timeout must be positive".to_string()));
        }
        Ok(())
    }

    /// Save config to a settings file
    /// Preserves other settings this crate doesn't manage
    pub fn save(&self, settings_path: &Path) -> Result<()> {
        let mut settings = self._raw_settings.clone();

        settings.server.listen_addr = Some(self.listen_addr.clone());
        settings.server.request_timeout_secs = Some(self.request_timeout_secs);
        settings.database.path = self.database_path.clone();
        settings.auth.token_ttl_secs = Some(self.token_ttl_secs);
        settings.ledger.overdraft = self.overdraft;
        // auth.jwtSecret is left as read; secrets from the environment are not persisted

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(settings_path, content)?;
        Ok(())
    }
}
