//! Configuration for authenticating against the Dedalus authorization server

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dedalus_dpop::DEFAULT_MIN_RSA_KEY_BITS;
use rsa::RsaPublicKey;

use crate::bootstrap::{
    bootstrap_dpop_auth_blocking_with_client, bootstrap_dpop_auth_with_client, DEFAULT_AS_URL,
};
use crate::encryption::{
    fetch_encryption_public_key_blocking_with_min_bits, fetch_encryption_public_key_with_min_bits,
};
use crate::error::{AuthError, EncryptionError};
use crate::handler::DPoPAuth;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "DEDALUS_API_KEY";

/// Environment variable overriding the authorization server URL
pub const AS_URL_ENV: &str = "DEDALUS_AS_URL";

/// Authentication configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Authorization server base URL
    #[serde(default = "default_as_url")]
    pub as_url: String,

    /// API key exchanged for DPoP-bound tokens
    pub api_key: String,

    /// Smallest RSA modulus accepted for credential encryption
    #[serde(default = "default_min_rsa_key_bits")]
    pub min_rsa_key_bits: usize,

    /// Timeout for requests to the authorization server
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_as_url() -> String {
    DEFAULT_AS_URL.to_string()
}

fn default_min_rsa_key_bits() -> usize {
    DEFAULT_MIN_RSA_KEY_BITS
}

fn default_http_timeout_secs() -> u64 {
    30
}

impl AuthConfig {
    /// Configuration for an API key against the production server
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            as_url: default_as_url(),
            api_key: api_key.into(),
            min_rsa_key_bits: default_min_rsa_key_bits(),
            http_timeout_secs: default_http_timeout_secs(),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key =
            std::env::var(API_KEY_ENV).map_err(|_| ConfigError::MissingEnvVar(API_KEY_ENV))?;

        let mut config = Self::new(api_key);
        if let Ok(as_url) = std::env::var(AS_URL_ENV) {
            config.as_url = as_url;
        }
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("~/.config"));
        config_dir.join("dedalus").join("auth.yaml")
    }

    /// Load from default locations (file first, then env)
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path();

        if config_path.exists() {
            Self::from_file(&config_path)
        } else {
            Self::from_env()
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Exchange the configured API key for a DPoP-bound token
    pub async fn bootstrap(&self) -> Result<DPoPAuth, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(self.http_timeout())
            .build()?;
        bootstrap_dpop_auth_with_client(&client, &self.api_key, &self.as_url).await
    }

    /// Blocking form of [`AuthConfig::bootstrap`]
    pub fn bootstrap_blocking(&self) -> Result<DPoPAuth, AuthError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.http_timeout())
            .build()?;
        bootstrap_dpop_auth_blocking_with_client(&client, &self.api_key, &self.as_url)
    }

    /// Fetch the credential encryption key, enforcing `min_rsa_key_bits`
    pub async fn fetch_encryption_key(
        &self,
        key_id: Option<&str>,
    ) -> Result<RsaPublicKey, EncryptionError> {
        let client = reqwest::Client::builder()
            .timeout(self.http_timeout())
            .build()?;
        fetch_encryption_public_key_with_min_bits(
            &client,
            &self.as_url,
            key_id,
            self.min_rsa_key_bits,
        )
        .await
    }

    /// Blocking form of [`AuthConfig::fetch_encryption_key`]
    pub fn fetch_encryption_key_blocking(
        &self,
        key_id: Option<&str>,
    ) -> Result<RsaPublicKey, EncryptionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.http_timeout())
            .build()?;
        fetch_encryption_public_key_blocking_with_min_bits(
            &client,
            &self.as_url,
            key_id,
            self.min_rsa_key_bits,
        )
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("as_url", &self.as_url)
            .field("api_key", &"[REDACTED]")
            .field("min_rsa_key_bits", &self.min_rsa_key_bits)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
