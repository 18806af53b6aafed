//! Credential management for Bitfinex API authentication.

use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

use crate::error::BitfinexError;

const DEFAULT_KEY_VAR: &str = "BITFINEX_API_KEY";
const DEFAULT_SECRET_VAR: &str = "BITFINEX_API_SECRET";

/// API credentials containing the key and secret.
///
/// Credentials are validated on construction and immutable afterwards.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    api_secret: SecretString,
}

impl Credentials {
    /// Create new credentials from an API key and secret.
    ///
    /// Returns a configuration error if either value is empty.
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Result<Self, BitfinexError> {
        let api_key = api_key.into();
        let api_secret = api_secret.into();

        if api_key.trim().is_empty() {
            return Err(BitfinexError::Configuration(
                "API key must not be empty.".to_string(),
            ));
        }
        if api_secret.is_empty() {
            return Err(BitfinexError::Configuration(
                "API secret must not be empty.".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            api_secret: SecretString::from(api_secret),
        })
    }

    /// The API key (public identifier), verbatim.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Get the API secret for signing.
    ///
    /// This method exposes the secret - use carefully.
    pub fn expose_secret(&self) -> &str {
        self.api_secret.expose_secret()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

/// Trait for providing API credentials.
///
/// Implement this trait to customize how credentials are retrieved,
/// for example from a secrets manager.
pub trait CredentialsProvider: Send + Sync {
    /// Get the credentials.
    fn get_credentials(&self) -> &Credentials;
}

impl CredentialsProvider for Credentials {
    fn get_credentials(&self) -> &Credentials {
        self
    }
}

/// Static credentials provider that holds credentials directly.
#[derive(Clone, Debug)]
pub struct StaticCredentials {
    credentials: Credentials,
}

impl StaticCredentials {
    /// Create a new static credentials provider.
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Result<Self, BitfinexError> {
        Ok(Self {
            credentials: Credentials::new(api_key, api_secret)?,
        })
    }
}

impl CredentialsProvider for StaticCredentials {
    fn get_credentials(&self) -> &Credentials {
        &self.credentials
    }
}

impl CredentialsProvider for Arc<StaticCredentials> {
    fn get_credentials(&self) -> &Credentials {
        &self.credentials
    }
}

/// Credentials provider that reads from environment variables.
///
/// By default, reads from `BITFINEX_API_KEY` and `BITFINEX_API_SECRET`.
#[derive(Debug)]
pub struct EnvCredentials {
    credentials: Credentials,
}

impl EnvCredentials {
    /// Create credentials from default environment variables.
    pub fn from_env() -> Result<Self, BitfinexError> {
        Self::from_env_vars(DEFAULT_KEY_VAR, DEFAULT_SECRET_VAR)
    }

    /// Create credentials from custom environment variable names.
    pub fn from_env_vars(key_var: &str, secret_var: &str) -> Result<Self, BitfinexError> {
        let read = |var: &str| {
            std::env::var(var).map_err(|_| {
                BitfinexError::Configuration(format!("Environment variable {var} not set"))
            })
        };

        Ok(Self {
            credentials: Credentials::new(read(key_var)?, read(secret_var)?)?,
        })
    }

    /// Try to create credentials from default environment variables.
    ///
    /// Returns `None` if the variables are not set or hold invalid values.
    pub fn try_from_env() -> Option<Self> {
        Self::from_env().ok()
    }

    /// Try to create credentials from custom environment variable names.
    pub fn try_from_env_vars(key_var: &str, secret_var: &str) -> Option<Self> {
        Self::from_env_vars(key_var, secret_var).ok()
    }
}

impl CredentialsProvider for EnvCredentials {
    fn get_credentials(&self) -> &Credentials {
        &self.credentials
    }
}
