//! Backend settings stored in choirconfig
//!
//! ```no_run
//! use choirbackend::BackendConfigExt;
//! use choirconfig::get_config;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = get_config();
//! config.set_backend_url("https://project.example.co")?;
//! config.set_backend_access_token("user-session-jwt")?;
//! println!("Backend: {}", config.get_backend_url()?);
//! # Ok(())
//! # }
//! ```
//!
//! The session token is written encrypted (`encrypted:...`) and decrypted
//! transparently on read. Plain tokens edited by hand are accepted.

use crate::client::{DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use anyhow::Result;
use choirconfig::{encryption, Config};
use serde_yaml::{Number, Value};

const URL_PATH: &[&str] = &["backend", "url"];
const ANON_KEY_PATH: &[&str] = &["backend", "anon_key"];
const ACCESS_TOKEN_PATH: &[&str] = &["backend", "access_token"];
const TIMEOUT_PATH: &[&str] = &["backend", "request_timeout_secs"];

/// Extension trait adding the backend settings to `choirconfig::Config`
pub trait BackendConfigExt {
    /// Base URL of the backend (default: local development stack)
    fn get_backend_url(&self) -> Result<String>;
    fn set_backend_url(&self, url: &str) -> Result<()>;

    /// Public API key sent as `apikey` on every request (may be empty)
    fn get_backend_anon_key(&self) -> Result<String>;
    fn set_backend_anon_key(&self, key: &str) -> Result<()>;

    /// Session token of the signed-in user, decrypted
    ///
    /// `None` when no session is stored.
    fn get_backend_access_token(&self) -> Result<Option<String>>;

    /// Stores the session token encrypted
    fn set_backend_access_token(&self, token: &str) -> Result<()>;

    /// Forgets the stored session token
    fn clear_backend_access_token(&self) -> Result<()>;

    /// Request timeout in seconds (default: 30)
    fn get_backend_timeout_secs(&self) -> Result<u64>;
    fn set_backend_timeout_secs(&self, secs: u64) -> Result<()>;
}

impl BackendConfigExt for Config {
    fn get_backend_url(&self) -> Result<String> {
        Ok(self
            .get_string(URL_PATH)?
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()))
    }

    fn set_backend_url(&self, url: &str) -> Result<()> {
        self.set_value(URL_PATH, Value::String(url.trim().to_string()))
    }

    fn get_backend_anon_key(&self) -> Result<String> {
        Ok(self.get_string(ANON_KEY_PATH)?.unwrap_or_default())
    }

    fn set_backend_anon_key(&self, key: &str) -> Result<()> {
        self.set_value(ANON_KEY_PATH, Value::String(key.to_string()))
    }

    fn get_backend_access_token(&self) -> Result<Option<String>> {
        match self.get_string(ACCESS_TOKEN_PATH)? {
            Some(stored) => Ok(Some(encryption::reveal_secret(&stored)?)),
            None => Ok(None),
        }
    }

    fn set_backend_access_token(&self, token: &str) -> Result<()> {
        let encrypted = encryption::encrypt_secret(token)?;
        self.set_value(ACCESS_TOKEN_PATH, Value::String(encrypted))
    }

    fn clear_backend_access_token(&self) -> Result<()> {
        self.set_value(ACCESS_TOKEN_PATH, Value::String(String::new()))
    }

    fn get_backend_timeout_secs(&self) -> Result<u64> {
        match self.get_value(TIMEOUT_PATH) {
            Ok(Value::Number(n)) => Ok(n.as_u64().unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)),
            _ => Ok(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    fn set_backend_timeout_secs(&self, secs: u64) -> Result<()> {
        self.set_value(TIMEOUT_PATH, Value::Number(Number::from(secs)))
    }
}
