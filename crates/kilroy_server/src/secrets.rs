//! Secrets resolved once from the process environment at startup.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Signs session cookies.
pub const COOKIE_SIGNER: &str = "COOKIE_SIGNER";
/// Password of the built-in test user.
pub const TEST_USER_AUTH: &str = "TEST_USER_AUTH";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Please set environment variable: {0}")]
pub struct MissingSecret(pub &'static str);

/// Process-wide secrets. Read-only after construction.
#[derive(Clone)]
pub struct SecretStore {
    cookie_signer: Arc<str>,
    test_user_auth: Arc<str>,
}

impl SecretStore {
    pub fn new(cookie_signer: impl Into<Arc<str>>, test_user_auth: impl Into<Arc<str>>) -> Self {
        Self {
            cookie_signer: cookie_signer.into(),
            test_user_auth: test_user_auth.into(),
        }
    }

    /// Reads every required secret from the environment, failing on the first
    /// one that is unset or empty.
    pub fn from_env() -> Result<Self, MissingSecret> {
        Self::resolve(|key| std::env::var(key).ok())
    }

    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MissingSecret> {
        let secret = |key: &'static str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or(MissingSecret(key))
        };

        Ok(Self::new(secret(COOKIE_SIGNER)?, secret(TEST_USER_AUTH)?))
    }

    pub fn cookie_signer(&self) -> &str {
        &self.cookie_signer
    }

    pub fn test_user_auth(&self) -> &str {
        &self.test_user_auth
    }
}

impl fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretStore").finish_non_exhaustive()
    }
}
