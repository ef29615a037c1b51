//! The built-in "basic" credential strategy.
//!
//! Knows exactly one account, the test user, whose password is a secret
//! supplied at startup.

use kilroy_core::prelude::*;
use std::sync::Arc;
use subtle::ConstantTimeEq;

pub const TEST_USERNAME: &str = "JS Kilroy";
pub const TEST_IDTAG: &str = "100007663687854";

/// Challenge reported back when credentials are missing or wrong.
pub const BASIC_CHALLENGE: &str = "Basic realm=\"Users\"";

#[derive(Clone)]
pub struct TestUserStrategy {
    password: Arc<str>,
}

impl TestUserStrategy {
    pub fn new(password: impl Into<Arc<str>>) -> Self {
        Self {
            password: password.into(),
        }
    }

    fn matches(&self, credentials: &Credentials) -> bool {
        let password_ok: bool = credentials
            .password
            .as_bytes()
            .ct_eq(self.password.as_bytes())
            .into();
        credentials.username == TEST_USERNAME && password_ok
    }
}

impl CredentialStrategy for TestUserStrategy {
    fn name(&self) -> &'static str {
        "basic"
    }

    async fn verify(&self, credentials: Option<Credentials>) -> Result<Verification, AuthError> {
        // No I/O happens here, but callers must not rely on the check
        // completing synchronously.
        tokio::task::yield_now().await;

        Ok(match credentials {
            Some(credentials) if self.matches(&credentials) => {
                Verification::accepted(Identity::new(TEST_IDTAG, credentials.username))
            }
            _ => Verification::rejected(ChallengeInfo::Flag(BASIC_CHALLENGE.to_string())),
        })
    }
}
