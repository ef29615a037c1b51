use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use kilroy_core::prelude::{AuthError, Identity, SessionStore};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "kilroy.sid";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The pickled identity.
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

/// Session records kept client-side as signed tokens.
///
/// The token is a JWT signed with the cookie-signing secret whose subject is
/// the serialized [`Identity`]. Nothing is stored server-side; a session ends
/// when its `exp` passes.
#[derive(Clone)]
pub struct CookieSessionStore {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

fn now_secs() -> Result<u64, AuthError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| AuthError::Session(e.to_string()))
}

impl CookieSessionStore {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn mint(&self, identity: &Identity) -> Result<String, AuthError> {
        let issued_at = now_secs()?;
        let pickled =
            serde_json::to_string(identity).map_err(|e| AuthError::Session(e.to_string()))?;
        let claims = Claims {
            sub: pickled,
            iat: issued_at as usize,
            exp: (issued_at + self.ttl.as_secs()) as usize,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Session(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|_| AuthError::InvalidToken)?;

        serde_json::from_str(&token_data.claims.sub).map_err(|_| AuthError::InvalidToken)
    }
}

impl SessionStore for CookieSessionStore {
    async fn load(&self, token: &str) -> Result<Option<Identity>, AuthError> {
        match self.verify(token) {
            Ok(identity) => Ok(Some(identity)),
            Err(AuthError::InvalidToken) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn bind(&self, identity: &Identity) -> Result<String, AuthError> {
        self.mint(identity)
    }
}
