use crate::error::*;
use crate::identity::Identity;
use crate::resource::Resource;

use bytes::Bytes;
use futures::stream::BoxStream;
use std::fmt;

/// An opened resource, ready to be streamed as a response body.
pub struct ResourceBody {
    pub len: u64,
    pub stream: BoxStream<'static, Result<Bytes, std::io::Error>>,
}

pub trait StorageBackend: Send + Sync + 'static + Clone {
    /// Opens a resource for streaming. A missing resource is `StorageError::NotFound`.
    fn open(
        &self,
        resource: &Resource,
    ) -> impl Future<Output = Result<ResourceBody, StorageError>> + Send;

    /// Persists `data`, returning `true` when the resource did not exist before.
    ///
    /// Mutable resources are fully overwritten. Immutable resources are never
    /// replaced: re-writing identical bytes is a no-op and different bytes are
    /// a `StorageError::Conflict`.
    fn write(
        &self,
        resource: &Resource,
        data: Bytes,
    ) -> impl Future<Output = Result<bool, StorageError>> + Send;

    /// Removes a resource, returning `true` if something was deleted.
    /// Deleting a missing resource is not an error.
    fn delete(&self, resource: &Resource) -> impl Future<Output = Result<bool, StorageError>> + Send;
}

/// A username/password pair presented with a single request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Side information a strategy hands back alongside its verdict.
///
/// Strategies are not consistent here: some give a structured message, some
/// a bare flag such as the challenge they would have sent, some nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChallengeInfo {
    #[default]
    None,
    Message {
        message: String,
    },
    Flag(String),
}

impl ChallengeInfo {
    /// The text a rejected client sees.
    ///
    /// Uses the structured message when there is one, then the stringified
    /// flag, then a generic text.
    pub fn rejection_message(&self) -> String {
        match self {
            ChallengeInfo::Message { message } if !message.is_empty() => message.clone(),
            ChallengeInfo::Flag(flag) if !flag.is_empty() => format!("Unauthorized: {flag}"),
            _ => "Unauthorized".to_string(),
        }
    }
}

/// The outcome of a credential check that did not fail outright.
/// No identity means the credentials were missing or wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub identity: Option<Identity>,
    pub info: ChallengeInfo,
}

impl Verification {
    pub fn accepted(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
            info: ChallengeInfo::None,
        }
    }

    pub fn rejected(info: ChallengeInfo) -> Self {
        Self {
            identity: None,
            info,
        }
    }
}

/// Per-request credential challenge.
pub trait CredentialStrategy: Send + Sync + 'static + Clone {
    /// Strategy name, used in logs.
    fn name(&self) -> &'static str;

    /// Checks the credentials carried by a request, if any.
    ///
    /// Wrong or missing credentials are an `Ok` verification without an
    /// identity; `Err` is reserved for failures of the machinery itself.
    fn verify(
        &self,
        credentials: Option<Credentials>,
    ) -> impl Future<Output = Result<Verification, AuthError>> + Send;
}

/// Maps client-held session tokens to identities.
///
/// Expiry is the store's own business.
pub trait SessionStore: Send + Sync + 'static + Clone {
    /// Resolves a token. Unknown, expired or forged tokens are `Ok(None)`.
    fn load(&self, token: &str) -> impl Future<Output = Result<Option<Identity>, AuthError>> + Send;

    /// Creates a session for `identity`, returning the token for the client.
    fn bind(&self, identity: &Identity) -> impl Future<Output = Result<String, AuthError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEvent<'a> {
    /// A request is being served on behalf of this identity.
    Acting(&'a Identity),
    /// A new session is about to be established for this identity.
    Login(&'a Identity),
}

pub trait AuditHook: Send + Sync + 'static {
    fn record(&self, event: AuditEvent<'_>);
}
