use serde::{Deserialize, Serialize};

/// The authenticated principal behind a request.
///
/// Only a successful credential check or a session lookup produces one, and
/// both fields are set at construction; there is no way to observe a
/// half-verified identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    idtag: String,
    username: String,
}

impl Identity {
    pub fn new(idtag: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            idtag: idtag.into(),
            username: username.into(),
        }
    }

    /// Stable identifier of the principal.
    pub fn idtag(&self) -> &str {
        &self.idtag
    }

    /// Display name of the principal.
    pub fn username(&self) -> &str {
        &self.username
    }
}
