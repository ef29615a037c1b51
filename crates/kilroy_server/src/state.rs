use crate::auth::AuthorizationGate;
use kilroy_core::traits::{CredentialStrategy, SessionStore, StorageBackend};

#[derive(Clone)]
pub struct AppState<S, A, T>
where
    S: StorageBackend + Clone,
    A: CredentialStrategy + Clone,
    T: SessionStore + Clone,
{
    pub storage: S,
    pub gate: AuthorizationGate<A, T>,
}
