use crate::agent::collector::Snapshot;
use async_trait::async_trait;

/// What an interactive push resolves to on success.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub conversation_id: String,
}

#[derive(thiserror::Error, Debug, Clone)]
pub enum TransportError {
    #[error("not signed in: {0}")]
    Auth(String),
    #[error("rejected by the backend: {0}")]
    Validation(String),
    #[error("backend failure: {0}")]
    Server(String),
    #[error("network failure: {0}")]
    Network(String),
    #[error("agent executor is gone")]
    Closed,
}

#[derive(Debug, Clone)]
pub struct AuthStatus {
    pub is_authenticated: bool,
    pub backend_url: Option<String>,
}

/// The scheduler's view of the Transport Bridge.
///
/// Interactive and best-effort delivery are two named operations, not a
/// flag: `sync_conversation` awaits a structured result, while
/// `sync_conversation_beacon` is synchronous for the caller and guarantees
/// nothing. It exists so a page teardown can hand off a pending change
/// without suspending.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    async fn sync_conversation(&self, snapshot: Snapshot) -> Result<SyncOutcome, TransportError>;

    fn sync_conversation_beacon(&self, snapshot: Snapshot);

    async fn auth_status(&self) -> Result<AuthStatus, TransportError>;

    /// Whether the executor context is still there to talk to.
    fn is_alive(&self) -> bool;

    /// Drop stored credentials; the host re-prompts for sign-in.
    async fn logout(&self) -> Result<(), TransportError>;
}
