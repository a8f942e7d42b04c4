/// Transient states surfaced to whatever hosts the agent. Interactive
/// pushes report all of them; guard-skipped and beacon pushes stay silent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Syncing,
    Synced,
    Failed(String),
    SignInRequired,
}

pub trait StatusListener: Send + Sync {
    fn on_status(&self, status: SyncStatus);
}

/// Default listener for headless hosts.
pub struct NullStatusListener;

impl StatusListener for NullStatusListener {
    fn on_status(&self, _status: SyncStatus) {}
}

/// Listener that logs status transitions, used by the CLI host.
pub struct LogStatusListener;

impl StatusListener for LogStatusListener {
    fn on_status(&self, status: SyncStatus) {
        match status {
            SyncStatus::Syncing => tracing::info!("Syncing..."),
            SyncStatus::Synced => tracing::info!("Synced!"),
            SyncStatus::Failed(message) => tracing::warn!("Sync failed: {}", message),
            SyncStatus::SignInRequired => tracing::warn!("Sign in first"),
        }
    }
}
