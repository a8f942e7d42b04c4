//! Client-side sync core: decides when a snapshot of an observed
//! conversation is pushed and carries it to the backend. The host (browser
//! extension, CLI) supplies a `ChangeCollector`, a `CredentialStore` and a
//! `StatusListener`; everything else lives here.

pub mod collector;
pub mod credentials;
pub mod executor;
pub mod fingerprint;
pub mod scheduler;
pub mod status;
pub mod transport;

pub use collector::{ChangeCollector, CollectError, FileCollector, Snapshot, SnapshotMessage};
pub use credentials::{CredentialStore, Credentials, FileCredentialStore, InMemoryCredentialStore};
pub use executor::{spawn, AgentHandle, AgentRequest, Executor};
pub use fingerprint::Fingerprint;
pub use scheduler::{
    Clock, SchedulerConfig, SkipReason, SourceEvent, SyncAttempt, SyncScheduler, SyncTrigger,
    SystemClock,
};
pub use status::{LogStatusListener, NullStatusListener, StatusListener, SyncStatus};
pub use transport::{AuthStatus, SyncOutcome, SyncTransport, TransportError};
