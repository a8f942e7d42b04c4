use crate::agent::collector::ChangeCollector;
use crate::agent::fingerprint::Fingerprint;
use crate::agent::status::{StatusListener, SyncStatus};
use crate::agent::transport::{SyncOutcome, SyncTransport, TransportError};
use crate::configuration::SyncSettings;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// Scheduler tuning. All three windows are operator-configurable; the
/// defaults mirror the browser extension's.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub activity_debounce: Duration,
    pub periodic_interval: Duration,
    pub min_push_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            activity_debounce: Duration::from_secs(5),
            periodic_interval: Duration::from_secs(300),
            min_push_interval: Duration::from_secs(30),
        }
    }
}

impl From<&SyncSettings> for SchedulerConfig {
    fn from(settings: &SyncSettings) -> Self {
        Self {
            activity_debounce: Duration::from_secs(settings.activity_debounce_secs),
            periodic_interval: Duration::from_secs(settings.periodic_interval_secs),
            min_push_interval: Duration::from_secs(settings.min_push_interval_secs),
        }
    }
}

/// Injected time source so the min-interval guard is testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// What caused a push attempt. Only `Manual` bypasses the enabled and
/// min-interval guards, and only `Manual` surfaces failures to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    Activity,
    Periodic,
    Manual,
    Navigation,
    TabHidden,
    Teardown,
    Enabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    AlreadySyncing,
    TooSoon,
    TransportGone,
    NotAuthenticated,
    Unchanged,
    NothingToCollect,
}

/// Outcome of one guarded attempt; `Skipped` is the silent case.
#[derive(Debug)]
pub enum SyncAttempt {
    Pushed(SyncOutcome),
    Skipped(SkipReason),
    Failed(TransportError),
}

/// Events the host feeds into the scheduler's run loop: source activity,
/// SPA navigation, tab visibility, teardown, the manual sync button and the
/// auto-sync switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEvent {
    Activity,
    ManualSync,
    Navigated,
    VisibilityHidden,
    Teardown,
    SetEnabled(bool),
}

/// Decides *when* a snapshot is pushed.
///
/// One value per browsing context, owning all scheduler state; nothing here
/// is global. All mutation happens on the task driving it, so the
/// single-flight `syncing` flag is enough to prevent overlapping pushes
/// within this context. It intentionally promises nothing across contexts,
/// where the store's last-writer-wins reconciliation takes over.
pub struct SyncScheduler<T, C, K = SystemClock>
where
    T: SyncTransport,
    C: ChangeCollector,
    K: Clock,
{
    config: SchedulerConfig,
    transport: T,
    collector: C,
    clock: K,
    listener: Arc<dyn StatusListener>,
    enabled: bool,
    syncing: bool,
    last_push_at: Option<Instant>,
    last_fingerprint: Option<Fingerprint>,
}

impl<T, C> SyncScheduler<T, C, SystemClock>
where
    T: SyncTransport,
    C: ChangeCollector,
{
    pub fn new(
        config: SchedulerConfig,
        transport: T,
        collector: C,
        listener: Arc<dyn StatusListener>,
    ) -> Self {
        Self::with_clock(config, transport, collector, SystemClock, listener)
    }
}

impl<T, C, K> SyncScheduler<T, C, K>
where
    T: SyncTransport,
    C: ChangeCollector,
    K: Clock,
{
    pub fn with_clock(
        config: SchedulerConfig,
        transport: T,
        collector: C,
        clock: K,
        listener: Arc<dyn StatusListener>,
    ) -> Self {
        Self {
            config,
            transport,
            collector,
            clock,
            listener,
            enabled: false,
            syncing: false,
            last_push_at: None,
            last_fingerprint: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// A navigation lands on a different conversation; whatever we compared
    /// against before no longer applies.
    pub fn reset_fingerprint(&mut self) {
        self.last_fingerprint = None;
    }

    /// One guarded push attempt. Guard order matters and any failure wins:
    /// enabled (manual bypasses) → single-flight → min interval (manual
    /// bypasses) → live transport → authenticated → changed fingerprint.
    pub async fn sync(&mut self, trigger: SyncTrigger) -> SyncAttempt {
        let manual = trigger == SyncTrigger::Manual;

        if !self.enabled && !manual {
            return SyncAttempt::Skipped(SkipReason::Disabled);
        }

        if self.syncing {
            tracing::debug!("Already syncing, skipping {:?}", trigger);
            return SyncAttempt::Skipped(SkipReason::AlreadySyncing);
        }

        if !manual {
            if let Some(last) = self.last_push_at {
                if self.clock.now().duration_since(last) < self.config.min_push_interval {
                    tracing::debug!("Too soon since last push, skipping {:?}", trigger);
                    return SyncAttempt::Skipped(SkipReason::TooSoon);
                }
            }
        }

        if !self.transport.is_alive() {
            return SyncAttempt::Skipped(SkipReason::TransportGone);
        }

        let authenticated = match self.transport.auth_status().await {
            Ok(status) => status.is_authenticated,
            Err(_) => false,
        };
        if !authenticated {
            if manual {
                self.listener.on_status(SyncStatus::SignInRequired);
            }
            return SyncAttempt::Skipped(SkipReason::NotAuthenticated);
        }

        let snapshot = match self.collector.collect().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::debug!("Nothing to collect: {}", err);
                return SyncAttempt::Skipped(SkipReason::NothingToCollect);
            }
        };

        let fingerprint = Fingerprint::of(&snapshot);
        if self.last_fingerprint == Some(fingerprint) {
            tracing::debug!("No changes detected, skipping {:?}", trigger);
            return SyncAttempt::Skipped(SkipReason::Unchanged);
        }

        self.syncing = true;
        self.listener.on_status(SyncStatus::Syncing);
        let result = self.transport.sync_conversation(snapshot).await;
        self.syncing = false;

        match result {
            Ok(outcome) => {
                self.last_push_at = Some(self.clock.now());
                self.last_fingerprint = Some(fingerprint);
                self.listener.on_status(SyncStatus::Synced);
                SyncAttempt::Pushed(outcome)
            }
            Err(TransportError::Auth(message)) => {
                if manual {
                    // Cached credential is dead; force a fresh sign-in.
                    let _ = self.transport.logout().await;
                    self.listener.on_status(SyncStatus::SignInRequired);
                } else {
                    self.enabled = false;
                }
                SyncAttempt::Failed(TransportError::Auth(message))
            }
            Err(err) => {
                self.listener.on_status(SyncStatus::Failed(err.to_string()));
                SyncAttempt::Failed(err)
            }
        }
    }

    /// Teardown path: hand a pending change to the beacon and get out of the
    /// way. Never suspends on the transport and never updates scheduler
    /// state; if the beacon is lost, the next context's first push covers it.
    pub async fn teardown(&mut self) {
        if !self.enabled || self.syncing {
            return;
        }
        let snapshot = match self.collector.collect().await {
            Ok(snapshot) => snapshot,
            Err(_) => return,
        };
        if self.last_fingerprint != Some(Fingerprint::of(&snapshot)) {
            self.transport.sync_conversation_beacon(snapshot);
        }
    }

    /// Event loop for one browsing context: debounces activity, ticks the
    /// periodic timer, and consumes host events until teardown or channel
    /// close.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<SourceEvent>) {
        let mut periodic = tokio::time::interval(self.config.periodic_interval);
        periodic.set_missed_tick_behavior(MissedTickBehavior::Delay);
        periodic.tick().await; // consume the immediate first tick

        let debounce = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(debounce);
        let mut pending: Option<SyncTrigger> = None;

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    None => break,
                    Some(SourceEvent::Activity) => {
                        debounce.as_mut().reset(
                            tokio::time::Instant::now() + self.config.activity_debounce,
                        );
                        pending = Some(SyncTrigger::Activity);
                    }
                    Some(SourceEvent::Navigated) => {
                        self.reset_fingerprint();
                        debounce.as_mut().reset(
                            tokio::time::Instant::now() + self.config.activity_debounce,
                        );
                        pending = Some(SyncTrigger::Navigation);
                    }
                    Some(SourceEvent::ManualSync) => {
                        self.sync(SyncTrigger::Manual).await;
                    }
                    Some(SourceEvent::VisibilityHidden) => {
                        self.sync(SyncTrigger::TabHidden).await;
                    }
                    Some(SourceEvent::SetEnabled(enabled)) => {
                        self.set_enabled(enabled);
                        if enabled {
                            self.sync(SyncTrigger::Enabled).await;
                        } else {
                            pending = None;
                        }
                    }
                    Some(SourceEvent::Teardown) => {
                        self.teardown().await;
                        break;
                    }
                },
                _ = &mut debounce, if pending.is_some() => {
                    if let Some(trigger) = pending.take() {
                        self.sync(trigger).await;
                    }
                }
                _ = periodic.tick() => {
                    self.sync(SyncTrigger::Periodic).await;
                }
            }
        }
    }

    #[cfg(test)]
    fn force_syncing(&mut self) {
        self.syncing = true;
    }
}
