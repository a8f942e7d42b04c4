//! Standalone `chatvault-agent` CLI binary.
//!
//! Hosts the sync core outside a browser: an external capture step writes
//! snapshot JSON files, and this binary pushes them to the backend.
//!
//! ```text
//! chatvault-agent login --token <jwt> --backend-url https://api.example.com
//! chatvault-agent status
//! chatvault-agent push snapshot.json
//! chatvault-agent watch snapshot.json
//! chatvault-agent logout
//! ```

use anyhow::Context;
use chatvault::agent::{
    spawn, FileCollector, FileCredentialStore, LogStatusListener, SchedulerConfig, SourceEvent,
    SyncAttempt, SyncScheduler, SyncTransport, SyncTrigger,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(
    name = "chatvault-agent",
    version,
    about = "Push conversation snapshots to a ChatVault backend"
)]
struct Cli {
    /// Credential file (default: ~/.chatvault/credentials.json)
    #[arg(long, env = "CHATVAULT_CREDENTIALS", global = true)]
    credentials: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Store the bearer token handed over by the dashboard
    Login {
        #[arg(long)]
        token: String,
        /// Backend base URL, e.g. https://api.chatvault.example
        #[arg(long, env = "CHATVAULT_BACKEND_URL")]
        backend_url: String,
    },
    /// Drop the stored credential
    Logout,
    /// Show whether a credential is stored and for which backend
    Status,
    /// Push one snapshot file now (manual trigger)
    Push {
        /// Snapshot JSON file produced by the capture step
        file: PathBuf,
    },
    /// Keep watching a snapshot file and push on change
    Watch {
        file: PathBuf,
        /// Seconds of quiet after a change before pushing
        #[arg(long)]
        debounce_secs: Option<u64>,
        /// Periodic push interval in seconds
        #[arg(long)]
        interval_secs: Option<u64>,
        /// Minimum seconds between two pushes
        #[arg(long)]
        min_interval_secs: Option<u64>,
    },
}

fn default_credentials_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".chatvault").join("credentials.json")
}

async fn file_mtime(path: &Path) -> Option<std::time::SystemTime> {
    tokio::fs::metadata(path).await.ok()?.modified().ok()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let credentials_path = cli
        .credentials
        .clone()
        .unwrap_or_else(default_credentials_path);
    let handle = spawn(FileCredentialStore::new(credentials_path))
        .context("failed to start the agent executor")?;

    match cli.command {
        Commands::Login { token, backend_url } => {
            handle
                .set_auth_token(token, backend_url.clone())
                .await
                .context("failed to store credentials")?;
            println!("Connected to {}", backend_url);
        }
        Commands::Logout => {
            handle.logout().await.context("failed to clear credentials")?;
            println!("Signed out");
        }
        Commands::Status => {
            let status = handle
                .auth_status()
                .await
                .context("failed to query auth status")?;
            if status.is_authenticated {
                println!(
                    "Signed in (backend: {})",
                    status.backend_url.as_deref().unwrap_or("unknown")
                );
            } else {
                println!("Not signed in");
            }
        }
        Commands::Push { file } => {
            let mut scheduler = SyncScheduler::new(
                SchedulerConfig::default(),
                handle.clone(),
                FileCollector::new(&file),
                Arc::new(LogStatusListener),
            );
            match scheduler.sync(SyncTrigger::Manual).await {
                SyncAttempt::Pushed(outcome) => {
                    println!("Synced as conversation {}", outcome.conversation_id);
                }
                SyncAttempt::Skipped(reason) => {
                    println!("Skipped: {:?}", reason);
                }
                SyncAttempt::Failed(err) => {
                    anyhow::bail!("sync failed: {}", err);
                }
            }
        }
        Commands::Watch {
            file,
            debounce_secs,
            interval_secs,
            min_interval_secs,
        } => {
            // Defaults come from configuration.yaml when one is around,
            // flags win over both.
            let base = chatvault::configuration::get_configuration()
                .map(|settings| SchedulerConfig::from(&settings.sync))
                .unwrap_or_default();
            let config = SchedulerConfig {
                activity_debounce: debounce_secs
                    .map(Duration::from_secs)
                    .unwrap_or(base.activity_debounce),
                periodic_interval: interval_secs
                    .map(Duration::from_secs)
                    .unwrap_or(base.periodic_interval),
                min_push_interval: min_interval_secs
                    .map(Duration::from_secs)
                    .unwrap_or(base.min_push_interval),
            };
            let scheduler = SyncScheduler::new(
                config,
                handle.clone(),
                FileCollector::new(&file),
                Arc::new(LogStatusListener),
            );

            let (events, inbox) = mpsc::unbounded_channel();
            let run = tokio::spawn(scheduler.run(inbox));

            events.send(SourceEvent::SetEnabled(true)).ok();
            println!("Watching {} (ctrl-c to stop)", file.display());

            let mut last_mtime = file_mtime(&file).await;
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        events.send(SourceEvent::Teardown).ok();
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_secs(2)) => {
                        let current = file_mtime(&file).await;
                        if current != last_mtime {
                            last_mtime = current;
                            events.send(SourceEvent::Activity).ok();
                        }
                    }
                }
            }

            run.await.ok();
        }
    }

    Ok(())
}
