use crate::agent::collector::Snapshot;
use crate::agent::credentials::{CredentialStore, Credentials};
use crate::agent::transport::{AuthStatus, SyncOutcome, SyncTransport, TransportError};
use crate::models::Provider;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Hard ceiling on any single backend call; a hung request must not wedge
/// the executor loop forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The typed request/response contract between the in-page side of the
/// agent (scheduler, panel host) and the background executor that owns the
/// credential and the HTTP client. One variant per operation; the beacon
/// variant deliberately has no reply channel.
pub enum AgentRequest {
    SyncConversation {
        snapshot: Snapshot,
        reply: oneshot::Sender<Result<SyncOutcome, TransportError>>,
    },
    SyncConversationBeacon {
        snapshot: Snapshot,
    },
    GetAuthStatus {
        reply: oneshot::Sender<AuthStatus>,
    },
    ToggleBookmark {
        provider: Provider,
        external_id: String,
        position: i64,
        reply: oneshot::Sender<Result<bool, TransportError>>,
    },
    GetBookmarkStatus {
        provider: Provider,
        external_id: String,
        reply: oneshot::Sender<Result<Vec<i64>, TransportError>>,
    },
    SetAuthToken {
        token: String,
        backend_url: String,
        reply: oneshot::Sender<()>,
    },
    Logout {
        reply: oneshot::Sender<()>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncResponseBody {
    #[allow(dead_code)]
    success: bool,
    conversation_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToggleResponseBody {
    #[allow(dead_code)]
    success: bool,
    bookmarked: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponseBody {
    #[allow(dead_code)]
    success: bool,
    bookmarked_indices: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponseBody {
    error: Option<String>,
}

pub struct Executor<S: CredentialStore> {
    http: reqwest::Client,
    store: S,
    rx: mpsc::UnboundedReceiver<AgentRequest>,
}

/// Start the background executor and hand back its typed handle.
pub fn spawn<S: CredentialStore + 'static>(store: S) -> anyhow::Result<AgentHandle> {
    let http = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?;
    let (tx, rx) = mpsc::unbounded_channel();
    let executor = Executor { http, store, rx };
    tokio::spawn(executor.run());
    Ok(AgentHandle { tx })
}

impl<S: CredentialStore> Executor<S> {
    pub async fn run(mut self) {
        while let Some(request) = self.rx.recv().await {
            match request {
                AgentRequest::SyncConversation { snapshot, reply } => {
                    let result = self.push(&snapshot).await;
                    let _ = reply.send(result);
                }
                AgentRequest::SyncConversationBeacon { snapshot } => {
                    // Detached on purpose: nothing may suspend on the
                    // teardown path, and failures are dropped unseen.
                    let http = self.http.clone();
                    let credentials = self.store.load().await;
                    tokio::spawn(async move {
                        if let Some(credentials) = credentials {
                            if let Err(err) =
                                post_snapshot(&http, &credentials, &snapshot).await
                            {
                                tracing::debug!("Beacon push dropped: {}", err);
                            }
                        }
                    });
                }
                AgentRequest::GetAuthStatus { reply } => {
                    let credentials = self.store.load().await;
                    let _ = reply.send(AuthStatus {
                        is_authenticated: credentials.is_some(),
                        backend_url: credentials.map(|c| c.backend_url),
                    });
                }
                AgentRequest::ToggleBookmark {
                    provider,
                    external_id,
                    position,
                    reply,
                } => {
                    let result = self.toggle_bookmark(provider, &external_id, position).await;
                    let _ = reply.send(result);
                }
                AgentRequest::GetBookmarkStatus {
                    provider,
                    external_id,
                    reply,
                } => {
                    let result = self.bookmark_status(provider, &external_id).await;
                    let _ = reply.send(result);
                }
                AgentRequest::SetAuthToken {
                    token,
                    backend_url,
                    reply,
                } => {
                    self.store.store(Credentials { token, backend_url }).await;
                    let _ = reply.send(());
                }
                AgentRequest::Logout { reply } => {
                    self.store.clear().await;
                    let _ = reply.send(());
                }
            }
        }
    }

    async fn credentials(&self) -> Result<Credentials, TransportError> {
        self.store
            .load()
            .await
            .ok_or_else(|| TransportError::Auth("not signed in".to_string()))
    }

    async fn push(&self, snapshot: &Snapshot) -> Result<SyncOutcome, TransportError> {
        let credentials = self.credentials().await?;
        post_snapshot(&self.http, &credentials, snapshot).await
    }

    async fn toggle_bookmark(
        &self,
        provider: Provider,
        external_id: &str,
        position: i64,
    ) -> Result<bool, TransportError> {
        let credentials = self.credentials().await?;
        let url = endpoint(&credentials.backend_url, "/bookmark");
        let response = self
            .http
            .post(url)
            .bearer_auth(&credentials.token)
            .json(&serde_json::json!({
                "provider": provider,
                "externalId": external_id,
                "messageIndex": position,
            }))
            .send()
            .await
            .map_err(into_network_error)?;

        let response = check_status(response).await?;
        let body: ToggleResponseBody = response
            .json()
            .await
            .map_err(|err| TransportError::Server(err.to_string()))?;
        Ok(body.bookmarked)
    }

    async fn bookmark_status(
        &self,
        provider: Provider,
        external_id: &str,
    ) -> Result<Vec<i64>, TransportError> {
        let credentials = self.credentials().await?;
        let url = endpoint(&credentials.backend_url, "/bookmarks/status");
        let response = self
            .http
            .post(url)
            .bearer_auth(&credentials.token)
            .json(&serde_json::json!({
                "provider": provider,
                "externalId": external_id,
            }))
            .send()
            .await
            .map_err(into_network_error)?;

        let response = check_status(response).await?;
        let body: StatusResponseBody = response
            .json()
            .await
            .map_err(|err| TransportError::Server(err.to_string()))?;
        Ok(body.bookmarked_indices)
    }
}

fn endpoint(backend_url: &str, path: &str) -> String {
    format!("{}{}", backend_url.trim_end_matches('/'), path)
}

fn into_network_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Network(format!("request timed out: {}", err))
    } else {
        TransportError::Network(err.to_string())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorResponseBody>()
        .await
        .ok()
        .and_then(|body| body.error)
        .unwrap_or_else(|| format!("HTTP {}", status));

    Err(match status {
        StatusCode::UNAUTHORIZED => TransportError::Auth(message),
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => TransportError::Validation(message),
        _ => TransportError::Server(message),
    })
}

async fn post_snapshot(
    http: &reqwest::Client,
    credentials: &Credentials,
    snapshot: &Snapshot,
) -> Result<SyncOutcome, TransportError> {
    let url = endpoint(&credentials.backend_url, "/sync");
    let response = http
        .post(url)
        .bearer_auth(&credentials.token)
        .json(snapshot)
        .send()
        .await
        .map_err(into_network_error)?;

    let response = check_status(response).await?;
    let body: SyncResponseBody = response
        .json()
        .await
        .map_err(|err| TransportError::Server(err.to_string()))?;

    Ok(SyncOutcome {
        conversation_id: body.conversation_id,
    })
}

/// Cloneable address of the executor; this is what the scheduler and any
/// host UI hold. Dropping every handle shuts the executor down.
#[derive(Clone)]
pub struct AgentHandle {
    tx: mpsc::UnboundedSender<AgentRequest>,
}

impl AgentHandle {
    async fn request<R>(
        &self,
        make: impl FnOnce(oneshot::Sender<R>) -> AgentRequest,
    ) -> Result<R, TransportError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(make(reply)).map_err(|_| TransportError::Closed)?;
        rx.await.map_err(|_| TransportError::Closed)
    }

    pub async fn set_auth_token(
        &self,
        token: String,
        backend_url: String,
    ) -> Result<(), TransportError> {
        self.request(|reply| AgentRequest::SetAuthToken {
            token,
            backend_url,
            reply,
        })
        .await
    }

    pub async fn toggle_bookmark(
        &self,
        provider: Provider,
        external_id: String,
        position: i64,
    ) -> Result<bool, TransportError> {
        self.request(|reply| AgentRequest::ToggleBookmark {
            provider,
            external_id,
            position,
            reply,
        })
        .await?
    }

    pub async fn bookmark_status(
        &self,
        provider: Provider,
        external_id: String,
    ) -> Result<Vec<i64>, TransportError> {
        self.request(|reply| AgentRequest::GetBookmarkStatus {
            provider,
            external_id,
            reply,
        })
        .await?
    }
}

#[async_trait]
impl SyncTransport for AgentHandle {
    async fn sync_conversation(&self, snapshot: Snapshot) -> Result<SyncOutcome, TransportError> {
        self.request(|reply| AgentRequest::SyncConversation { snapshot, reply })
            .await?
    }

    fn sync_conversation_beacon(&self, snapshot: Snapshot) {
        let _ = self
            .tx
            .send(AgentRequest::SyncConversationBeacon { snapshot });
    }

    async fn auth_status(&self) -> Result<AuthStatus, TransportError> {
        self.request(|reply| AgentRequest::GetAuthStatus { reply })
            .await
    }

    fn is_alive(&self) -> bool {
        !self.tx.is_closed()
    }

    async fn logout(&self) -> Result<(), TransportError> {
        self.request(|reply| AgentRequest::Logout { reply }).await
    }
}
