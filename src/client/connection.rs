//! Reconnecting relay client
//!
//! Keeps a WebSocket open to the relay, re-sends the `joinTeam` handshake on
//! every (re)connect and forwards decoded [`ClientEvent`]s to the caller.
//! Lost connections are retried with [`BackoffConfig`]; the attempt counter
//! resets once a connection succeeds. Events published while disconnected
//! are not recovered, so callers should refetch after a reconnect when they
//! need a complete view.

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::AUTHORIZATION, HeaderValue};
use tokio_tungstenite::tungstenite::Message;

use crate::client::events::ClientEvent;
use crate::shared::{BackoffConfig, ClientCommand};

/// Client connection failures
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid relay request: {0}")]
    Request(String),
    #[error("Failed to connect to relay: {0}")]
    Connect(String),
    #[error("Failed to send to relay: {0}")]
    Send(String),
}

/// Connection settings
#[derive(Debug, Clone)]
pub struct RelayClient {
    url: String,
    token: String,
    team_id: Option<String>,
    backoff: BackoffConfig,
}

/// Handle to a running client task
#[derive(Debug)]
pub struct ClientHandle {
    shutdown: watch::Sender<bool>,
    team: watch::Sender<Option<String>>,
    task: JoinHandle<()>,
}

impl ClientHandle {
    /// Join another team, or leave the current one with `None`
    pub fn switch_team(&self, team_id: Option<String>) {
        self.team.send_replace(team_id);
    }

    /// Close the connection and wait for the task to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!("[Client] Client task ended abnormally: {}", e);
        }
    }
}

enum SessionEnd {
    Shutdown,
    Lost,
}

impl RelayClient {
    /// `url` is the relay's WebSocket endpoint, e.g. `ws://host:5000/ws`
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            team_id: None,
            backoff: BackoffConfig::default(),
        }
    }

    /// Team to join on every connect
    pub fn with_team(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }

    /// Reconnect policy; an invalid policy is ignored in favour of the default
    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        match backoff.validate() {
            Ok(()) => self.backoff = backoff,
            Err(e) => tracing::warn!("[Client] Ignoring reconnect policy: {}", e),
        }
        self
    }

    /// Run the client in the background, delivering events to `events`
    ///
    /// The task stops on [`ClientHandle::shutdown`] or when `events` is
    /// dropped.
    pub fn spawn(self, events: mpsc::Sender<ClientEvent>) -> ClientHandle {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let (team, team_rx) = watch::channel(self.team_id.clone());
        let task = tokio::spawn(self.run(events, shutdown_rx, team_rx));
        ClientHandle {
            shutdown,
            team,
            task,
        }
    }

    async fn run(
        self,
        events: mpsc::Sender<ClientEvent>,
        mut shutdown: watch::Receiver<bool>,
        mut team: watch::Receiver<Option<String>>,
    ) {
        let mut attempt = 0u32;
        loop {
            match self.session(&events, &mut shutdown, &mut team, &mut attempt).await {
                Ok(SessionEnd::Shutdown) => break,
                Ok(SessionEnd::Lost) => tracing::warn!("[Client] Connection to relay lost"),
                Err(e) => tracing::warn!("[Client] {}", e),
            }

            let delay = self.backoff.delay_for(attempt);
            attempt = attempt.saturating_add(1);
            tracing::info!("[Client] Reconnecting in {:?}", delay);
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        tracing::info!("[Client] Client stopped");
    }

    async fn session(
        &self,
        events: &mpsc::Sender<ClientEvent>,
        shutdown: &mut watch::Receiver<bool>,
        team: &mut watch::Receiver<Option<String>>,
        attempt: &mut u32,
    ) -> Result<SessionEnd, ClientError> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| ClientError::Request(e.to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|e| ClientError::Request(e.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, bearer);

        let (socket, _) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| ClientError::Connect(e.to_string()))?;
        *attempt = 0;
        tracing::info!("[Client] Connected to {}", self.url);

        let (mut sink, mut stream) = socket.split();

        let current = team.borrow_and_update().clone();
        if let Some(team_id) = current {
            send_command(&mut sink, &ClientCommand::JoinTeam(team_id)).await?;
        }

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    let _ = sink.send(Message::Close(None)).await;
                    return Ok(SessionEnd::Shutdown);
                }
                changed = team.changed() => {
                    if changed.is_err() {
                        return Ok(SessionEnd::Shutdown);
                    }
                    let command = match team.borrow_and_update().clone() {
                        Some(team_id) => ClientCommand::JoinTeam(team_id),
                        None => ClientCommand::LeaveTeam,
                    };
                    send_command(&mut sink, &command).await?;
                }
                message = stream.next() => match message {
                    Some(Ok(Message::Text(text))) => match ClientEvent::parse(text.as_str()) {
                        Ok(event) => {
                            if events.send(event).await.is_err() {
                                return Ok(SessionEnd::Shutdown);
                            }
                        }
                        Err(e) => tracing::warn!("[Client] Skipping undecodable frame: {}", e),
                    },
                    Some(Ok(Message::Close(_))) | None => return Ok(SessionEnd::Lost),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!("[Client] Read error: {}", e);
                        return Ok(SessionEnd::Lost);
                    }
                },
            }
        }
    }
}

async fn send_command<S>(sink: &mut S, command: &ClientCommand) -> Result<(), ClientError>
where
    S: futures_util::Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    let text = serde_json::to_string(command).map_err(|e| ClientError::Send(e.to_string()))?;
    sink.send(Message::text(text))
        .await
        .map_err(|e| ClientError::Send(e.to_string()))
}
