//! Relay Process
//!
//! Subscribes to every event channel and forwards each decoded envelope to the
//! connections that joined the envelope's team. One relay task runs per
//! backend instance.
//!
//! The first subscription is established in [`Relay::start`], before the
//! server accepts connections, so a broker that is unreachable at startup is
//! a fatal error. Once running, a lost subscription is re-established with
//! bounded exponential backoff; events published while the subscription is
//! down are not recovered.

use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::backend::realtime::broker::{Broker, BrokerError, BrokerMessage, BrokerStream};
use crate::backend::realtime::registry::TeamRegistry;
use crate::shared::{BackoffConfig, Envelope, EventKind, OutboundFrame};

/// Forwards broker messages to team rooms
#[derive(Clone)]
pub struct Relay {
    broker: Arc<dyn Broker>,
    registry: TeamRegistry,
    backoff: BackoffConfig,
}

/// Handle to a running relay loop
#[derive(Debug)]
pub struct RelayHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RelayHandle {
    /// Stop the relay loop and wait for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!("[Relay] Relay task ended abnormally: {}", e);
        }
    }

    /// Whether the relay loop has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Relay {
    pub fn new(broker: Arc<dyn Broker>, registry: TeamRegistry, backoff: BackoffConfig) -> Self {
        Self {
            broker,
            registry,
            backoff,
        }
    }

    /// Registry this relay delivers into
    pub fn registry(&self) -> &TeamRegistry {
        &self.registry
    }

    /// Subscribe to all channels and spawn the forwarding loop
    pub async fn start(self) -> Result<RelayHandle, BrokerError> {
        let stream = self.subscribe().await?;
        tracing::info!(
            "[Relay] Subscribed to {} channels",
            EventKind::ALL.len()
        );

        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(stream, shutdown_rx));
        Ok(RelayHandle { shutdown, task })
    }

    async fn subscribe(&self) -> Result<BrokerStream, BrokerError> {
        self.broker.subscribe(&EventKind::channels()).await
    }

    async fn run(self, mut stream: BrokerStream, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                next = stream.next() => match next {
                    Some(message) => {
                        self.dispatch(message);
                    }
                    None => {
                        tracing::error!("[Relay] Broker subscription lost");
                        match self.resubscribe(&mut shutdown).await {
                            Some(fresh) => stream = fresh,
                            None => break,
                        }
                    }
                },
            }
        }
        tracing::info!("[Relay] Relay stopped");
    }

    /// Retry the subscription until it succeeds or shutdown is requested
    async fn resubscribe(&self, shutdown: &mut watch::Receiver<bool>) -> Option<BrokerStream> {
        let mut attempt = 0u32;
        loop {
            let delay = self.backoff.delay_for(attempt);
            tracing::info!(
                "[Relay] Resubscribing in {:?} (attempt {})",
                delay,
                attempt + 1
            );
            tokio::select! {
                _ = shutdown.changed() => return None,
                _ = tokio::time::sleep(delay) => {}
            }

            match self.subscribe().await {
                Ok(stream) => {
                    tracing::info!("[Relay] Broker subscription restored");
                    return Some(stream);
                }
                Err(e) => {
                    tracing::warn!("[Relay] Resubscribe failed: {}", e);
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }

    /// Deliver one broker message; returns the number of connections reached
    ///
    /// Malformed messages are logged and dropped.
    pub fn dispatch(&self, message: BrokerMessage) -> usize {
        let (kind, envelope) = match Envelope::decode(&message.channel, &message.payload) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!("[Relay] Dropping message on {}: {}", message.channel, e);
                return 0;
            }
        };

        let frame = OutboundFrame::from_envelope(kind, &envelope);
        let delivered = self.registry.broadcast(&envelope.team_id, &frame);
        tracing::debug!(
            "[Relay] {} for team {} delivered to {} connections",
            kind,
            envelope.team_id,
            delivered
        );

        match kind {
            EventKind::TeamMemberRemoved => {
                if let Some(member_id) = envelope.payload.as_str() {
                    self.registry.evict_member(&envelope.team_id, member_id);
                }
            }
            EventKind::TeamDeleted => {
                self.registry.close_room(&envelope.team_id);
            }
            _ => {}
        }

        delivered
    }
}
