//! Broker Channel Abstraction
//!
//! A named set of publish/subscribe channels (one per event kind) backed by a
//! message broker that every backend process can reach. The broker client is
//! constructed explicitly at startup and injected into the publisher and the
//! relay; nothing reaches a global connection.
//!
//! Delivery is at-most-once: a subscriber only sees messages published while
//! its subscription is open.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// Capacity of the in-process broker's fan-out buffer
const IN_MEMORY_CAPACITY: usize = 1024;

/// Broker failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BrokerError {
    #[error("Failed to connect to broker: {0}")]
    Connect(String),
    #[error("Failed to publish on '{channel}': {message}")]
    Publish { channel: String, message: String },
    #[error("Failed to subscribe: {0}")]
    Subscribe(String),
    #[error("Broker unavailable")]
    Unavailable,
}

/// One message received from a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerMessage {
    /// Channel the message was published on
    pub channel: String,
    /// Raw message body
    pub payload: Vec<u8>,
}

/// Stream of messages from a subscription; ends when the subscription is lost
pub type BrokerStream = BoxStream<'static, BrokerMessage>;

/// Publish/subscribe client
#[async_trait]
pub trait Broker: Send + Sync + 'static {
    /// Publish a message on a channel
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<(), BrokerError>;

    /// Open one subscription covering every listed channel
    async fn subscribe(&self, channels: &[&str]) -> Result<BrokerStream, BrokerError>;

    /// Release broker connections
    async fn disconnect(&self);
}

/// In-process broker built on `tokio::sync::broadcast`
///
/// Used for single-instance deployments and tests. `simulate_outage` makes
/// publish/subscribe fail and ends every open subscription, mimicking a lost
/// broker connection.
#[derive(Debug)]
pub struct InMemoryBroker {
    sender: Mutex<broadcast::Sender<BrokerMessage>>,
    available: AtomicBool,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBroker {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(IN_MEMORY_CAPACITY);
        Self {
            sender: Mutex::new(sender),
            available: AtomicBool::new(true),
        }
    }

    /// Drop every open subscription and refuse traffic until `restore`
    pub fn simulate_outage(&self) {
        self.available.store(false, Ordering::SeqCst);
        let (fresh, _) = broadcast::channel(IN_MEMORY_CAPACITY);
        if let Ok(mut sender) = self.sender.lock() {
            // Replacing the sender closes every receiver of the old one
            *sender = fresh;
        }
        tracing::warn!("[Broker] In-memory broker outage started");
    }

    /// End a simulated outage
    pub fn restore(&self) {
        self.available.store(true, Ordering::SeqCst);
        tracing::info!("[Broker] In-memory broker restored");
    }

    /// Number of open subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.sender
            .lock()
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Broker for InMemoryBroker {
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        if !self.is_available() {
            return Err(BrokerError::Unavailable);
        }
        let sender = self.sender.lock().map_err(|_| BrokerError::Publish {
            channel: channel.to_string(),
            message: "broker lock poisoned".to_string(),
        })?;
        // No receivers is not an error: nobody was listening
        let _ = sender.send(BrokerMessage {
            channel: channel.to_string(),
            payload,
        });
        Ok(())
    }

    async fn subscribe(&self, channels: &[&str]) -> Result<BrokerStream, BrokerError> {
        if !self.is_available() {
            return Err(BrokerError::Unavailable);
        }
        let receiver = self
            .sender
            .lock()
            .map_err(|_| BrokerError::Subscribe("broker lock poisoned".to_string()))?
            .subscribe();
        let wanted: Vec<String> = channels.iter().map(|c| c.to_string()).collect();

        let stream = BroadcastStream::new(receiver).filter_map(move |item| {
            let message = match item {
                Ok(message) if wanted.contains(&message.channel) => Some(message),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!("[Broker] Subscriber lagged: {}", e);
                    None
                }
            };
            futures_util::future::ready(message)
        });

        Ok(stream.boxed())
    }

    async fn disconnect(&self) {
        self.simulate_outage();
    }
}
