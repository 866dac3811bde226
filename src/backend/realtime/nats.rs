//! NATS Broker
//!
//! Core NATS publish/subscribe (no JetStream): fire-and-forget publishes and
//! at-most-once delivery, matching the relay's best-effort model.
//!
//! Two client connections are opened: one for publishing and one dedicated
//! to subscriptions, so that a slow subscriber never stalls publishers
//! sharing the process.

use async_nats::{Client, ConnectOptions};
use async_trait::async_trait;
use futures_util::stream::{select_all, StreamExt};
use std::time::Duration;

use crate::backend::realtime::broker::{Broker, BrokerError, BrokerMessage, BrokerStream};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Broker backed by a NATS server
#[derive(Debug, Clone)]
pub struct NatsBroker {
    publisher: Client,
    subscriber: Client,
}

impl NatsBroker {
    /// Open the publisher and subscriber connections
    pub async fn connect(url: &str, name: &str) -> Result<Self, BrokerError> {
        tracing::info!("[Broker] Connecting to NATS at {}", url);

        let publisher = Self::open(url, format!("{}-pub", name)).await?;
        let subscriber = Self::open(url, format!("{}-sub", name)).await?;

        tracing::info!("[Broker] NATS connections established");
        Ok(Self {
            publisher,
            subscriber,
        })
    }

    async fn open(url: &str, name: String) -> Result<Client, BrokerError> {
        ConnectOptions::new()
            .name(name)
            .connection_timeout(CONNECT_TIMEOUT)
            .connect(url)
            .await
            .map_err(|e| BrokerError::Connect(e.to_string()))
    }
}

#[async_trait]
impl Broker for NatsBroker {
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        self.publisher
            .publish(channel.to_string(), payload.into())
            .await
            .map_err(|e| BrokerError::Publish {
                channel: channel.to_string(),
                message: e.to_string(),
            })
    }

    async fn subscribe(&self, channels: &[&str]) -> Result<BrokerStream, BrokerError> {
        let mut streams = Vec::with_capacity(channels.len());
        for channel in channels {
            let subscription = self
                .subscriber
                .subscribe(channel.to_string())
                .await
                .map_err(|e| BrokerError::Subscribe(e.to_string()))?;
            tracing::debug!("[Broker] Subscribed to {}", channel);

            streams.push(
                subscription
                    .map(|message| BrokerMessage {
                        channel: message.subject.to_string(),
                        payload: message.payload.to_vec(),
                    })
                    .boxed(),
            );
        }

        Ok(select_all(streams).boxed())
    }

    /// Flush pending publishes, then drain both connections
    ///
    /// Draining ends every open subscription stream and closes the
    /// connections; later publishes and subscribes fail.
    async fn disconnect(&self) {
        if let Err(e) = self.publisher.flush().await {
            tracing::warn!("[Broker] Failed to flush publisher before disconnect: {}", e);
        }
        for client in [&self.publisher, &self.subscriber] {
            if let Err(e) = client.drain().await {
                tracing::warn!("[Broker] Failed to drain NATS connection: {}", e);
            }
        }
        tracing::info!("[Broker] NATS broker disconnected");
    }
}
