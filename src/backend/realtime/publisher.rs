/**
 * Event Publisher
 *
 * Entry point used by mutation handlers after a successful write. Each call
 * wraps the payload in an [`Envelope`] and publishes it exactly once on the
 * channel of its event kind.
 *
 * Publishing is best-effort: the mutation has already committed, so broker
 * failures are logged and reported through the return value but never
 * propagated as errors.
 */
use serde::Serialize;
use std::sync::Arc;

use crate::backend::realtime::broker::Broker;
use crate::shared::{Activity, Envelope, EventKind, QaPair, UserRef};

/// Publishes team-activity events to the broker
#[derive(Clone)]
pub struct EventPublisher {
    broker: Arc<dyn Broker>,
}

impl std::fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPublisher").finish_non_exhaustive()
    }
}

impl EventPublisher {
    pub fn new(broker: Arc<dyn Broker>) -> Self {
        Self { broker }
    }

    /// Publish one event
    ///
    /// Returns `true` when the broker accepted the message. An empty team id
    /// or a payload that fails to serialize is logged and nothing is sent.
    pub async fn publish<P: Serialize>(
        &self,
        kind: EventKind,
        team_id: &str,
        payload: &P,
        sender_id: Option<&str>,
    ) -> bool {
        if team_id.trim().is_empty() {
            tracing::warn!("[Publisher] Refusing to publish {} without a team id", kind);
            return false;
        }

        let payload = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("[Publisher] Failed to serialize {} payload: {}", kind, e);
                return false;
            }
        };

        let mut envelope = Envelope::new(team_id, payload);
        if let Some(sender) = sender_id {
            envelope = envelope.with_sender(sender);
        }

        let bytes = match envelope.encode() {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("[Publisher] Failed to encode {} envelope: {}", kind, e);
                return false;
            }
        };

        match self.broker.publish(kind.channel(), bytes).await {
            Ok(()) => {
                tracing::debug!("[Publisher] Published {} for team {}", kind, team_id);
                true
            }
            Err(e) => {
                tracing::warn!("[Publisher] Failed to publish {} for team {}: {}", kind, team_id, e);
                false
            }
        }
    }

    pub async fn document_created<D: Serialize>(&self, team_id: &str, document: &D) -> bool {
        self.publish(EventKind::DocumentCreated, team_id, document, None)
            .await
    }

    pub async fn document_updated<D: Serialize>(&self, team_id: &str, document: &D) -> bool {
        self.publish(EventKind::DocumentUpdated, team_id, document, None)
            .await
    }

    pub async fn document_deleted(&self, team_id: &str, document_id: &str) -> bool {
        self.publish(EventKind::DocumentDeleted, team_id, &document_id, None)
            .await
    }

    pub async fn activity_appended(&self, team_id: &str, activity: &Activity) -> bool {
        self.publish(EventKind::TeamActivityAppended, team_id, activity, None)
            .await
    }

    pub async fn member_joined(&self, team_id: &str, member: &UserRef) -> bool {
        self.publish(EventKind::TeamMemberJoined, team_id, member, None)
            .await
    }

    /// `sender_id` is the user who performed the removal; equal to
    /// `member_id` when a member leaves on their own
    pub async fn member_removed(&self, team_id: &str, member_id: &str, sender_id: &str) -> bool {
        self.publish(EventKind::TeamMemberRemoved, team_id, &member_id, Some(sender_id))
            .await
    }

    pub async fn team_deleted(&self, team_id: &str) -> bool {
        self.publish(EventKind::TeamDeleted, team_id, &team_id, None)
            .await
    }

    pub async fn qa_created(&self, team_id: &str, qa: &QaPair, sender_id: &str) -> bool {
        self.publish(EventKind::QaCreated, team_id, qa, Some(sender_id))
            .await
    }
}
