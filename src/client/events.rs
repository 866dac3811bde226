/**
 * Typed Client Events
 *
 * Decodes relay frames (`{event, data}`) into a closed enum. Frames with an
 * unknown event name or data of the wrong shape fail to decode; callers skip
 * them.
 */
use serde::{Deserialize, Serialize};

use crate::shared::{Activity, Document, EventKind, QaPair, SharedError, UserRef};

/// `team:remove` data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRemoval {
    /// User who performed the removal
    #[serde(default)]
    pub sender_id: Option<String>,
    /// User who was removed
    pub member_id: String,
}

/// `qna:new` data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaAnnouncement {
    pub qa: QaPair,
    /// User who asked
    #[serde(default)]
    pub sender_id: Option<String>,
}

/// Event received from the relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "document:new")]
    DocumentCreated(Document),
    #[serde(rename = "document:update")]
    DocumentUpdated(Document),
    #[serde(rename = "document:delete")]
    DocumentDeleted(String),
    #[serde(rename = "team:activity")]
    ActivityAppended(Activity),
    #[serde(rename = "team:join")]
    MemberJoined(UserRef),
    #[serde(rename = "team:remove")]
    MemberRemoved(MemberRemoval),
    #[serde(rename = "team:delete")]
    TeamDeleted(String),
    #[serde(rename = "qna:new")]
    QaCreated(QaAnnouncement),
}

impl ClientEvent {
    /// Decode a relay text frame
    pub fn parse(text: &str) -> Result<Self, SharedError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn kind(&self) -> EventKind {
        match self {
            ClientEvent::DocumentCreated(_) => EventKind::DocumentCreated,
            ClientEvent::DocumentUpdated(_) => EventKind::DocumentUpdated,
            ClientEvent::DocumentDeleted(_) => EventKind::DocumentDeleted,
            ClientEvent::ActivityAppended(_) => EventKind::TeamActivityAppended,
            ClientEvent::MemberJoined(_) => EventKind::TeamMemberJoined,
            ClientEvent::MemberRemoved(_) => EventKind::TeamMemberRemoved,
            ClientEvent::TeamDeleted(_) => EventKind::TeamDeleted,
            ClientEvent::QaCreated(_) => EventKind::QaCreated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::{Envelope, OutboundFrame};
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn relay_frame(kind: EventKind, envelope: Envelope) -> String {
        OutboundFrame::from_envelope(kind, &envelope).to_text().unwrap()
    }

    #[test]
    fn test_decodes_every_relay_frame_shape() {
        let cases = [
            (EventKind::DocumentCreated, Envelope::new("t1", json!({"_id": "d1"}))),
            (EventKind::DocumentUpdated, Envelope::new("t1", json!({"_id": "d1", "title": "x"}))),
            (EventKind::DocumentDeleted, Envelope::new("t1", json!("d1"))),
            (
                EventKind::TeamActivityAppended,
                Envelope::new("t1", json!({"docName": "x", "activityType": "create"})),
            ),
            (EventKind::TeamMemberJoined, Envelope::new("t1", json!({"_id": "u2"}))),
            (EventKind::TeamMemberRemoved, Envelope::new("t1", json!("u2")).with_sender("u1")),
            (EventKind::TeamDeleted, Envelope::new("t1", serde_json::Value::Null)),
            (
                EventKind::QaCreated,
                Envelope::new("t1", json!({"_id": "q1", "question": "q", "answer": "a"}))
                    .with_sender("u1"),
            ),
        ];

        for (kind, envelope) in cases {
            let event = ClientEvent::parse(&relay_frame(kind, envelope)).unwrap();
            assert_eq!(event.kind(), kind);
        }
    }

    #[test]
    fn test_member_removed_fields() {
        let text = relay_frame(
            EventKind::TeamMemberRemoved,
            Envelope::new("t1", json!("u2")).with_sender("u1"),
        );
        assert_eq!(
            ClientEvent::parse(&text).unwrap(),
            ClientEvent::MemberRemoved(MemberRemoval {
                sender_id: Some("u1".to_string()),
                member_id: "u2".to_string(),
            })
        );
    }

    #[test]
    fn test_missing_sender_is_none() {
        let event = ClientEvent::parse(r#"{"event":"team:remove","data":{"senderId":null,"memberId":"u2"}}"#)
            .unwrap();
        assert_matches!(event, ClientEvent::MemberRemoved(MemberRemoval { sender_id: None, .. }));
    }

    #[test]
    fn test_unknown_event_rejected() {
        assert!(ClientEvent::parse(r#"{"event":"chat:new","data":{}}"#).is_err());
        assert!(ClientEvent::parse(r#"{"event":"document:delete","data":{"_id":"d1"}}"#).is_err());
    }
}
