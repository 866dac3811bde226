/**
 * Team Activity Event System
 *
 * This module defines the closed set of team-activity events that travel from
 * mutation handlers, through the message broker, to every connected client of
 * the affected team.
 *
 * # Wire Contract
 *
 * Each event kind owns exactly one broker channel, and the relay re-emits the
 * event to clients under the same name:
 *
 * | Kind                   | Channel           |
 * |------------------------|-------------------|
 * | `DocumentCreated`      | `document:new`    |
 * | `DocumentUpdated`      | `document:update` |
 * | `DocumentDeleted`      | `document:delete` |
 * | `TeamActivityAppended` | `team:activity`   |
 * | `TeamMemberJoined`     | `team:join`       |
 * | `TeamMemberRemoved`    | `team:remove`     |
 * | `TeamDeleted`          | `team:delete`     |
 * | `QaCreated`            | `qna:new`         |
 *
 * Broker messages carry an [`Envelope`]; client connections carry
 * [`OutboundFrame`]s.
 */
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::shared::error::SharedError;

/// Kind of team-activity event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A document was created
    #[serde(rename = "document:new")]
    DocumentCreated,
    /// A document was updated
    #[serde(rename = "document:update")]
    DocumentUpdated,
    /// A document was deleted
    #[serde(rename = "document:delete")]
    DocumentDeleted,
    /// A record was appended to the team activity feed
    #[serde(rename = "team:activity")]
    TeamActivityAppended,
    /// A user joined the team
    #[serde(rename = "team:join")]
    TeamMemberJoined,
    /// A member was removed from the team (or left)
    #[serde(rename = "team:remove")]
    TeamMemberRemoved,
    /// The team was deleted
    #[serde(rename = "team:delete")]
    TeamDeleted,
    /// A Q&A pair was created
    #[serde(rename = "qna:new")]
    QaCreated,
}

impl EventKind {
    /// Every known kind, in channel subscription order
    pub const ALL: [EventKind; 8] = [
        EventKind::DocumentCreated,
        EventKind::DocumentUpdated,
        EventKind::DocumentDeleted,
        EventKind::TeamActivityAppended,
        EventKind::TeamMemberJoined,
        EventKind::TeamMemberRemoved,
        EventKind::TeamDeleted,
        EventKind::QaCreated,
    ];

    /// Broker channel (and client event name) for this kind
    pub const fn channel(self) -> &'static str {
        match self {
            EventKind::DocumentCreated => "document:new",
            EventKind::DocumentUpdated => "document:update",
            EventKind::DocumentDeleted => "document:delete",
            EventKind::TeamActivityAppended => "team:activity",
            EventKind::TeamMemberJoined => "team:join",
            EventKind::TeamMemberRemoved => "team:remove",
            EventKind::TeamDeleted => "team:delete",
            EventKind::QaCreated => "qna:new",
        }
    }

    /// Resolve a channel name; unknown names yield `None`
    pub fn from_channel(channel: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.channel() == channel)
    }

    /// All channel names, used by the relay to subscribe
    pub fn channels() -> Vec<&'static str> {
        Self::ALL.iter().map(|kind| kind.channel()).collect()
    }

    /// Whether an envelope of this kind must carry a non-null payload
    pub const fn requires_payload(self) -> bool {
        !matches!(self, EventKind::TeamDeleted)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.channel())
    }
}

/// Serialized unit passed through the broker
///
/// An envelope is self-contained: the relay never re-queries storage, every
/// field a client needs travels in `payload`. The kind is not part of the
/// body, it is implied by the channel the envelope is published on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Team whose connections receive the event
    #[serde(default)]
    pub team_id: String,
    /// Kind-specific data
    #[serde(
        default,
        alias = "document",
        alias = "documentId",
        alias = "activity",
        alias = "member",
        alias = "memberId",
        alias = "qa"
    )]
    pub payload: serde_json::Value,
    /// Actor that triggered the mutation, for self-echo suppression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
}

impl Envelope {
    /// Create an envelope without a sender
    pub fn new(team_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            team_id: team_id.into(),
            payload,
            sender_id: None,
        }
    }

    /// Attach the acting user's id
    pub fn with_sender(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = Some(sender_id.into());
        self
    }

    /// Serialize for publishing
    pub fn encode(&self) -> Result<Vec<u8>, SharedError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a broker message received on `channel`
    ///
    /// Rejects unknown channels, a missing or empty `teamId`, and a missing
    /// payload for kinds that require one.
    pub fn decode(channel: &str, bytes: &[u8]) -> Result<(EventKind, Envelope), SharedError> {
        let kind = EventKind::from_channel(channel)
            .ok_or_else(|| SharedError::envelope(format!("unknown channel '{}'", channel)))?;
        let envelope: Envelope = serde_json::from_slice(bytes)?;

        if envelope.team_id.trim().is_empty() {
            return Err(SharedError::envelope(format!(
                "envelope on '{}' is missing teamId",
                channel
            )));
        }
        if kind.requires_payload() && envelope.payload.is_null() {
            return Err(SharedError::envelope(format!(
                "envelope on '{}' is missing its payload",
                channel
            )));
        }

        Ok((kind, envelope))
    }
}

/// Frame sent from the relay to a client connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundFrame {
    /// Event name (the broker channel)
    pub event: String,
    /// Event data as described by the wire contract
    #[serde(default)]
    pub data: serde_json::Value,
}

impl OutboundFrame {
    /// Build the client-facing frame for an envelope
    ///
    /// The payload itself is never rewritten; kinds that carry a sender wrap it
    /// together with `senderId`, and `team:delete` emits the team id.
    pub fn from_envelope(kind: EventKind, envelope: &Envelope) -> Self {
        let data = match kind {
            EventKind::TeamMemberRemoved => serde_json::json!({
                "senderId": envelope.sender_id,
                "memberId": envelope.payload,
            }),
            EventKind::QaCreated => serde_json::json!({
                "qa": envelope.payload,
                "senderId": envelope.sender_id,
            }),
            EventKind::TeamDeleted => serde_json::Value::String(envelope.team_id.clone()),
            _ => envelope.payload.clone(),
        };

        Self {
            event: kind.channel().to_string(),
            data,
        }
    }

    /// Serialize to a text frame
    pub fn to_text(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Frame sent from a client to the relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientCommand {
    /// Join handshake carrying the session's team id
    #[serde(rename = "joinTeam")]
    JoinTeam(String),
    /// Leave the current team room without closing the connection
    #[serde(rename = "leaveTeam")]
    LeaveTeam,
}

impl ClientCommand {
    /// Parse a client text frame
    pub fn parse(text: &str) -> Result<Self, SharedError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_channel_names_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_channel(kind.channel()), Some(kind));
        }
        assert_eq!(EventKind::from_channel("document:archived"), None);
        assert_eq!(EventKind::channels().len(), 8);
    }

    #[test]
    fn test_kind_serializes_as_channel_name() {
        let json = serde_json::to_string(&EventKind::QaCreated).unwrap();
        assert_eq!(json, "\"qna:new\"");
    }

    #[test]
    fn test_decode_canonical_envelope() {
        let body = json!({"teamId": "t1", "payload": {"_id": "d1", "title": "Notes"}});
        let (kind, envelope) =
            Envelope::decode("document:new", body.to_string().as_bytes()).unwrap();
        assert_eq!(kind, EventKind::DocumentCreated);
        assert_eq!(envelope.team_id, "t1");
        assert_eq!(envelope.payload["_id"], "d1");
        assert!(envelope.sender_id.is_none());
    }

    #[test]
    fn test_decode_legacy_field_names() {
        let body = json!({"teamId": "t1", "documentId": "d1"});
        let (kind, envelope) =
            Envelope::decode("document:delete", body.to_string().as_bytes()).unwrap();
        assert_eq!(kind, EventKind::DocumentDeleted);
        assert_eq!(envelope.payload, json!("d1"));

        let body = json!({"teamId": "t1", "memberId": "u2", "senderId": "u1"});
        let (_, envelope) = Envelope::decode("team:remove", body.to_string().as_bytes()).unwrap();
        assert_eq!(envelope.payload, json!("u2"));
        assert_eq!(envelope.sender_id.as_deref(), Some("u1"));
    }

    #[test]
    fn test_decode_rejects_missing_team() {
        let body = json!({"payload": {"_id": "d1"}});
        let result = Envelope::decode("document:new", body.to_string().as_bytes());
        assert_matches!(result, Err(SharedError::EnvelopeError { .. }));

        let body = json!({"teamId": "  ", "payload": "d1"});
        let result = Envelope::decode("document:delete", body.to_string().as_bytes());
        assert_matches!(result, Err(SharedError::EnvelopeError { .. }));
    }

    #[test]
    fn test_decode_rejects_unknown_channel() {
        let body = json!({"teamId": "t1", "payload": 1});
        let result = Envelope::decode("billing:update", body.to_string().as_bytes());
        assert_matches!(result, Err(SharedError::EnvelopeError { .. }));
    }

    #[test]
    fn test_decode_rejects_missing_payload() {
        let body = json!({"teamId": "t1"});
        let result = Envelope::decode("team:activity", body.to_string().as_bytes());
        assert_matches!(result, Err(SharedError::EnvelopeError { .. }));

        // team:delete carries nothing
        let (kind, _) = Envelope::decode("team:delete", body.to_string().as_bytes()).unwrap();
        assert_eq!(kind, EventKind::TeamDeleted);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = Envelope::decode("document:new", b"not json");
        assert_matches!(result, Err(SharedError::SerializationError { .. }));
    }

    #[test]
    fn test_outbound_frame_shapes() {
        let removal = Envelope::new("t1", json!("u2")).with_sender("u1");
        let frame = OutboundFrame::from_envelope(EventKind::TeamMemberRemoved, &removal);
        assert_eq!(frame.event, "team:remove");
        assert_eq!(frame.data, json!({"senderId": "u1", "memberId": "u2"}));

        let qa = Envelope::new("t1", json!({"_id": "q1", "question": "?", "answer": "!"}))
            .with_sender("u1");
        let frame = OutboundFrame::from_envelope(EventKind::QaCreated, &qa);
        assert_eq!(frame.data["qa"]["_id"], "q1");
        assert_eq!(frame.data["senderId"], "u1");

        let deleted = Envelope::new("t1", serde_json::Value::Null);
        let frame = OutboundFrame::from_envelope(EventKind::TeamDeleted, &deleted);
        assert_eq!(frame.data, json!("t1"));

        let doc = Envelope::new("t1", json!({"_id": "d1", "extra": [1, 2]}));
        let frame = OutboundFrame::from_envelope(EventKind::DocumentUpdated, &doc);
        assert_eq!(frame.data, doc.payload);
    }

    #[test]
    fn test_client_command_parse() {
        let cmd = ClientCommand::parse(r#"{"event":"joinTeam","data":"t1"}"#).unwrap();
        assert_eq!(cmd, ClientCommand::JoinTeam("t1".to_string()));

        let cmd = ClientCommand::parse(r#"{"event":"leaveTeam"}"#).unwrap();
        assert_eq!(cmd, ClientCommand::LeaveTeam);

        assert!(ClientCommand::parse(r#"{"event":"dropTable","data":"t1"}"#).is_err());
    }
}
