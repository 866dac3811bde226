/**
 * Payload Records
 *
 * This module defines the kind-specific records carried inside envelopes and
 * client frames: document snapshots, activity records, member descriptors and
 * Q&A pairs.
 *
 * Field names follow the document store's JSON (`_id`, camelCase) so that
 * snapshots produced by the mutation handlers deserialize without mapping.
 * Document snapshots keep every field they arrive with; the relay and the
 * client only ever look at `_id`.
 */
use serde::{Deserialize, Serialize};

/// Lightweight user reference embedded in records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    /// User identifier
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserRef {
    /// Create a reference with only an identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            email: None,
        }
    }

    /// Attach a display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Full document snapshot
///
/// Only `_id` is interpreted; all other fields (title, content, tags, summary,
/// versions, ...) are preserved as-is in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document identifier
    #[serde(rename = "_id")]
    pub id: String,
    /// Remaining snapshot fields
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Document {
    /// Create a snapshot with only an identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: serde_json::Map::new(),
        }
    }

    /// Set a snapshot field
    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Read the title field, if present
    pub fn title(&self) -> Option<&str> {
        self.fields.get("title").and_then(|v| v.as_str())
    }
}

/// What happened to a document in an activity record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Create,
    Update,
    Delete,
}

/// Team activity feed record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Title of the affected document
    pub doc_name: String,
    /// Kind of change
    pub activity_type: ActivityType,
    /// Acting user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRef>,
    /// RFC3339 timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl Activity {
    /// Create an activity record stamped with the current time
    pub fn now(doc_name: impl Into<String>, activity_type: ActivityType, user: UserRef) -> Self {
        Self {
            doc_name: doc_name.into(),
            activity_type,
            user: Some(user),
            date: Some(chrono::Utc::now().to_rfc3339()),
        }
    }
}

/// Question and answer pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaPair {
    /// Identifier assigned by the store
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The question asked
    pub question: String,
    /// The generated answer
    pub answer: String,
    /// Asking user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserRef>,
    /// Owning team
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    /// RFC3339 timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl QaPair {
    /// Create a stored pair
    pub fn new(id: impl Into<String>, question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            question: question.into(),
            answer: answer.into(),
            created_by: None,
            team_id: None,
            created_at: None,
        }
    }
}
