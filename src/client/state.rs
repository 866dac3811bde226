//! Client-side optimistic state
//!
//! Caches rendered by the UI layer. Remote changes reach it only through the
//! [`Reconciler`](crate::client::Reconciler).

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::shared::{Activity, Document, QaPair, UserRef};

/// Number of activity records kept, most recent first
pub const ACTIVITY_RETENTION: usize = 5;

/// Role given to members announced by `team:join`
pub const DEFAULT_MEMBER_ROLE: &str = "member";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub user: UserRef,
    pub role: String,
}

impl TeamMember {
    pub fn member(user: UserRef) -> Self {
        Self {
            user,
            role: DEFAULT_MEMBER_ROLE.to_string(),
        }
    }
}

/// The team the local user belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamState {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub members: Vec<TeamMember>,
}

impl TeamState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            members: Vec::new(),
        }
    }

    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.user.id == user_id)
    }
}

/// Local caches for one signed-in user
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocalState {
    /// Signed-in user
    pub user_id: String,
    /// Current team; `None` means the user must go through the join flow
    pub team: Option<TeamState>,
    pub documents: Vec<Document>,
    /// Most recent first, at most [`ACTIVITY_RETENTION`] entries
    pub activity: VecDeque<Activity>,
    /// Most recent first
    pub qa: Vec<QaPair>,
}

impl LocalState {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    pub fn with_team(mut self, team: TeamState) -> Self {
        self.team = Some(team);
        self
    }

    pub fn with_documents(mut self, documents: Vec<Document>) -> Self {
        self.documents = documents;
        self
    }

    pub fn team_id(&self) -> Option<&str> {
        self.team.as_ref().map(|t| t.id.as_str())
    }

    pub fn document(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn document_ids(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.id.as_str()).collect()
    }

    /// Drop the team and everything cached for it
    pub fn clear_team(&mut self) {
        self.team = None;
        self.documents.clear();
        self.activity.clear();
        self.qa.clear();
    }
}
