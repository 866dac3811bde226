/**
 * Client Reconciler
 *
 * Applies relay events to [`LocalState`] deterministically and idempotently,
 * so duplicate or reordered delivery converges to the same state.
 *
 * | Event             | Effect                                                  |
 * |-------------------|---------------------------------------------------------|
 * | `document:new`    | insert if the id is absent                              |
 * | `document:update` | replace by id; refetch if the id is unknown             |
 * | `document:delete` | remove by id                                            |
 * | `team:activity`   | prepend, keep the newest [`ACTIVITY_RETENTION`]         |
 * | `team:join`       | append the member if absent                             |
 * | `team:remove`     | removal of the local user by someone else: leave team   |
 * |                   | and navigate to the join flow; otherwise drop the member|
 * | `team:delete`     | leave team and navigate to the join flow                |
 * | `qna:new`         | prepend if the id is absent                             |
 *
 * Navigation and refetching are returned as an [`Intent`] for the UI layer to
 * act on; the reconciler never performs them itself.
 */
use crate::client::events::{ClientEvent, MemberRemoval, QaAnnouncement};
use crate::client::state::{LocalState, TeamMember, ACTIVITY_RETENTION};
use crate::shared::Document;

/// Side effect requested from the UI layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    None,
    /// Local documents may be stale; reload them from the server
    RefetchDocuments,
    /// The user no longer belongs to a team
    NavigateToJoinTeam,
}

/// Owns the local state and applies events to it
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciler {
    state: LocalState,
}

impl Reconciler {
    pub fn new(state: LocalState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &LocalState {
        &self.state
    }

    /// Apply one event
    pub fn apply(&mut self, event: ClientEvent) -> Intent {
        match event {
            ClientEvent::DocumentCreated(document) => {
                if self.state.document(&document.id).is_none() {
                    self.state.documents.insert(0, document);
                }
                Intent::None
            }
            ClientEvent::DocumentUpdated(document) => self.replace_document(document),
            ClientEvent::DocumentDeleted(id) => {
                self.state.documents.retain(|d| d.id != id);
                Intent::None
            }
            ClientEvent::ActivityAppended(activity) => {
                self.state.activity.push_front(activity);
                self.state.activity.truncate(ACTIVITY_RETENTION);
                Intent::None
            }
            ClientEvent::MemberJoined(user) => {
                if let Some(team) = self.state.team.as_mut() {
                    if !team.has_member(&user.id) {
                        team.members.push(TeamMember::member(user));
                    }
                }
                Intent::None
            }
            ClientEvent::MemberRemoved(removal) => self.remove_member(removal),
            ClientEvent::TeamDeleted(team_id) => {
                tracing::info!("[Client] Team {} was deleted", team_id);
                self.state.clear_team();
                Intent::NavigateToJoinTeam
            }
            ClientEvent::QaCreated(announcement) => self.add_qa(announcement),
        }
    }

    fn replace_document(&mut self, document: Document) -> Intent {
        match self.state.documents.iter_mut().find(|d| d.id == document.id) {
            Some(existing) => {
                *existing = document;
                Intent::None
            }
            None => Intent::RefetchDocuments,
        }
    }

    fn remove_member(&mut self, removal: MemberRemoval) -> Intent {
        let removed_me = removal.member_id == self.state.user_id;
        let by_me = removal.sender_id.as_deref() == Some(self.state.user_id.as_str());

        if removed_me && !by_me {
            tracing::info!("[Client] Removed from team by {:?}", removal.sender_id);
            self.state.clear_team();
            return Intent::NavigateToJoinTeam;
        }

        if let Some(team) = self.state.team.as_mut() {
            team.members.retain(|m| m.user.id != removal.member_id);
        }
        Intent::None
    }

    fn add_qa(&mut self, announcement: QaAnnouncement) -> Intent {
        let QaAnnouncement { qa, sender_id } = announcement;
        let duplicate = match &qa.id {
            Some(id) => self.state.qa.iter().any(|q| q.id.as_deref() == Some(id.as_str())),
            // Without an id only the asker's own echo can be recognized
            None => sender_id.as_deref() == Some(self.state.user_id.as_str()),
        };
        if !duplicate {
            self.state.qa.insert(0, qa);
        }
        Intent::None
    }
}
