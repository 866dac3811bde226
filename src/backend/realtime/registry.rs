//! Connection-to-Team Registry
//!
//! Process-local map from team id to the set of live connections interested in
//! that team's events. Connections enter a team room only through an explicit
//! join handshake, belong to at most one room at a time, and are removed from
//! every room when they disconnect.
//!
//! ```text
//!   register ──► Connected ──join(t)──► Joined(t) ──join(u)──► Joined(u)
//!                   ▲                       │
//!                   └──leave / evict / close┘
//!   disconnect (from any state) ──► Disconnected
//! ```
//!
//! Each relay instance owns an independent registry; cross-instance fan-out is
//! achieved by every instance subscribing to every broker channel.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::shared::OutboundFrame;

/// Identifier of one client connection
pub type ConnectionId = Uuid;

/// Lifecycle state of a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Open, not in any team room
    Connected,
    /// Member of the named team room
    Joined(String),
    /// Closed or never registered
    Disconnected,
}

/// Result of a join request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Entered the room from the unjoined state
    Joined,
    /// Already in this room; nothing changed
    AlreadyJoined,
    /// Left `from` and entered the requested room
    Switched { from: String },
}

/// Registry failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown connection: {0}")]
    UnknownConnection(ConnectionId),
    #[error("Team id must not be empty")]
    EmptyTeam,
}

struct Connection {
    user_id: String,
    team: Option<String>,
    outbox: mpsc::Sender<OutboundFrame>,
}

#[derive(Default)]
struct Rooms {
    connections: HashMap<ConnectionId, Connection>,
    teams: HashMap<String, HashSet<ConnectionId>>,
}

impl Rooms {
    fn remove_from_room(&mut self, team: &str, id: &ConnectionId) {
        if let Some(members) = self.teams.get_mut(team) {
            members.remove(id);
            if members.is_empty() {
                self.teams.remove(team);
            }
        }
    }
}

/// Shared handle to the registry
#[derive(Clone, Default)]
pub struct TeamRegistry {
    inner: Arc<Mutex<Rooms>>,
}

impl std::fmt::Debug for TeamRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeamRegistry")
            .field("connections", &self.connection_count())
            .field("teams", &self.team_count())
            .finish()
    }
}

impl TeamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn rooms(&self) -> MutexGuard<'_, Rooms> {
        // A panic while holding the lock cannot leave the maps half-updated
        // in a way later calls depend on, so a poisoned lock is still usable.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Track a newly opened connection for `user_id`
    pub fn register(
        &self,
        user_id: impl Into<String>,
        outbox: mpsc::Sender<OutboundFrame>,
    ) -> ConnectionId {
        let id = Uuid::new_v4();
        let user_id = user_id.into();
        tracing::debug!(connection = %id, user = %user_id, "[Registry] Connection registered");
        self.rooms().connections.insert(
            id,
            Connection {
                user_id,
                team: None,
                outbox,
            },
        );
        id
    }

    /// Put a connection into a team room
    ///
    /// Re-joining the current room is a no-op. Joining a different room
    /// removes the connection from the old one first, under the same lock, so
    /// it is never a member of two rooms.
    pub fn join(&self, id: ConnectionId, team: &str) -> Result<JoinOutcome, RegistryError> {
        if team.trim().is_empty() {
            return Err(RegistryError::EmptyTeam);
        }

        let mut rooms = self.rooms();
        let previous = {
            let connection = rooms
                .connections
                .get_mut(&id)
                .ok_or(RegistryError::UnknownConnection(id))?;
            if connection.team.as_deref() == Some(team) {
                return Ok(JoinOutcome::AlreadyJoined);
            }
            connection.team.replace(team.to_string())
        };

        if let Some(old) = &previous {
            rooms.remove_from_room(old, &id);
        }
        rooms.teams.entry(team.to_string()).or_default().insert(id);

        match previous {
            Some(from) => {
                tracing::info!(connection = %id, from = %from, to = %team, "[Registry] Connection switched teams");
                Ok(JoinOutcome::Switched { from })
            }
            None => {
                tracing::info!(connection = %id, team = %team, "[Registry] Connection joined team");
                Ok(JoinOutcome::Joined)
            }
        }
    }

    /// Take a connection out of its room without closing it
    pub fn leave(&self, id: ConnectionId) -> Option<String> {
        let mut rooms = self.rooms();
        let team = rooms.connections.get_mut(&id)?.team.take()?;
        rooms.remove_from_room(&team, &id);
        tracing::debug!(connection = %id, team = %team, "[Registry] Connection left team");
        Some(team)
    }

    /// Forget a connection entirely; returns the room it was in
    pub fn disconnect(&self, id: ConnectionId) -> Option<String> {
        let mut rooms = self.rooms();
        let connection = rooms.connections.remove(&id)?;
        if let Some(team) = &connection.team {
            rooms.remove_from_room(team, &id);
        }
        tracing::debug!(connection = %id, "[Registry] Connection removed");
        connection.team
    }

    /// Current lifecycle state of a connection
    pub fn state(&self, id: ConnectionId) -> ConnectionState {
        match self.rooms().connections.get(&id) {
            Some(Connection { team: Some(team), .. }) => ConnectionState::Joined(team.clone()),
            Some(_) => ConnectionState::Connected,
            None => ConnectionState::Disconnected,
        }
    }

    /// Queue a frame on every connection in `team`'s room
    ///
    /// Returns the number of connections the frame was queued for. Connections
    /// whose outbox is closed are pruned; a full outbox drops the frame for
    /// that connection only.
    pub fn broadcast(&self, team: &str, frame: &OutboundFrame) -> usize {
        let mut rooms = self.rooms();
        let Some(members) = rooms.teams.get(team) else {
            return 0;
        };

        let mut delivered = 0usize;
        let mut dead = Vec::new();
        for id in members {
            let Some(connection) = rooms.connections.get(id) else {
                dead.push(*id);
                continue;
            };
            match connection.outbox.try_send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(connection = %id, event = %frame.event, "[Registry] Outbox full, frame dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => dead.push(*id),
            }
        }

        for id in dead {
            tracing::debug!(connection = %id, "[Registry] Pruning closed connection");
            rooms.connections.remove(&id);
            rooms.remove_from_room(team, &id);
        }

        delivered
    }

    /// Remove every connection of `user_id` from `team`'s room
    pub fn evict_member(&self, team: &str, user_id: &str) -> usize {
        let mut rooms = self.rooms();
        let Some(members) = rooms.teams.get(team) else {
            return 0;
        };
        let evicted: Vec<ConnectionId> = members
            .iter()
            .filter(|id| {
                rooms
                    .connections
                    .get(id)
                    .is_some_and(|c| c.user_id == user_id)
            })
            .copied()
            .collect();

        for id in &evicted {
            if let Some(connection) = rooms.connections.get_mut(id) {
                connection.team = None;
            }
            rooms.remove_from_room(team, id);
        }

        if !evicted.is_empty() {
            tracing::info!(team = %team, user = %user_id, count = evicted.len(), "[Registry] Member evicted from team");
        }
        evicted.len()
    }

    /// Empty `team`'s room; its connections stay open but unjoined
    pub fn close_room(&self, team: &str) -> usize {
        let mut rooms = self.rooms();
        let Some(members) = rooms.teams.remove(team) else {
            return 0;
        };
        for id in &members {
            if let Some(connection) = rooms.connections.get_mut(id) {
                connection.team = None;
            }
        }
        tracing::info!(team = %team, count = members.len(), "[Registry] Team room closed");
        members.len()
    }

    /// Connections currently in `team`'s room
    pub fn room_size(&self, team: &str) -> usize {
        self.rooms().teams.get(team).map_or(0, |m| m.len())
    }

    /// Ids of the connections in `team`'s room
    pub fn members(&self, team: &str) -> Vec<ConnectionId> {
        self.rooms()
            .teams
            .get(team)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Open connections, joined or not
    pub fn connection_count(&self) -> usize {
        self.rooms().connections.len()
    }

    /// Teams with at least one joined connection
    pub fn team_count(&self) -> usize {
        self.rooms().teams.len()
    }
}
