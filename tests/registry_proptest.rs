//! Property-based tests for the connection-to-team registry
//!
//! Random join / leave / disconnect sequences must keep every connection in at
//! most one room, and room membership must agree with connection state.

#![cfg(feature = "ssr")]

use proptest::prelude::*;
use std::collections::HashMap;
use tokio::sync::mpsc;

use teamhub::backend::realtime::{ConnectionId, ConnectionState, TeamRegistry};
use teamhub::shared::OutboundFrame;

const TEAMS: [&str; 3] = ["alpha", "beta", "gamma"];
const CONNECTIONS: usize = 4;

#[derive(Debug, Clone)]
enum Op {
    Join(usize, usize),
    Leave(usize),
    Disconnect(usize),
    Evict(usize, usize),
    Close(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..CONNECTIONS, 0..TEAMS.len()).prop_map(|(c, t)| Op::Join(c, t)),
        1 => (0..CONNECTIONS).prop_map(Op::Leave),
        1 => (0..CONNECTIONS).prop_map(Op::Disconnect),
        1 => (0..CONNECTIONS, 0..TEAMS.len()).prop_map(|(c, t)| Op::Evict(c, t)),
        1 => (0..TEAMS.len()).prop_map(Op::Close),
    ]
}

fn user(index: usize) -> String {
    format!("u{}", index)
}

proptest! {
    #[test]
    fn rooms_agree_with_connection_state(ops in prop::collection::vec(op(), 1..60)) {
        let registry = TeamRegistry::new();
        let mut outboxes: Vec<mpsc::Receiver<OutboundFrame>> = Vec::new();
        let ids: Vec<ConnectionId> = (0..CONNECTIONS)
            .map(|i| {
                let (tx, rx) = mpsc::channel(1);
                outboxes.push(rx);
                registry.register(user(i), tx)
            })
            .collect();

        // Model: connection index -> team it should be in
        let mut model: HashMap<usize, Option<usize>> = (0..CONNECTIONS).map(|i| (i, None)).collect();

        for op in ops {
            match op {
                Op::Join(c, t) => {
                    let joined = registry.join(ids[c], TEAMS[t]).is_ok();
                    if let Some(slot) = model.get_mut(&c) {
                        prop_assert!(joined);
                        *slot = Some(t);
                    } else {
                        prop_assert!(!joined);
                    }
                }
                Op::Leave(c) => {
                    registry.leave(ids[c]);
                    if let Some(slot) = model.get_mut(&c) {
                        *slot = None;
                    }
                }
                Op::Disconnect(c) => {
                    registry.disconnect(ids[c]);
                    model.remove(&c);
                }
                Op::Evict(c, t) => {
                    registry.evict_member(TEAMS[t], &user(c));
                    if let Some(slot) = model.get_mut(&c) {
                        if *slot == Some(t) {
                            *slot = None;
                        }
                    }
                }
                Op::Close(t) => {
                    registry.close_room(TEAMS[t]);
                    for slot in model.values_mut() {
                        if *slot == Some(t) {
                            *slot = None;
                        }
                    }
                }
            }

            for (c, id) in ids.iter().enumerate() {
                let rooms: Vec<usize> = (0..TEAMS.len())
                    .filter(|&t| registry.members(TEAMS[t]).contains(id))
                    .collect();
                prop_assert!(rooms.len() <= 1);

                let expected = match model.get(&c) {
                    None => ConnectionState::Disconnected,
                    Some(None) => ConnectionState::Connected,
                    Some(Some(t)) => ConnectionState::Joined(TEAMS[*t].to_string()),
                };
                prop_assert_eq!(registry.state(*id), expected);
                prop_assert_eq!(rooms.first().copied(), model.get(&c).copied().flatten());
            }

            prop_assert_eq!(registry.connection_count(), model.len());
            let occupied = (0..TEAMS.len()).filter(|&t| registry.room_size(TEAMS[t]) > 0).count();
            prop_assert_eq!(registry.team_count(), occupied);
        }
    }
}
