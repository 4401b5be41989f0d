//! # Room Graph Traversal
//!
//! Reachability queries over the room adjacency produced by door wiring.

use pathfinding::prelude::{bfs, bfs_reach};
use std::collections::{BTreeMap, BTreeSet};

/// Room adjacency keyed by room id.
pub type RoomAdjacency = BTreeMap<u32, BTreeSet<u32>>;

fn neighbours(adjacency: &RoomAdjacency, room: u32) -> Vec<u32> {
    adjacency
        .get(&room)
        .map(|set| set.iter().copied().collect())
        .unwrap_or_default()
}

/// Every room reachable from `start`, including `start` itself.
pub fn reachable_rooms(adjacency: &RoomAdjacency, start: u32) -> BTreeSet<u32> {
    bfs_reach(start, |&room| neighbours(adjacency, room)).collect()
}

/// Returns true if every listed room can reach every other one.
///
/// An empty list is trivially connected.
pub fn rooms_connected<I>(adjacency: &RoomAdjacency, rooms: I) -> bool
where
    I: IntoIterator<Item = u32>,
{
    let rooms: BTreeSet<u32> = rooms.into_iter().collect();
    let Some(&start) = rooms.iter().next() else {
        return true;
    };
    rooms.is_subset(&reachable_rooms(adjacency, start))
}

/// Shortest sequence of rooms leading from `from` to `to`, both included.
pub fn room_path(adjacency: &RoomAdjacency, from: u32, to: u32) -> Option<Vec<u32>> {
    bfs(&from, |&room| neighbours(adjacency, room), |&room| room == to)
}
