//! # Door Graph
//!
//! Undirected record of which doors share a junction once a map is finished.

use crate::map::door::DoorRef;
use crate::utils::traversal::RoomAdjacency;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One door and everything it opens onto. Used as the serialized form of
/// [`DoorGraph`] because JSON object keys must be strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorJunction {
    pub door: DoorRef,
    pub connected: Vec<DoorRef>,
}

/// Symmetric door-to-door connection relation.
///
/// # Examples
///
/// ```
/// use mapforge::{DoorGraph, DoorRef};
///
/// let mut graph = DoorGraph::new();
/// graph.connect_all(&[DoorRef::new(0, 0), DoorRef::new(1, 2)]);
///
/// assert!(graph.are_connected(DoorRef::new(1, 2), DoorRef::new(0, 0)));
/// assert!(graph.is_symmetric());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<DoorJunction>", into = "Vec<DoorJunction>")]
pub struct DoorGraph {
    links: BTreeMap<DoorRef, BTreeSet<DoorRef>>,
}

impl DoorGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every door in `group` as connected to every other member.
    pub fn connect_all(&mut self, group: &[DoorRef]) {
        for &door in group {
            let entry = self.links.entry(door).or_default();
            entry.extend(group.iter().copied().filter(|&other| other != door));
        }
    }

    /// Doors sharing a junction with `door`.
    pub fn connections(&self, door: DoorRef) -> impl Iterator<Item = DoorRef> + '_ {
        self.links.get(&door).into_iter().flatten().copied()
    }

    /// Checks if two doors share a junction.
    pub fn are_connected(&self, a: DoorRef, b: DoorRef) -> bool {
        self.links
            .get(&a)
            .is_some_and(|connected| connected.contains(&b))
    }

    /// Rooms reachable through `door`, excluding the door's own room.
    pub fn rooms_through(&self, door: DoorRef) -> BTreeSet<u32> {
        self.connections(door)
            .map(|other| other.room)
            .filter(|&room| room != door.room)
            .collect()
    }

    /// Collapses door links into room-to-room adjacency.
    pub fn room_adjacency(&self) -> RoomAdjacency {
        let mut adjacency = RoomAdjacency::new();
        for (door, connected) in &self.links {
            let neighbours = adjacency.entry(door.room).or_default();
            neighbours.extend(
                connected
                    .iter()
                    .map(|other| other.room)
                    .filter(|&room| room != door.room),
            );
        }
        adjacency
    }

    /// Returns true if every link has its mirror.
    pub fn is_symmetric(&self) -> bool {
        self.links.iter().all(|(door, connected)| {
            connected.iter().all(|other| self.are_connected(*other, *door))
        })
    }

    /// Number of doors with at least one recorded junction entry.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Returns true if no junction has been recorded.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Iterates over doors and their connections.
    pub fn iter(&self) -> impl Iterator<Item = (DoorRef, &BTreeSet<DoorRef>)> + '_ {
        self.links.iter().map(|(door, connected)| (*door, connected))
    }
}

impl From<Vec<DoorJunction>> for DoorGraph {
    fn from(junctions: Vec<DoorJunction>) -> Self {
        let links = junctions
            .into_iter()
            .map(|junction| (junction.door, junction.connected.into_iter().collect()))
            .collect();
        Self { links }
    }
}

impl From<DoorGraph> for Vec<DoorJunction> {
    fn from(graph: DoorGraph) -> Self {
        graph
            .links
            .into_iter()
            .map(|(door, connected)| DoorJunction {
                door,
                connected: connected.into_iter().collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_all_is_symmetric() {
        let mut graph = DoorGraph::new();
        let group = [DoorRef::new(0, 1), DoorRef::new(1, 3), DoorRef::new(2, 0)];
        graph.connect_all(&group);

        for &a in &group {
            for &b in &group {
                assert_eq!(graph.are_connected(a, b), a != b);
            }
        }
        assert!(graph.is_symmetric());
    }

    #[test]
    fn test_lone_door_has_no_connections() {
        let mut graph = DoorGraph::new();
        graph.connect_all(&[DoorRef::new(4, 0)]);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.connections(DoorRef::new(4, 0)).count(), 0);
    }

    #[test]
    fn test_room_adjacency() {
        let mut graph = DoorGraph::new();
        graph.connect_all(&[DoorRef::new(0, 0), DoorRef::new(1, 2)]);
        graph.connect_all(&[DoorRef::new(1, 0), DoorRef::new(2, 1)]);
        graph.connect_all(&[DoorRef::new(1, 2), DoorRef::new(0, 0)]);

        let adjacency = graph.room_adjacency();
        assert_eq!(adjacency[&0], BTreeSet::from([1]));
        assert_eq!(adjacency[&1], BTreeSet::from([0, 2]));
        assert_eq!(adjacency[&2], BTreeSet::from([1]));
        assert_eq!(graph.rooms_through(DoorRef::new(1, 0)), BTreeSet::from([2]));
    }

    #[test]
    fn test_asymmetric_graph_detected() {
        let graph = DoorGraph::from(vec![DoorJunction {
            door: DoorRef::new(0, 0),
            connected: vec![DoorRef::new(1, 0)],
        }]);
        assert!(!graph.is_symmetric());
    }

    #[test]
    fn test_serialized_form() {
        let mut graph = DoorGraph::new();
        graph.connect_all(&[DoorRef::new(0, 0), DoorRef::new(1, 0)]);
        let json = serde_json::to_string(&graph).unwrap();
        let parsed: DoorGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, graph);
    }
}
