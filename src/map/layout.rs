//! # Generated Map
//!
//! The output of a generation run: registered rooms, the door connection
//! graph, and a few counters describing how the run went.

use crate::map::graph::DoorGraph;
use crate::map::room::Room;
use crate::utils::math::RoomTransform;
use crate::utils::traversal::{room_path, rooms_connected, RoomAdjacency};
use crate::MapforgeResult;
use log::warn;
use serde::{Deserialize, Serialize};

/// Counters collected while a map was generated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Whole-map restarts before the final attempt
    pub restarts: u32,
    /// Placement steps executed across all attempts
    pub steps: u64,
    /// Rooms replaced by one of their alternatives
    pub substitutions: u32,
}

/// A finished (or, for a terminated editor run, partial) map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedMap {
    /// Rooms in id order
    pub rooms: Vec<Room>,
    /// Door junctions; empty for partial maps
    pub connections: DoorGraph,
    /// Whether the room quota was reached and the map finalized
    pub complete: bool,
    /// Run statistics
    pub report: GenerationReport,
}

impl GeneratedMap {
    /// Gets a room by id.
    pub fn room(&self, id: u32) -> Option<&Room> {
        self.rooms.iter().find(|room| room.id == id)
    }

    /// World-space camera anchor for a room.
    ///
    /// Rooms without an anchor are reported with a warning and skipped.
    pub fn camera_target(&self, id: u32) -> Option<RoomTransform> {
        let room = self.room(id)?;
        let target = room.camera_target();
        if target.is_none() {
            warn!("Room {} '{}' has no camera anchor", room.id, room.name);
        }
        target
    }

    /// Room-to-room adjacency derived from the door graph.
    pub fn room_adjacency(&self) -> RoomAdjacency {
        self.connections.room_adjacency()
    }

    /// Returns true if every room can be reached from every other room.
    pub fn is_connected(&self) -> bool {
        rooms_connected(&self.room_adjacency(), self.rooms.iter().map(|room| room.id))
    }

    /// Shortest chain of room ids from one room to another.
    pub fn path_between(&self, from: u32, to: u32) -> Option<Vec<u32>> {
        room_path(&self.room_adjacency(), from, to)
    }

    /// Pairs of rooms whose world bounds intersect deeper than `tolerance`.
    pub fn overlapping_pairs(&self, tolerance: f64) -> Vec<(u32, u32)> {
        let mut pairs = Vec::new();
        for (index, room) in self.rooms.iter().enumerate() {
            for other in &self.rooms[index + 1..] {
                if room.overlaps(other, tolerance) {
                    pairs.push((room.id, other.id));
                }
            }
        }
        pairs
    }

    /// Serializes the map as pretty-printed JSON.
    pub fn to_json_string(&self) -> MapforgeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::door::DoorRef;
    use crate::map::table::{RoomTable, TemplateId};
    use crate::utils::math::Vector3;

    fn two_room_map() -> GeneratedMap {
        let table = RoomTable::sample();
        let mut hall = Room::instantiate(TemplateId(0), table.template(TemplateId(0)).unwrap());
        hall.init(0, false);
        let mut corridor = Room::instantiate(TemplateId(1), table.template(TemplateId(1)).unwrap());
        corridor.init(1, false);
        corridor.set_transform(RoomTransform::new(Vector3::new(0.0, 0.0, 11.0), 0.0));

        let mut connections = DoorGraph::new();
        connections.connect_all(&[DoorRef::new(0, 0), DoorRef::new(1, 1)]);

        GeneratedMap {
            rooms: vec![hall, corridor],
            connections,
            complete: true,
            report: GenerationReport::default(),
        }
    }

    #[test]
    fn test_room_lookup() {
        let map = two_room_map();
        assert_eq!(map.room(1).unwrap().name, "corridor_ns");
        assert!(map.room(5).is_none());
    }

    #[test]
    fn test_connectivity_queries() {
        let map = two_room_map();
        assert!(map.is_connected());
        assert_eq!(map.path_between(0, 1), Some(vec![0, 1]));
        assert!(map.overlapping_pairs(0.01).is_empty());
    }

    #[test]
    fn test_camera_target_skips_rooms_without_anchor() {
        let map = two_room_map();
        assert!(map.camera_target(0).is_some());
        assert!(map.camera_target(1).is_none());
        assert!(map.camera_target(9).is_none());
    }

    #[test]
    fn test_json_output() {
        let map = two_room_map();
        let json = map.to_json_string().unwrap();
        let parsed: GeneratedMap = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, map);
    }
}
