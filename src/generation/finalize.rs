//! # Finalization
//!
//! Runs once a map has all its rooms: rooms whose used doors exactly match
//! an alternative template are swapped for that alternative, then every door
//! is wired to the doors sharing its junction.

use crate::generation::GenerationConfig;
use crate::map::{DoorGraph, DoorRef, Room, RoomTable};
use crate::utils::spatial::SpatialIndex;
use log::debug;

/// Rooms and door graph of a finished map.
#[derive(Debug, Clone, PartialEq)]
pub struct Finalized {
    /// Rooms after alternative substitution, in id order
    pub rooms: Vec<Room>,
    /// Door junctions
    pub connections: DoorGraph,
    /// Number of rooms replaced by an alternative
    pub substitutions: u32,
}

/// Swaps each room for the first alternative whose door set equals the
/// room's used doors.
///
/// The replacement keeps the replaced room's placement, identity and fixed
/// rule, and all of its doors count as used. Returns the number of substitutions.
pub fn resolve_alternatives(table: &RoomTable, rooms: &mut [Room]) -> u32 {
    let mut substitutions = 0;

    for room in rooms.iter_mut() {
        let Some(template) = table.template(room.template) else {
            continue;
        };

        let replacement = template.alternatives.iter().find_map(|&alternative| {
            let source = table.template(alternative)?;
            room.same_doors(&source.doors, template.alternative_precision)
                .then(|| Room::instantiate(alternative, source))
        });

        if let Some(mut replacement) = replacement {
            debug!(
                "Room {} '{}' replaced by '{}'",
                room.id, room.name, replacement.name
            );
            replacement.set_transform(room.transform);
            replacement.init(room.id, room.teleported);
            replacement.fixed_rule = room.fixed_rule;
            for door in 0..replacement.doors.len() {
                replacement.mark_door_used(door);
            }
            *room = replacement;
            substitutions += 1;
        }
    }

    substitutions
}

/// Links every door to all other doors within `radius` of it.
pub fn connect_doors(rooms: &[Room], radius: f64) -> DoorGraph {
    let mut index = SpatialIndex::new(radius);
    let mut sockets = Vec::new();
    for room in rooms {
        for door in 0..room.doors.len() {
            if let Some(anchor) = room.door_anchor(door) {
                let socket = DoorRef::new(room.id, door);
                index.insert(anchor.position, socket);
                sockets.push((socket, anchor.position));
            }
        }
    }

    let mut graph = DoorGraph::new();
    for (socket, position) in sockets {
        let mut junction = index.query_radius(&position, radius);
        if !junction.contains(&socket) {
            junction.push(socket);
        }
        junction.sort();
        junction.dedup();
        graph.connect_all(&junction);
    }
    graph
}

/// Substitutes alternatives and wires doors for a completed room list.
pub fn finalize(table: &RoomTable, mut rooms: Vec<Room>, config: &GenerationConfig) -> Finalized {
    let substitutions = resolve_alternatives(table, &mut rooms);
    let connections = connect_doors(&rooms, config.connection_radius);
    Finalized {
        rooms,
        connections,
        substitutions,
    }
}
