//! # Rooms
//!
//! A room is one placed (or candidate) instance of a room template. It owns a
//! copy of its template's doors and bounds, a world transform, the identity it
//! was registered under, and the set of doors consumed by connections.

use crate::map::door::{Door, DoorAnchor};
use crate::map::table::{RoomTemplate, TemplateId};
use crate::utils::math::{Aabb, RoomTransform};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A room instance created from a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Template this room was instantiated from
    pub template: TemplateId,
    /// Template name, kept for diagnostics
    pub name: String,
    /// Door sockets, indexed by position in this list
    pub doors: Vec<Door>,
    /// Room-local bounding volume
    pub bounds: Aabb,
    /// World placement; identity until the placement engine moves it
    pub transform: RoomTransform,
    /// Position of this room in the generation sequence
    pub id: u32,
    /// True if the room was attached to something other than the previous room
    pub teleported: bool,
    /// Indices of doors consumed by a connection
    pub used_doors: BTreeSet<usize>,
    /// Optional room-local camera anchor
    pub camera_anchor: Option<RoomTransform>,
    /// Index of the fixed-room rule this room satisfies, if any
    #[serde(default)]
    pub fixed_rule: Option<usize>,
}

impl Room {
    /// Creates an unplaced room from a template.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapforge::{Room, RoomTable, TemplateId};
    ///
    /// let table = RoomTable::sample();
    /// let template = table.template(TemplateId(0)).unwrap();
    /// let room = Room::instantiate(TemplateId(0), template);
    /// assert_eq!(room.doors.len(), template.doors.len());
    /// assert!(room.used_doors.is_empty());
    /// ```
    pub fn instantiate(template: TemplateId, source: &RoomTemplate) -> Self {
        Self {
            template,
            name: source.name.clone(),
            doors: source.doors.clone(),
            bounds: source.bounds,
            transform: RoomTransform::identity(),
            id: 0,
            teleported: false,
            used_doors: BTreeSet::new(),
            camera_anchor: source.camera_anchor,
            fixed_rule: None,
        }
    }

    /// Assigns the identity the room is registered under.
    pub fn init(&mut self, id: u32, teleported: bool) {
        self.id = id;
        self.teleported = teleported;
    }

    /// Moves the room to a new world placement.
    pub fn set_transform(&mut self, transform: RoomTransform) {
        self.transform = transform;
    }

    /// Picks a door index uniformly from the full door set.
    ///
    /// Returns `None` only for rooms without doors.
    pub fn random_door<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        if self.doors.is_empty() {
            return None;
        }
        Some(rng.gen_range(0..self.doors.len()))
    }

    /// Gets a door by index.
    pub fn door(&self, index: usize) -> Option<&Door> {
        self.doors.get(index)
    }

    /// World-space anchor of a door under the current transform.
    pub fn door_anchor(&self, index: usize) -> Option<DoorAnchor> {
        self.doors
            .get(index)
            .map(|door| door.world_anchor(&self.transform))
    }

    /// Checks if a door has been consumed by a connection.
    pub fn is_door_used(&self, index: usize) -> bool {
        self.used_doors.contains(&index)
    }

    /// Marks a door as consumed.
    pub fn mark_door_used(&mut self, index: usize) {
        if index < self.doors.len() {
            self.used_doors.insert(index);
        }
    }

    /// Doors consumed by connections, in index order.
    pub fn used_door_list(&self) -> Vec<&Door> {
        self.used_doors
            .iter()
            .filter_map(|&index| self.doors.get(index))
            .collect()
    }

    /// Bounding volume in world space.
    pub fn world_bounds(&self) -> Aabb {
        self.bounds.transformed(&self.transform)
    }

    /// Checks if this room overlaps with another room.
    pub fn overlaps(&self, other: &Room, tolerance: f64) -> bool {
        self.world_bounds()
            .intersects(&other.world_bounds(), tolerance)
    }

    /// Returns true if the room can stay where it is without overlapping any
    /// of `placed`.
    pub fn can_place(&self, placed: &[Room], tolerance: f64) -> bool {
        let bounds = self.world_bounds();
        placed
            .iter()
            .all(|other| !bounds.intersects(&other.world_bounds(), tolerance))
    }

    /// Returns true if `alternative` describes exactly the doors this room
    /// ended up using.
    ///
    /// Every alternative door must pair with a distinct used door (position
    /// within `precision`, same direction, same kind) and no used door may be
    /// left over.
    pub fn same_doors(&self, alternative: &[Door], precision: f64) -> bool {
        if alternative.len() != self.used_doors.len() {
            return false;
        }

        let mut unmatched = self.used_door_list();
        for candidate in alternative {
            if let Some(found) = unmatched
                .iter()
                .position(|door| candidate.matches(door, precision))
            {
                unmatched.swap_remove(found);
            }
        }
        unmatched.is_empty()
    }

    /// World-space camera anchor, if the template declares one.
    pub fn camera_target(&self) -> Option<RoomTransform> {
        self.camera_anchor
            .map(|anchor| self.transform.compose(&anchor))
    }
}
