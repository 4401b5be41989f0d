//! # Placement Engine
//!
//! Attaches a candidate room to a door of an already placed room.
//!
//! Placement is split in two phases: [`PlacementEngine::propose_transform`]
//! works out where the candidate would go without touching anything, and
//! [`PlacementEngine::commit_and_validate`] moves the candidate there and
//! checks it against every placed room. A failed placement is an ordinary
//! outcome; the caller decides whether to retry or discard the candidate.

use crate::generation::GenerationConfig;
use crate::map::{DoorAnchor, Room};
use crate::utils::math::{RoomTransform, Vector3};
use rand::seq::SliceRandom;
use rand::Rng;
use std::f64::consts::{FRAC_PI_2, PI};

/// A door of a placed room, addressed by the room's index in the placed list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorSocket {
    /// Index into the placed-room list
    pub room: usize,
    /// Door index on that room
    pub door: usize,
}

/// Where a candidate would go and which doors would join.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proposal {
    /// World placement for the candidate
    pub transform: RoomTransform,
    /// Candidate door that meets the anchor
    pub room_door: usize,
}

/// Computes and validates room placements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementEngine {
    /// Whether candidates may be turned to line their doors up
    pub allow_rotation: bool,
    /// Slack subtracted from bounds before testing overlap
    pub overlap_tolerance: f64,
}

fn snap_to_quarter_turn(yaw: f64) -> f64 {
    (yaw / FRAC_PI_2).round() * FRAC_PI_2
}

impl PlacementEngine {
    /// Creates an engine with explicit settings.
    pub fn new(allow_rotation: bool, overlap_tolerance: f64) -> Self {
        Self {
            allow_rotation,
            overlap_tolerance,
        }
    }

    /// Creates an engine from generation settings.
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self::new(config.allow_rotation, config.overlap_tolerance)
    }

    /// Puts the first room of a map at the origin with no rotation.
    pub fn place_first(&self, room: &mut Room) {
        room.set_transform(RoomTransform::identity());
    }

    /// Room yaw that makes `door_index` of `room` face `anchor`, or `None` if
    /// that door cannot meet the anchor.
    fn yaw_for(&self, room: &Room, door_index: usize, anchor: &DoorAnchor, kind: &str) -> Option<f64> {
        if room.is_door_used(door_index) {
            return None;
        }
        let door = room.door(door_index)?;
        if door.kind != kind {
            return None;
        }

        if self.allow_rotation {
            Some(snap_to_quarter_turn(anchor.yaw + PI - door.direction.yaw()))
        } else if door.direction == anchor.facing.opposite() {
            Some(0.0)
        } else {
            None
        }
    }

    /// Computes where `room` would sit if attached to `anchor_door` of
    /// `anchor_room`.
    ///
    /// Candidate doors are tried in random order and the first compatible one
    /// is used. Returns `None` if the anchor door is already taken or no door
    /// of the candidate can meet it. Nothing is modified.
    pub fn propose_transform<R: Rng + ?Sized>(
        &self,
        room: &Room,
        anchor_room: &Room,
        anchor_door: usize,
        rng: &mut R,
    ) -> Option<Proposal> {
        if anchor_room.is_door_used(anchor_door) {
            return None;
        }
        let kind = &anchor_room.door(anchor_door)?.kind;
        let anchor = anchor_room.door_anchor(anchor_door)?;

        let mut order: Vec<usize> = (0..room.doors.len()).collect();
        order.shuffle(rng);

        order.into_iter().find_map(|door_index| {
            let yaw = self.yaw_for(room, door_index, &anchor, kind)?;
            let door = room.door(door_index)?;
            let turned = RoomTransform::new(Vector3::zeros(), yaw).transform_point(&door.position);
            Some(Proposal {
                transform: RoomTransform::new(anchor.position - turned, yaw),
                room_door: door_index,
            })
        })
    }

    /// Moves `room` to the proposed transform and checks it against `placed`.
    ///
    /// On success the candidate's joining door is marked used. On failure the
    /// room keeps the proposed transform but nothing else changes.
    pub fn commit_and_validate(&self, room: &mut Room, proposal: &Proposal, placed: &[Room]) -> bool {
        room.set_transform(proposal.transform);
        if !room.can_place(placed, self.overlap_tolerance) {
            return false;
        }
        room.mark_door_used(proposal.room_door);
        true
    }

    /// Tries to place `room` against `anchor`.
    ///
    /// An empty map always accepts the room at the origin. Otherwise both
    /// joining doors are marked used on success.
    pub fn try_place<R: Rng + ?Sized>(
        &self,
        room: &mut Room,
        anchor: Option<AnchorSocket>,
        placed: &mut [Room],
        rng: &mut R,
    ) -> bool {
        if placed.is_empty() {
            self.place_first(room);
            return true;
        }

        let Some(socket) = anchor else {
            return false;
        };
        let Some(anchor_room) = placed.get(socket.room) else {
            return false;
        };
        let Some(proposal) = self.propose_transform(room, anchor_room, socket.door, rng) else {
            return false;
        };
        if !self.commit_and_validate(room, &proposal, placed) {
            return false;
        }

        placed[socket.room].mark_door_used(socket.door);
        true
    }
}

impl Default for PlacementEngine {
    fn default() -> Self {
        Self::from_config(&GenerationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Door, DoorDirection, RoomTemplate, TemplateId};
    use crate::utils::math::{Aabb, Point3};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn single_door_room(direction: DoorDirection, position: Point3) -> Room {
        let template = RoomTemplate::new(
            "cell",
            Aabb::new(Point3::new(-5.0, 0.0, -5.0), Point3::new(5.0, 4.0, 5.0)),
            vec![Door::standard(position, direction)],
        );
        Room::instantiate(TemplateId(0), &template)
    }

    #[test]
    fn test_first_room_goes_to_origin() {
        let engine = PlacementEngine::default();
        let mut room = single_door_room(DoorDirection::North, Point3::new(0.0, 0.0, 5.0));
        room.set_transform(RoomTransform::new(Vector3::new(3.0, 0.0, 3.0), 1.0));
        let mut rng = StdRng::seed_from_u64(1);

        assert!(engine.try_place(&mut room, None, &mut [], &mut rng));
        assert_eq!(room.transform, RoomTransform::identity());
    }

    #[test]
    fn test_opposite_doors_join_without_rotation() {
        let engine = PlacementEngine::new(false, 0.01);
        let mut placed = vec![single_door_room(DoorDirection::North, Point3::new(0.0, 0.0, 5.0))];
        let mut candidate = single_door_room(DoorDirection::South, Point3::new(0.0, 0.0, -5.0));
        let mut rng = StdRng::seed_from_u64(2);

        let anchor = Some(AnchorSocket { room: 0, door: 0 });
        assert!(engine.try_place(&mut candidate, anchor, &mut placed, &mut rng));

        assert_relative_eq!(candidate.transform.translation.z, 10.0, epsilon = 1e-9);
        assert_eq!(candidate.transform.yaw, 0.0);
        assert!(candidate.is_door_used(0));
        assert!(placed[0].is_door_used(0));

        let joined = candidate.door_anchor(0).unwrap();
        let anchor = placed[0].door_anchor(0).unwrap();
        assert_relative_eq!((joined.position - anchor.position).norm(), 0.0, epsilon = 1e-9);
        assert_eq!(joined.facing, anchor.facing.opposite());
    }

    #[test]
    fn test_same_facing_doors_need_rotation() {
        let fixed = PlacementEngine::new(false, 0.01);
        let turning = PlacementEngine::new(true, 0.01);
        let anchor_room = single_door_room(DoorDirection::North, Point3::new(0.0, 0.0, 5.0));
        let candidate = single_door_room(DoorDirection::North, Point3::new(0.0, 0.0, 5.0));
        let mut rng = StdRng::seed_from_u64(3);

        assert!(fixed.propose_transform(&candidate, &anchor_room, 0, &mut rng).is_none());

        let proposal = turning
            .propose_transform(&candidate, &anchor_room, 0, &mut rng)
            .unwrap();
        assert_relative_eq!(proposal.transform.yaw, PI, epsilon = 1e-9);
        assert_relative_eq!(proposal.transform.translation.z, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_door_kinds_must_match() {
        let engine = PlacementEngine::new(true, 0.01);
        let anchor_room = single_door_room(DoorDirection::North, Point3::new(0.0, 0.0, 5.0));
        let template = RoomTemplate::new(
            "gate",
            Aabb::new(Point3::new(-5.0, 0.0, -5.0), Point3::new(5.0, 4.0, 5.0)),
            vec![Door::new(Point3::new(0.0, 0.0, -5.0), DoorDirection::South, "portcullis")],
        );
        let candidate = Room::instantiate(TemplateId(1), &template);
        let mut rng = StdRng::seed_from_u64(4);

        assert!(engine.propose_transform(&candidate, &anchor_room, 0, &mut rng).is_none());
    }

    #[test]
    fn test_used_anchor_door_is_rejected() {
        let engine = PlacementEngine::default();
        let mut anchor_room = single_door_room(DoorDirection::North, Point3::new(0.0, 0.0, 5.0));
        anchor_room.mark_door_used(0);
        let candidate = single_door_room(DoorDirection::South, Point3::new(0.0, 0.0, -5.0));
        let mut rng = StdRng::seed_from_u64(5);

        assert!(engine.propose_transform(&candidate, &anchor_room, 0, &mut rng).is_none());
    }

    #[test]
    fn test_overlap_rejects_commit() {
        let engine = PlacementEngine::default();
        // The anchor door sits inside its own room, so anything attached there overlaps it.
        let template = RoomTemplate::new(
            "deep",
            Aabb::new(Point3::new(-5.0, 0.0, -5.0), Point3::new(5.0, 4.0, 10.0)),
            vec![Door::standard(Point3::new(0.0, 0.0, 2.0), DoorDirection::North)],
        );
        let mut placed = vec![Room::instantiate(TemplateId(0), &template)];
        let mut candidate = single_door_room(DoorDirection::South, Point3::new(0.0, 0.0, -5.0));
        let mut rng = StdRng::seed_from_u64(6);

        let anchor = Some(AnchorSocket { room: 0, door: 0 });
        assert!(!engine.try_place(&mut candidate, anchor, &mut placed, &mut rng));
        assert!(candidate.used_doors.is_empty());
        assert!(placed[0].used_doors.is_empty());
    }

    #[test]
    fn test_propose_is_pure() {
        let engine = PlacementEngine::default();
        let anchor_room = single_door_room(DoorDirection::North, Point3::new(0.0, 0.0, 5.0));
        let candidate = single_door_room(DoorDirection::South, Point3::new(0.0, 0.0, -5.0));
        let before = candidate.clone();
        let mut rng = StdRng::seed_from_u64(7);

        let proposal = engine.propose_transform(&candidate, &anchor_room, 0, &mut rng);
        assert!(proposal.is_some());
        assert_eq!(candidate, before);
    }

    #[test]
    fn test_missing_anchor_fails_on_non_empty_map() {
        let engine = PlacementEngine::default();
        let mut placed = vec![single_door_room(DoorDirection::North, Point3::new(0.0, 0.0, 5.0))];
        let mut candidate = single_door_room(DoorDirection::South, Point3::new(0.0, 0.0, -5.0));
        let mut rng = StdRng::seed_from_u64(8);

        assert!(!engine.try_place(&mut candidate, None, &mut placed, &mut rng));
        let out_of_range = Some(AnchorSocket { room: 3, door: 0 });
        assert!(!engine.try_place(&mut candidate, out_of_range, &mut placed, &mut rng));
    }
}
