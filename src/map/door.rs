//! # Doors
//!
//! Door sockets: the typed, directed attachment points through which rooms
//! connect to each other.

use crate::utils::math::{normalize_yaw, Point3, RoomTransform, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

/// Horizontal direction a door opens towards, in room-local space.
///
/// North is +Z, East is +X.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DoorDirection {
    North,
    East,
    South,
    West,
}

impl DoorDirection {
    /// Heading of this direction as a yaw about +Y.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapforge::DoorDirection;
    ///
    /// assert_eq!(DoorDirection::North.yaw(), 0.0);
    /// assert_eq!(DoorDirection::from_yaw(DoorDirection::West.yaw()), DoorDirection::West);
    /// ```
    pub fn yaw(self) -> f64 {
        match self {
            DoorDirection::North => 0.0,
            DoorDirection::East => FRAC_PI_2,
            DoorDirection::South => PI,
            DoorDirection::West => 3.0 * FRAC_PI_2,
        }
    }

    /// Snaps a yaw to the nearest cardinal direction.
    pub fn from_yaw(yaw: f64) -> Self {
        let quarter = (normalize_yaw(yaw) / FRAC_PI_2).round() as i64;
        match quarter.rem_euclid(4) {
            0 => DoorDirection::North,
            1 => DoorDirection::East,
            2 => DoorDirection::South,
            _ => DoorDirection::West,
        }
    }

    /// The direction facing the other way.
    pub fn opposite(self) -> Self {
        match self {
            DoorDirection::North => DoorDirection::South,
            DoorDirection::East => DoorDirection::West,
            DoorDirection::South => DoorDirection::North,
            DoorDirection::West => DoorDirection::East,
        }
    }

    /// This direction after turning the owning room by `yaw`.
    pub fn rotated(self, yaw: f64) -> Self {
        Self::from_yaw(self.yaw() + yaw)
    }

    /// Unit vector pointing out of the door.
    pub fn facing(self) -> Vector3 {
        let yaw = self.yaw();
        Vector3::new(yaw.sin(), 0.0, yaw.cos())
    }

    /// Returns all 4 directions.
    pub fn all() -> [DoorDirection; 4] {
        [
            DoorDirection::North,
            DoorDirection::East,
            DoorDirection::South,
            DoorDirection::West,
        ]
    }
}

fn default_door_kind() -> String {
    "standard".to_string()
}

/// A door socket on a room template.
///
/// The position is room-local; it only becomes a world position once the
/// owning room has a transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Door {
    /// Room-local position of the door opening
    pub position: Point3,
    /// Room-local direction the door opens towards
    pub direction: DoorDirection,
    /// Compatibility tag; only doors of the same kind attach
    #[serde(default = "default_door_kind")]
    pub kind: String,
}

impl Door {
    /// Creates a new door.
    pub fn new(position: Point3, direction: DoorDirection, kind: impl Into<String>) -> Self {
        Self {
            position,
            direction,
            kind: kind.into(),
        }
    }

    /// Creates a door of the default `"standard"` kind.
    pub fn standard(position: Point3, direction: DoorDirection) -> Self {
        Self::new(position, direction, default_door_kind())
    }

    /// Room-local transform of the door socket.
    pub fn local_transform(&self) -> RoomTransform {
        RoomTransform::new(self.position.coords, self.direction.yaw())
    }

    /// World-space anchor of this door for a room placed at `room`.
    pub fn world_anchor(&self, room: &RoomTransform) -> DoorAnchor {
        let world = room.compose(&self.local_transform());
        DoorAnchor {
            position: Point3::from(world.translation),
            facing: DoorDirection::from_yaw(world.yaw),
            yaw: world.yaw,
        }
    }

    /// Returns true if `other` describes the same socket: local positions
    /// within `precision`, same direction and same kind.
    pub fn matches(&self, other: &Door, precision: f64) -> bool {
        (self.position - other.position).norm() <= precision
            && self.direction == other.direction
            && self.kind == other.kind
    }
}

/// A door resolved into world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoorAnchor {
    /// World position of the door opening
    pub position: Point3,
    /// Cardinal direction the door faces in the world
    pub facing: DoorDirection,
    /// Exact world yaw of the door
    pub yaw: f64,
}

/// Addresses one door of one placed room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DoorRef {
    /// Id of the placed room
    pub room: u32,
    /// Index of the door within that room
    pub door: usize,
}

impl DoorRef {
    /// Creates a new door reference.
    pub fn new(room: u32, door: usize) -> Self {
        Self { room, door }
    }
}
