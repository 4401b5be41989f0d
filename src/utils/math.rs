//! # Placement Mathematics
//!
//! Rigid room transforms and axis-aligned bounding volumes.
//!
//! The world is Y-up. Rooms only ever turn about the vertical axis, so a
//! placement is a translation plus a yaw angle.

use nalgebra::{Isometry3, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Wraps an angle into `[0, 2π)`.
pub fn normalize_yaw(yaw: f64) -> f64 {
    let wrapped = yaw.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Position and heading of a room (or of something attached to a room).
///
/// # Examples
///
/// ```
/// use mapforge::{Point3, RoomTransform, Vector3};
/// use std::f64::consts::FRAC_PI_2;
///
/// let transform = RoomTransform::new(Vector3::new(10.0, 0.0, 0.0), FRAC_PI_2);
/// let moved = transform.transform_point(&Point3::new(0.0, 0.0, 1.0));
/// assert!((moved.x - 11.0).abs() < 1e-9);
/// assert!(moved.z.abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomTransform {
    /// World-space offset of the room origin
    pub translation: Vector3,
    /// Rotation about +Y in radians, kept in `[0, 2π)`
    pub yaw: f64,
}

impl RoomTransform {
    /// Creates a transform, normalizing the yaw.
    pub fn new(translation: Vector3, yaw: f64) -> Self {
        Self {
            translation,
            yaw: normalize_yaw(yaw),
        }
    }

    /// The canonical origin transform: no offset, no rotation.
    pub fn identity() -> Self {
        Self::new(Vector3::zeros(), 0.0)
    }

    /// Converts to an `nalgebra` isometry.
    pub fn isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::from(self.translation),
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), self.yaw),
        )
    }

    /// Maps a local point into the space this transform places it in.
    pub fn transform_point(&self, point: &Point3) -> Point3 {
        self.isometry().transform_point(point)
    }

    /// Rotates a local direction without translating it.
    pub fn transform_vector(&self, vector: &Vector3) -> Vector3 {
        self.isometry().transform_vector(vector)
    }

    /// Places `local` (expressed relative to this transform) in world space.
    pub fn compose(&self, local: &RoomTransform) -> RoomTransform {
        let origin = self.transform_point(&Point3::from(local.translation));
        RoomTransform::new(origin.coords, self.yaw + local.yaw)
    }
}

impl Default for RoomTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// Creates a box from two opposite corners in any order.
    pub fn new(a: Point3, b: Point3) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    /// Smallest box containing every point, or `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point3>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |acc, p| Self {
            min: acc.min.inf(&p),
            max: acc.max.sup(&p),
        }))
    }

    /// Edge lengths along each axis.
    pub fn size(&self) -> Vector3 {
        self.max - self.min
    }

    /// Center of the box.
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// The eight corners of the box.
    pub fn corners(&self) -> [Point3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Point3::new(lo.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(lo.x, hi.y, lo.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(lo.x, lo.y, hi.z),
            Point3::new(hi.x, lo.y, hi.z),
            Point3::new(lo.x, hi.y, hi.z),
            Point3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// World-space box of this local box after applying `transform`.
    pub fn transformed(&self, transform: &RoomTransform) -> Aabb {
        let corners = self.corners().map(|c| transform.transform_point(&c));
        // Eight corners are always present.
        Self::from_points(corners).unwrap_or(*self)
    }

    /// Returns true if the boxes share volume deeper than `tolerance` on
    /// every axis. Boxes that merely touch do not intersect.
    pub fn intersects(&self, other: &Aabb, tolerance: f64) -> bool {
        (0..3).all(|axis| {
            self.min[axis] < other.max[axis] - tolerance
                && other.min[axis] < self.max[axis] - tolerance
        })
    }

    /// Checks whether a point lies inside or on the box.
    pub fn contains(&self, point: &Point3) -> bool {
        (0..3).all(|axis| point[axis] >= self.min[axis] && point[axis] <= self.max[axis])
    }
}
