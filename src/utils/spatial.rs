//! # Spatial Index
//!
//! Uniform hash grid used to find door sockets near a world position.

use crate::utils::math::Point3;
use std::collections::HashMap;

type Cell = (i64, i64, i64);

/// Buckets values by the grid cell their position falls in.
///
/// Queries scan only the cells overlapped by the query sphere, so a cell size
/// close to the typical query radius keeps lookups cheap.
///
/// # Examples
///
/// ```
/// use mapforge::{Point3, SpatialIndex};
///
/// let mut index = SpatialIndex::new(1.5);
/// index.insert(Point3::new(0.0, 0.0, 5.0), "north door");
/// index.insert(Point3::new(40.0, 0.0, 0.0), "far door");
///
/// let near = index.query_radius(&Point3::new(0.0, 0.0, 4.5), 1.5);
/// assert_eq!(near, vec!["north door"]);
/// ```
#[derive(Debug, Clone)]
pub struct SpatialIndex<T> {
    cell_size: f64,
    cells: HashMap<Cell, Vec<(Point3, T)>>,
    len: usize,
}

impl<T: Clone> SpatialIndex<T> {
    /// Creates an empty index with the given cell edge length.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: cell_size.max(f64::EPSILON),
            cells: HashMap::new(),
            len: 0,
        }
    }

    /// Adds a value at a position.
    pub fn insert(&mut self, position: Point3, value: T) {
        let cell = self.cell_of(&position);
        self.cells.entry(cell).or_default().push((position, value));
        self.len += 1;
    }

    /// Returns every value whose position is within `radius` of `center`,
    /// in a stable order.
    pub fn query_radius(&self, center: &Point3, radius: f64) -> Vec<T> {
        let radius = radius.max(0.0);
        let (lo_x, lo_y, lo_z) = self.cell_of(&Point3::new(
            center.x - radius,
            center.y - radius,
            center.z - radius,
        ));
        let (hi_x, hi_y, hi_z) = self.cell_of(&Point3::new(
            center.x + radius,
            center.y + radius,
            center.z + radius,
        ));

        let mut found = Vec::new();
        for x in lo_x..=hi_x {
            for y in lo_y..=hi_y {
                for z in lo_z..=hi_z {
                    let Some(bucket) = self.cells.get(&(x, y, z)) else {
                        continue;
                    };
                    found.extend(
                        bucket
                            .iter()
                            .filter(|(position, _)| (position - center).norm() <= radius)
                            .map(|(_, value)| value.clone()),
                    );
                }
            }
        }
        found
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn cell_of(&self, position: &Point3) -> Cell {
        (
            (position.x / self.cell_size).floor() as i64,
            (position.y / self.cell_size).floor() as i64,
            (position.z / self.cell_size).floor() as i64,
        )
    }
}
