//! # Room Table
//!
//! The static input to generation: room templates, the general pool random
//! rooms are drawn from, and the fixed-room rules that pin specific templates
//! to index ranges of the generation sequence.

use crate::map::door::{Door, DoorDirection};
use crate::utils::math::{Aabb, Point3, RoomTransform, Vector3};
use crate::{config, MapforgeError, MapforgeResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Index of a template inside a [`RoomTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(pub usize);

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

fn default_alternative_precision() -> f64 {
    config::DEFAULT_ALTERNATIVE_PRECISION
}

/// A room prefab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomTemplate {
    /// Human readable name
    pub name: String,
    /// Room-local bounding volume used for overlap checks
    pub bounds: Aabb,
    /// Door sockets
    pub doors: Vec<Door>,
    /// Variants that may replace a placed room whose used doors match theirs
    #[serde(default)]
    pub alternatives: Vec<TemplateId>,
    /// Position tolerance when comparing doors against alternatives
    #[serde(default = "default_alternative_precision")]
    pub alternative_precision: f64,
    /// Room-local point the camera snaps to when entering the room
    #[serde(default)]
    pub camera_anchor: Option<RoomTransform>,
}

impl RoomTemplate {
    /// Creates a template with no alternatives and no camera anchor.
    pub fn new(name: impl Into<String>, bounds: Aabb, doors: Vec<Door>) -> Self {
        Self {
            name: name.into(),
            bounds,
            doors,
            alternatives: Vec::new(),
            alternative_precision: config::DEFAULT_ALTERNATIVE_PRECISION,
            camera_anchor: None,
        }
    }

    /// Sets the substitution candidates.
    pub fn with_alternatives(mut self, alternatives: Vec<TemplateId>) -> Self {
        self.alternatives = alternatives;
        self
    }

    /// Sets the door comparison tolerance for alternatives.
    pub fn with_alternative_precision(mut self, precision: f64) -> Self {
        self.alternative_precision = precision;
        self
    }

    /// Sets the camera anchor.
    pub fn with_camera_anchor(mut self, anchor: RoomTransform) -> Self {
        self.camera_anchor = Some(anchor);
        self
    }
}

/// A template that must appear somewhere in the id range `[min_id, max_id]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedRoomRule {
    /// First room id the template may take
    pub min_id: u32,
    /// Last room id the template may take
    pub max_id: u32,
    /// Template to place
    pub template: TemplateId,
}

impl FixedRoomRule {
    /// Creates a new rule.
    pub fn new(min_id: u32, max_id: u32, template: TemplateId) -> Self {
        Self {
            min_id,
            max_id,
            template,
        }
    }

    /// Checks if a room id lies inside the rule's window.
    pub fn contains(&self, room_id: u32) -> bool {
        room_id >= self.min_id && room_id <= self.max_id
    }
}

/// Templates, random pool and fixed rules for one kind of map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomTable {
    /// Every template the table knows about
    pub templates: Vec<RoomTemplate>,
    /// Templates drawn uniformly when no fixed rule applies
    pub pool: Vec<TemplateId>,
    /// Fixed rules in priority order
    #[serde(default)]
    pub fixed_rooms: Vec<FixedRoomRule>,
}

impl RoomTable {
    /// Creates a table without fixed rules.
    pub fn new(templates: Vec<RoomTemplate>, pool: Vec<TemplateId>) -> Self {
        Self {
            templates,
            pool,
            fixed_rooms: Vec::new(),
        }
    }

    /// Appends a fixed rule (rules declared earlier win ties).
    pub fn with_fixed_room(mut self, rule: FixedRoomRule) -> Self {
        self.fixed_rooms.push(rule);
        self
    }

    /// Gets a template by id.
    pub fn template(&self, id: TemplateId) -> Option<&RoomTemplate> {
        self.templates.get(id.0)
    }

    /// Gets a template by id or reports it as a table error.
    pub fn require_template(&self, id: TemplateId) -> MapforgeResult<&RoomTemplate> {
        self.template(id).ok_or_else(|| {
            MapforgeError::InvalidTable(format!("template {} does not exist", id))
        })
    }

    /// Checks that every reference resolves and every rule is well formed.
    pub fn validate(&self) -> MapforgeResult<()> {
        if self.pool.is_empty() {
            return Err(MapforgeError::InvalidTable(
                "room pool is empty".to_string(),
            ));
        }

        for &id in &self.pool {
            let template = self.require_template(id)?;
            if template.doors.is_empty() {
                return Err(MapforgeError::InvalidTable(format!(
                    "pool template {} '{}' has no doors",
                    id, template.name
                )));
            }
        }

        for (index, rule) in self.fixed_rooms.iter().enumerate() {
            if rule.min_id > rule.max_id {
                return Err(MapforgeError::InvalidTable(format!(
                    "fixed room rule {} has min_id {} above max_id {}",
                    index, rule.min_id, rule.max_id
                )));
            }
            let template = self.require_template(rule.template)?;
            if template.doors.is_empty() {
                return Err(MapforgeError::InvalidTable(format!(
                    "fixed room rule {} uses template '{}' which has no doors",
                    index, template.name
                )));
            }
        }

        for template in &self.templates {
            if !(template.alternative_precision >= 0.0) {
                return Err(MapforgeError::InvalidTable(format!(
                    "template '{}' has a negative alternative precision",
                    template.name
                )));
            }
            for &alternative in &template.alternatives {
                self.require_template(alternative)?;
            }
        }

        Ok(())
    }

    /// Parses and validates a table from JSON.
    pub fn from_json_str(json: &str) -> MapforgeResult<Self> {
        let table: RoomTable = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    /// Reads, parses and validates a table from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> MapforgeResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serializes the table as pretty-printed JSON.
    pub fn to_json_string(&self) -> MapforgeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// A small self-contained table of square halls and straight corridors.
    ///
    /// The entrance is pinned to id 0 and a single-door vault must appear
    /// between ids 4 and 8. Halls that end up using only two opposite doors
    /// are swapped for sealed variants.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapforge::RoomTable;
    ///
    /// let table = RoomTable::sample();
    /// assert!(table.validate().is_ok());
    /// assert_eq!(table.fixed_rooms.len(), 2);
    /// ```
    pub fn sample() -> Self {
        let hall_bounds = Aabb::new(Point3::new(-5.0, 0.0, -5.0), Point3::new(5.0, 4.0, 5.0));
        let north = Door::standard(Point3::new(0.0, 0.0, 5.0), DoorDirection::North);
        let east = Door::standard(Point3::new(5.0, 0.0, 0.0), DoorDirection::East);
        let south = Door::standard(Point3::new(0.0, 0.0, -5.0), DoorDirection::South);
        let west = Door::standard(Point3::new(-5.0, 0.0, 0.0), DoorDirection::West);
        let overhead = RoomTransform::new(Vector3::new(0.0, 12.0, -6.0), 0.0);

        let hall = RoomTemplate::new(
            "hall",
            hall_bounds,
            vec![north.clone(), east.clone(), south.clone(), west.clone()],
        )
        .with_alternatives(vec![TemplateId(4), TemplateId(5)])
        .with_camera_anchor(overhead);

        let corridor_ns = RoomTemplate::new(
            "corridor_ns",
            Aabb::new(Point3::new(-2.0, 0.0, -6.0), Point3::new(2.0, 4.0, 6.0)),
            vec![
                Door::standard(Point3::new(0.0, 0.0, 6.0), DoorDirection::North),
                Door::standard(Point3::new(0.0, 0.0, -6.0), DoorDirection::South),
            ],
        );

        let corridor_ew = RoomTemplate::new(
            "corridor_ew",
            Aabb::new(Point3::new(-6.0, 0.0, -2.0), Point3::new(6.0, 4.0, 2.0)),
            vec![
                Door::standard(Point3::new(6.0, 0.0, 0.0), DoorDirection::East),
                Door::standard(Point3::new(-6.0, 0.0, 0.0), DoorDirection::West),
            ],
        );

        let vault = RoomTemplate::new(
            "vault",
            Aabb::new(Point3::new(-4.0, 0.0, -4.0), Point3::new(4.0, 4.0, 4.0)),
            vec![Door::standard(Point3::new(0.0, 0.0, -4.0), DoorDirection::South)],
        )
        .with_camera_anchor(RoomTransform::new(Vector3::new(0.0, 10.0, -5.0), 0.0));

        let sealed_ns = RoomTemplate::new(
            "hall_sealed_ns",
            hall_bounds,
            vec![north.clone(), south.clone()],
        )
        .with_camera_anchor(overhead);

        let sealed_ew = RoomTemplate::new(
            "hall_sealed_ew",
            hall_bounds,
            vec![east.clone(), west.clone()],
        )
        .with_camera_anchor(overhead);

        let entrance = RoomTemplate::new("entrance", hall_bounds, vec![north, east, west])
            .with_camera_anchor(overhead);

        RoomTable::new(
            vec![
                hall,
                corridor_ns,
                corridor_ew,
                vault,
                sealed_ns,
                sealed_ew,
                entrance,
            ],
            vec![TemplateId(0), TemplateId(1), TemplateId(2)],
        )
        .with_fixed_room(FixedRoomRule::new(0, 0, TemplateId(6)))
        .with_fixed_room(FixedRoomRule::new(4, 8, TemplateId(3)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_rule_window() {
        let rule = FixedRoomRule::new(2, 4, TemplateId(0));
        assert!(!rule.contains(1));
        assert!(rule.contains(2));
        assert!(rule.contains(4));
        assert!(!rule.contains(5));
    }

    #[test]
    fn test_sample_table_is_valid() {
        let table = RoomTable::sample();
        assert!(table.validate().is_ok());
        assert_eq!(table.template(TemplateId(3)).unwrap().name, "vault");
        assert!(table.template(TemplateId(42)).is_none());
    }

    #[test]
    fn test_validation_rejects_empty_pool() {
        let mut table = RoomTable::sample();
        table.pool.clear();
        assert!(matches!(table.validate(), Err(MapforgeError::InvalidTable(_))));
    }

    #[test]
    fn test_validation_rejects_inverted_rule() {
        let table = RoomTable::sample().with_fixed_room(FixedRoomRule::new(5, 2, TemplateId(0)));
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_dangling_references() {
        let mut table = RoomTable::sample();
        table.pool.push(TemplateId(99));
        assert!(table.validate().is_err());

        let mut table = RoomTable::sample();
        table.templates[0].alternatives.push(TemplateId(99));
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip_preserves_table() {
        let table = RoomTable::sample();
        let json = table.to_json_string().unwrap();
        let parsed = RoomTable::from_json_str(&json).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn test_json_defaults() {
        let json = r#"{
            "templates": [{
                "name": "cell",
                "bounds": { "min": [-1.0, 0.0, -1.0], "max": [1.0, 2.0, 1.0] },
                "doors": [{ "position": [0.0, 0.0, 1.0], "direction": "North" }]
            }],
            "pool": [0]
        }"#;
        let table = RoomTable::from_json_str(json).unwrap();
        let cell = &table.templates[0];
        assert_eq!(cell.doors[0].kind, "standard");
        assert_eq!(cell.alternative_precision, config::DEFAULT_ALTERNATIVE_PRECISION);
        assert!(cell.camera_anchor.is_none());
        assert!(table.fixed_rooms.is_empty());
    }
}
