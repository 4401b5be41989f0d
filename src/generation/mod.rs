//! # Generation Module
//!
//! Procedural assembly of maps from room templates.
//!
//! Generation grows a map one room at a time: the scheduler decides which
//! template comes next, the placement engine attaches it to an anchor room
//! through a pair of matching doors, and a driver retries, switches anchors or
//! restarts when placement keeps failing. Two drivers exist:
//!
//! - [`RuntimeRun`]: a cooperative tick machine that restarts the whole map
//!   when a fixed room misses its window or too many candidates are discarded
//! - [`EditorRun`]: a synchronous search with an escalating loop counter that
//!   stops with a partial map instead of restarting
//!
//! Both finish by swapping rooms for matching alternatives and wiring doors
//! that share a junction.

pub mod editor;
pub mod finalize;
pub mod placement;
pub mod runtime;
pub mod scheduler;
pub mod search;

pub use editor::*;
pub use finalize::*;
pub use placement::*;
pub use runtime::*;
pub use scheduler::*;
pub use search::*;

use crate::map::{GeneratedMap, RoomTable, TemplateId};
use crate::{config, MapforgeError, MapforgeResult};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Loop-count thresholds of the editor driver.
///
/// Each threshold is compared with `>` against the number of consecutive
/// failed iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationThresholds {
    /// Past this count anchors are drawn among all placed rooms every iteration
    pub random_anchor: u32,
    /// Past this count the pending candidate is dropped every iteration
    pub discard_candidate: u32,
    /// Past this count generation stops with a partial map
    pub abort: u32,
}

impl Default for EscalationThresholds {
    fn default() -> Self {
        Self {
            random_anchor: config::DEFAULT_RANDOM_ANCHOR_THRESHOLD,
            discard_candidate: config::DEFAULT_DISCARD_THRESHOLD,
            abort: config::DEFAULT_ABORT_THRESHOLD,
        }
    }
}

impl EscalationThresholds {
    /// Checks that the tiers escalate in order and the loop counter cannot
    /// overflow before the abort tier fires.
    pub fn validate(&self) -> MapforgeResult<()> {
        if self.random_anchor > self.discard_candidate || self.discard_candidate > self.abort {
            return Err(MapforgeError::InvalidConfig(format!(
                "escalation thresholds must satisfy random_anchor <= discard_candidate <= abort, got {}/{}/{}",
                self.random_anchor, self.discard_candidate, self.abort
            )));
        }
        if self.abort == u32::MAX {
            return Err(MapforgeError::InvalidConfig(
                "escalation abort threshold must be below u32::MAX".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for map generation.
///
/// Controls the room quota, the retry budgets of both drivers and the
/// tolerances used by placement and door wiring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Number of rooms in a finished map
    pub room_count: u32,
    /// Consecutive discarded candidates before the runtime driver restarts
    pub max_attempts: u32,
    /// Anchor rooms tried per candidate
    pub rooms_per_attempt: u32,
    /// Anchor doors tried per anchor room
    pub doors_per_attempt: u32,
    /// Whole-map restarts the runtime driver may perform before giving up
    pub max_restarts: u32,
    /// Editor loop-count escalation
    #[serde(default)]
    pub escalation: EscalationThresholds,
    /// Radius around a door inside which other doors share its junction
    pub connection_radius: f64,
    /// Slack subtracted from bounds before testing overlap
    pub overlap_tolerance: f64,
    /// Whether candidate rooms may be turned to make their doors line up
    #[serde(default)]
    pub allow_rotation: bool,
}

impl GenerationConfig {
    /// Creates a default generation configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapforge::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(99);
    /// assert_eq!(config.seed, 99);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            room_count: config::DEFAULT_ROOM_COUNT,
            max_attempts: config::DEFAULT_MAX_ATTEMPTS,
            rooms_per_attempt: config::DEFAULT_ROOMS_PER_ATTEMPT,
            doors_per_attempt: config::DEFAULT_DOORS_PER_ATTEMPT,
            max_restarts: config::DEFAULT_MAX_RESTARTS,
            escalation: EscalationThresholds::default(),
            connection_radius: config::DEFAULT_CONNECTION_RADIUS,
            overlap_tolerance: config::DEFAULT_OVERLAP_TOLERANCE,
            allow_rotation: false,
        }
    }

    /// Creates a configuration for testing with smaller maps.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            room_count: 8,
            ..Self::new(seed)
        }
    }

    /// Creates a configuration for large maps with rotated rooms.
    pub fn for_large_maps(seed: u64) -> Self {
        Self {
            room_count: 30,
            max_attempts: 8,
            rooms_per_attempt: 8,
            doors_per_attempt: 3,
            allow_rotation: true,
            ..Self::new(seed)
        }
    }

    /// Checks that every count is at least one and every tolerance is usable.
    pub fn validate(&self) -> MapforgeResult<()> {
        let counts = [
            ("room_count", self.room_count),
            ("max_attempts", self.max_attempts),
            ("rooms_per_attempt", self.rooms_per_attempt),
            ("doors_per_attempt", self.doors_per_attempt),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(MapforgeError::InvalidConfig(format!(
                    "{} must be at least 1",
                    name
                )));
            }
        }

        if !(self.connection_radius.is_finite() && self.connection_radius > 0.0) {
            return Err(MapforgeError::InvalidConfig(
                "connection_radius must be a positive number".to_string(),
            ));
        }

        if !(self.overlap_tolerance.is_finite() && self.overlap_tolerance >= 0.0) {
            return Err(MapforgeError::InvalidConfig(
                "overlap_tolerance must be zero or positive".to_string(),
            ));
        }

        self.escalation.validate()
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Why a generation attempt was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbortReason {
    /// A fixed room was not placed inside its id window
    FixedRoomMissed { rule: usize },
    /// Too many candidates in a row could not be attached
    AttemptsExhausted,
    /// The editor loop counter passed its abort threshold
    LoopLimitReached,
    /// The runtime driver used up its restart budget
    RestartLimitReached,
    /// The scheduler had nothing to offer
    EmptyPool,
    /// The scheduler named a template the table does not have
    MissingTemplate { template: TemplateId },
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::FixedRoomMissed { rule } => {
                write!(f, "fixed room rule {} missed its window", rule)
            }
            AbortReason::AttemptsExhausted => write!(f, "placement attempts exhausted"),
            AbortReason::LoopLimitReached => write!(f, "loop limit reached"),
            AbortReason::RestartLimitReached => write!(f, "restart limit reached"),
            AbortReason::EmptyPool => write!(f, "room pool is empty"),
            AbortReason::MissingTemplate { template } => {
                write!(f, "template {} is not in the table", template)
            }
        }
    }
}

/// Observable state of a generation driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    /// Nothing has happened yet
    Idle,
    /// The map is empty and the first room is being placed
    PlacingFirstRoom,
    /// A fresh candidate is being attached to the newest room
    PlacingNextRoom,
    /// The candidate is being tried against another door of the same anchor
    RetryingDoor,
    /// The candidate is being tried against a different anchor room
    RetryingAnchor,
    /// The quota was reached and the map finalized
    Completed,
    /// The current attempt was abandoned
    Aborted(AbortReason),
}

/// Trait for procedural generators.
///
/// Both map drivers implement this trait so callers can swap them freely.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> MapforgeResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> MapforgeResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;
    use crate::map::DoorRef;
    use log::warn;
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    /// Creates a seeded random number generator from the config.
    pub fn create_rng(config: &GenerationConfig) -> StdRng {
        StdRng::seed_from_u64(config.seed)
    }

    /// Validates a configuration and table pair before a run starts.
    ///
    /// Fixed rules whose window begins at or after the room quota can never
    /// be honored; they are reported but do not fail validation.
    pub fn prepare_run(table: &RoomTable, config: &GenerationConfig) -> MapforgeResult<()> {
        config.validate()?;
        table.validate()?;
        for (index, rule) in table.fixed_rooms.iter().enumerate() {
            if rule.min_id >= config.room_count {
                warn!(
                    "Fixed room rule {} starts at id {} but only {} rooms are generated",
                    index, rule.min_id, config.room_count
                );
            }
        }
        Ok(())
    }

    /// Checks that a finished map satisfies every generation guarantee.
    ///
    /// Verifies the room count, id uniqueness, absence of overlaps, fixed-rule
    /// placement, door graph symmetry and overall connectivity.
    pub fn validate_map(
        map: &GeneratedMap,
        table: &RoomTable,
        config: &GenerationConfig,
    ) -> MapforgeResult<()> {
        let fail = |message: String| Err(MapforgeError::GenerationFailed(message));

        if !map.complete {
            return fail(format!(
                "map is partial with {} of {} rooms",
                map.rooms.len(),
                config.room_count
            ));
        }

        if map.rooms.len() != config.room_count as usize {
            return fail(format!(
                "map has {} rooms, expected {}",
                map.rooms.len(),
                config.room_count
            ));
        }

        let ids: BTreeSet<u32> = map.rooms.iter().map(|room| room.id).collect();
        if ids.len() != map.rooms.len() || ids.iter().copied().ne(0..config.room_count) {
            return fail("room ids are not exactly 0..room_count".to_string());
        }

        if let Some((a, b)) = map.overlapping_pairs(config.overlap_tolerance).first() {
            return fail(format!("rooms {} and {} overlap", a, b));
        }

        for (index, rule) in table.fixed_rooms.iter().enumerate() {
            if rule.min_id >= config.room_count {
                continue;
            }
            let accepted = table
                .template(rule.template)
                .map(|template| template.alternatives.clone())
                .unwrap_or_default();
            let honored = map.rooms.iter().any(|room| {
                room.fixed_rule == Some(index)
                    && rule.contains(room.id)
                    && (room.template == rule.template || accepted.contains(&room.template))
            });
            if !honored {
                return fail(format!("fixed room rule {} was not honored", index));
            }
        }

        if !map.connections.is_symmetric() {
            return fail("door graph is not symmetric".to_string());
        }

        for room in &map.rooms {
            for &door in &room.used_doors {
                if map.connections.rooms_through(DoorRef::new(room.id, door)).is_empty() {
                    return fail(format!(
                        "used door {} of room {} leads nowhere",
                        door, room.id
                    ));
                }
            }
        }

        if !map.is_connected() {
            return fail("map is not connected".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_config_creation() {
        let config = GenerationConfig::new(12345);
        assert_eq!(config.seed, 12345);
        assert_eq!(config.room_count, config::DEFAULT_ROOM_COUNT);
        assert_eq!(config.escalation.random_anchor, 20);
        assert_eq!(config.escalation.discard_candidate, 50);
        assert_eq!(config.escalation.abort, 100);
        assert!(!config.allow_rotation);
    }

    #[test]
    fn test_config_presets_are_valid() {
        assert!(GenerationConfig::default().validate().is_ok());
        assert!(GenerationConfig::for_testing(1).validate().is_ok());
        assert!(GenerationConfig::for_large_maps(1).validate().is_ok());
    }

    #[test]
    fn test_config_rejects_zero_counts() {
        let config = GenerationConfig {
            doors_per_attempt: 0,
            ..GenerationConfig::new(1)
        };
        assert!(matches!(config.validate(), Err(MapforgeError::InvalidConfig(_))));

        let config = GenerationConfig {
            room_count: 0,
            ..GenerationConfig::new(1)
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_bad_tolerances() {
        let config = GenerationConfig {
            connection_radius: 0.0,
            ..GenerationConfig::new(1)
        };
        assert!(config.validate().is_err());

        let config = GenerationConfig {
            overlap_tolerance: f64::NAN,
            ..GenerationConfig::new(1)
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_unordered_thresholds() {
        let mut config = GenerationConfig::new(1);
        config.escalation.random_anchor = 60;
        assert!(matches!(config.validate(), Err(MapforgeError::InvalidConfig(_))));

        let mut config = GenerationConfig::new(1);
        config.escalation.discard_candidate = 150;
        assert!(config.validate().is_err());

        // Equal tiers are allowed.
        let mut config = GenerationConfig::new(1);
        config.escalation = EscalationThresholds {
            random_anchor: 5,
            discard_candidate: 5,
            abort: 5,
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_unreachable_abort() {
        let mut config = GenerationConfig::new(1);
        config.escalation.abort = u32::MAX;
        assert!(matches!(config.validate(), Err(MapforgeError::InvalidConfig(_))));

        config.escalation.abort = u32::MAX - 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fixed_rule_needs_the_scheduled_room() {
        use rand::SeedableRng;
        let table = RoomTable::sample();
        let config = GenerationConfig::for_testing(42);
        let mut run = RuntimeRun::new(&table, &config).unwrap();
        let mut rng = StdRng::seed_from_u64(config.seed);
        assert_eq!(run.run_to_end(&mut rng), TickOutcome::Completed);
        let map = run.into_map().unwrap();
        assert!(utils::validate_map(&map, &table, &config).is_ok());

        let vault = map.rooms.iter().position(|room| room.fixed_rule == Some(1)).unwrap();
        assert_eq!(map.rooms[vault].template, TemplateId(3));
        assert!((4..=8).contains(&map.rooms[vault].id));

        // Same template and position, but not placed for the rule.
        let mut unscheduled = map.clone();
        unscheduled.rooms[vault].fixed_rule = None;
        assert!(utils::validate_map(&unscheduled, &table, &config).is_err());

        // Placed for the rule, but with an unrelated template.
        let mut swapped = map.clone();
        swapped.rooms[vault].template = TemplateId(1);
        assert!(utils::validate_map(&swapped, &table, &config).is_err());
    }

    #[test]
    fn test_config_json_defaults() {
        let json = r#"{
            "seed": 5, "room_count": 4, "max_attempts": 2, "rooms_per_attempt": 3,
            "doors_per_attempt": 2, "max_restarts": 10, "connection_radius": 1.5,
            "overlap_tolerance": 0.01
        }"#;
        let config: GenerationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.escalation, EscalationThresholds::default());
        assert!(!config.allow_rotation);
    }

    #[test]
    fn test_abort_reason_display() {
        let reason = AbortReason::FixedRoomMissed { rule: 2 };
        assert_eq!(reason.to_string(), "fixed room rule 2 missed its window");
    }

    #[test]
    fn test_utils_rng_is_reproducible() {
        use rand::Rng;
        let config = GenerationConfig::new(12345);
        let a: u64 = utils::create_rng(&config).gen();
        let b: u64 = utils::create_rng(&config).gen();
        assert_eq!(a, b);
    }
}
