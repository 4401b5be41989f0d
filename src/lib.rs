//! # Mapforge
//!
//! Procedural assembly of connected dungeon maps from a pool of room prefabs.
//!
//! ## Architecture Overview
//!
//! A map is grown one room at a time. Each new room is attached to an already
//! placed room through a pair of matching doors, checked for overlap against
//! everything placed so far, and retried or discarded when it does not fit.
//!
//! - **Map**: doors, room templates, placed rooms and the finished map
//! - **Generation**: placement engine, fixed-room scheduler, and the two
//!   generation drivers (tick-based runtime and synchronous editor)
//! - **Utils**: geometry, spatial indexing and graph reachability helpers
//!
//! ## Example
//!
//! ```
//! use mapforge::{GenerationConfig, Generator, RoomTable, RuntimeGenerator};
//!
//! let table = RoomTable::sample();
//! let config = GenerationConfig::for_testing(7);
//! let mut rng = mapforge::generation::utils::create_rng(&config);
//!
//! let map = RuntimeGenerator::new(&table).generate(&config, &mut rng).unwrap();
//! assert_eq!(map.rooms.len(), config.room_count as usize);
//! ```

pub mod generation;
pub mod map;
pub mod utils;

pub use generation::*;
pub use map::*;
pub use utils::*;

/// Core error type for map generation.
#[derive(thiserror::Error, Debug)]
pub enum MapforgeError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Generation settings are out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Room table references something that does not exist
    #[error("Invalid room table: {0}")]
    InvalidTable(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// Result type used throughout the Mapforge codebase.
pub type MapforgeResult<T> = Result<T, MapforgeError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Generation configuration defaults.
pub mod config {
    /// Default number of rooms in a finished map
    pub const DEFAULT_ROOM_COUNT: u32 = 12;

    /// Consecutive discarded candidates before the whole map restarts
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

    /// Anchor rooms tried per candidate
    pub const DEFAULT_ROOMS_PER_ATTEMPT: u32 = 5;

    /// Anchor doors tried per anchor room
    pub const DEFAULT_DOORS_PER_ATTEMPT: u32 = 2;

    /// Whole-map restarts allowed before a runtime run gives up
    pub const DEFAULT_MAX_RESTARTS: u32 = 100;

    /// Radius used to gather doors that share a junction
    pub const DEFAULT_CONNECTION_RADIUS: f64 = 1.5;

    /// Distance under which two door positions count as the same door
    pub const DEFAULT_ALTERNATIVE_PRECISION: f64 = 0.1;

    /// Slack subtracted from bounds before testing overlap
    pub const DEFAULT_OVERLAP_TOLERANCE: f64 = 0.01;

    /// Editor loop count past which anchors are picked among all rooms
    pub const DEFAULT_RANDOM_ANCHOR_THRESHOLD: u32 = 20;

    /// Editor loop count past which the pending candidate is thrown away
    pub const DEFAULT_DISCARD_THRESHOLD: u32 = 50;

    /// Editor loop count past which generation stops
    pub const DEFAULT_ABORT_THRESHOLD: u32 = 100;
}
