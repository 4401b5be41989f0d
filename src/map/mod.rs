//! # Map Module
//!
//! The data model of a generated map:
//! - Door sockets and their world-space anchors
//! - Room templates, fixed-room rules and the room table
//! - Placed room instances
//! - The door connection graph and the finished map

pub mod door;
pub mod graph;
pub mod layout;
pub mod room;
pub mod table;

pub use door::*;
pub use graph::*;
pub use layout::*;
pub use room::*;
pub use table::*;
