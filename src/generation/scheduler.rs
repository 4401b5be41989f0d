//! # Room Scheduler
//!
//! Chooses the template for each room index, honoring fixed-room rules.
//!
//! A fixed rule is tried at the first index inside its window and retried at
//! every following index until a room built from it is registered. If the
//! window closes first the scheduler asks for a restart.

use crate::map::{RoomTable, TemplateId};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;

/// What the scheduler wants placed next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Build a room from this template
    Room(TemplateId),
    /// A fixed rule can no longer be honored; the map must start over
    Restart { rule: usize },
    /// No fixed rule applies and the random pool is empty
    PoolEmpty,
}

/// Bookkeeping for fixed rules during one generation attempt.
///
/// Rules are addressed by their index in [`RoomTable::fixed_rooms`]. Dropping
/// the state and creating a new default one is a full reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerState {
    /// Rules already offered for the current room index
    pub already_checked: BTreeSet<usize>,
    /// Rules satisfied by a registered room
    pub already_put: BTreeSet<usize>,
    /// Rule whose template is currently being placed
    pub trying: Option<usize>,
}

impl SchedulerState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks the template for room index `room_id`.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapforge::{RoomTable, Schedule, SchedulerState, TemplateId};
    /// use rand::SeedableRng;
    ///
    /// let table = RoomTable::sample();
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(1);
    /// let mut state = SchedulerState::new();
    ///
    /// // The sample table pins its entrance to index 0.
    /// assert_eq!(state.next_prefab(&table, 0, &mut rng), Schedule::Room(TemplateId(6)));
    /// ```
    pub fn next_prefab<R: Rng + ?Sized>(
        &mut self,
        table: &RoomTable,
        room_id: u32,
        rng: &mut R,
    ) -> Schedule {
        if let Some(rule) = self.trying {
            if table
                .fixed_rooms
                .get(rule)
                .is_some_and(|fixed| room_id >= fixed.max_id)
            {
                return Schedule::Restart { rule };
            }
        }

        // A rule can be passed over while another rule holds its indices.
        let overdue = table.fixed_rooms.iter().enumerate().find(|(index, rule)| {
            !self.already_put.contains(index) && self.trying != Some(*index) && rule.max_id < room_id
        });
        if let Some((rule, _)) = overdue {
            return Schedule::Restart { rule };
        }

        let candidate = table.fixed_rooms.iter().enumerate().find(|(index, rule)| {
            !self.already_checked.contains(index)
                && !self.already_put.contains(index)
                && rule.contains(room_id)
        });
        if let Some((index, rule)) = candidate {
            self.already_checked.insert(index);
            self.trying = Some(index);
            return Schedule::Room(rule.template);
        }

        self.trying = None;
        match table.pool.choose(rng) {
            Some(&template) => Schedule::Room(template),
            None => Schedule::PoolEmpty,
        }
    }

    /// Updates the bookkeeping after a room was registered.
    pub fn on_room_registered(&mut self) {
        self.already_checked.clear();
        if let Some(rule) = self.trying.take() {
            self.already_put.insert(rule);
        }
    }

    /// First rule that starts inside the quota but was never placed.
    pub fn unsatisfied(&self, table: &RoomTable, room_count: u32) -> Option<usize> {
        table
            .fixed_rooms
            .iter()
            .enumerate()
            .find(|(index, rule)| !self.already_put.contains(index) && rule.min_id < room_count)
            .map(|(index, _)| index)
    }

    /// Returns true if the rule at `index` has been satisfied.
    pub fn is_put(&self, index: usize) -> bool {
        self.already_put.contains(&index)
    }
}
