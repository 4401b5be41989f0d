//! Door and anchor budget for one candidate room.

use crate::generation::GenerationConfig;
use rand::Rng;

/// What the search does after a failed placement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStep {
    /// Try another door of the same anchor room
    RetryDoor,
    /// The anchor's door budget ran out; a different anchor was picked
    SwitchedAnchor,
    /// Every anchor in the budget was tried; the candidate should be dropped
    Exhausted,
}

/// Two-axis retry counters for attaching one candidate.
///
/// The inner axis counts doors tried on the current anchor, the outer axis
/// counts anchors tried. Anchors start at the newest placed room and move to
/// random earlier rooms once their doors are used up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontierSearch {
    /// Index of the anchor room in the placed list
    pub anchor: usize,
    /// Doors tried on the current anchor
    pub door_loop: u32,
    /// Anchors abandoned so far
    pub room_loop: u32,
}

impl FrontierSearch {
    /// Starts a search at the newest of `placed_len` rooms.
    pub fn new(placed_len: usize) -> Self {
        Self {
            anchor: placed_len.saturating_sub(1),
            door_loop: 0,
            room_loop: 0,
        }
    }

    /// Advances the counters after a failed attempt.
    pub fn record_failure<R: Rng + ?Sized>(
        &mut self,
        config: &GenerationConfig,
        placed_len: usize,
        rng: &mut R,
    ) -> SearchStep {
        self.door_loop += 1;
        if self.door_loop < config.doors_per_attempt {
            return SearchStep::RetryDoor;
        }

        self.door_loop = 0;
        self.room_loop += 1;
        if self.room_loop >= config.rooms_per_attempt {
            return SearchStep::Exhausted;
        }

        // Earlier rooms only; a single placed room is its own fallback.
        self.anchor = rng.gen_range(0..placed_len.saturating_sub(1).max(1));
        SearchStep::SwitchedAnchor
    }

    /// Clears both counters and keeps the anchor.
    pub fn reset_loops(&mut self) {
        self.door_loop = 0;
        self.room_loop = 0;
    }

    /// Moves to a specific anchor without touching the counters.
    pub fn jump_to(&mut self, anchor: usize) {
        self.anchor = anchor;
    }

    /// Returns true if a room attached now would not follow the newest room.
    pub fn is_teleport(&self, placed_len: usize) -> bool {
        self.anchor + 1 != placed_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn budget(doors: u32, rooms: u32) -> GenerationConfig {
        GenerationConfig {
            doors_per_attempt: doors,
            rooms_per_attempt: rooms,
            ..GenerationConfig::new(1)
        }
    }

    #[test]
    fn test_search_starts_at_newest_room() {
        let search = FrontierSearch::new(4);
        assert_eq!(search.anchor, 3);
        assert!(!search.is_teleport(4));
        assert!(search.is_teleport(5));
    }

    #[test]
    fn test_budget_sequence() {
        let config = budget(2, 3);
        let mut rng = StdRng::seed_from_u64(12345);
        let mut search = FrontierSearch::new(6);

        let steps: Vec<SearchStep> = (0..6)
            .map(|_| search.record_failure(&config, 6, &mut rng))
            .collect();
        assert_eq!(
            steps,
            vec![
                SearchStep::RetryDoor,
                SearchStep::SwitchedAnchor,
                SearchStep::RetryDoor,
                SearchStep::SwitchedAnchor,
                SearchStep::RetryDoor,
                SearchStep::Exhausted,
            ]
        );
    }

    #[test]
    fn test_switched_anchor_is_an_earlier_room() {
        let config = budget(1, 100);
        let mut rng = StdRng::seed_from_u64(7);
        let mut search = FrontierSearch::new(5);

        for _ in 0..50 {
            assert_eq!(search.record_failure(&config, 5, &mut rng), SearchStep::SwitchedAnchor);
            assert!(search.anchor < 4);
            assert!(search.is_teleport(5));
        }
    }

    #[test]
    fn test_single_room_map_keeps_its_only_anchor() {
        let config = budget(1, 3);
        let mut rng = StdRng::seed_from_u64(8);
        let mut search = FrontierSearch::new(1);

        assert_eq!(search.record_failure(&config, 1, &mut rng), SearchStep::SwitchedAnchor);
        assert_eq!(search.anchor, 0);
    }

    #[test]
    fn test_reset_and_jump() {
        let config = budget(3, 3);
        let mut rng = StdRng::seed_from_u64(9);
        let mut search = FrontierSearch::new(3);
        search.record_failure(&config, 3, &mut rng);
        search.jump_to(0);
        search.reset_loops();

        assert_eq!(search.anchor, 0);
        assert_eq!(search.door_loop, 0);
        assert_eq!(search.room_loop, 0);
    }
}
