//! # Runtime Driver
//!
//! Play-mode generation as a cooperative tick machine. Each call to
//! [`RuntimeRun::tick`] performs one unit of work so a host loop can spread
//! generation over frames. When a fixed room misses its window, or too many
//! candidates in a row cannot be attached, the whole map is thrown away and
//! generation starts again from room 0.

use crate::generation::{
    finalize, utils, AbortReason, AnchorSocket, FrontierSearch, GenerationConfig,
    GenerationState, Generator, PlacementEngine, Schedule, SchedulerState, SearchStep,
};
use crate::map::{GeneratedMap, GenerationReport, Room, RoomTable};
use crate::{MapforgeError, MapforgeResult};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::Rng;

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Work remains
    Pending,
    /// The map was discarded and generation starts over
    Restarted(AbortReason),
    /// The map is finished; see [`RuntimeRun::map`]
    Completed,
    /// The run gave up for good
    Failed(AbortReason),
}

impl TickOutcome {
    /// Returns true once ticking has no further effect.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TickOutcome::Completed | TickOutcome::Failed(_))
    }
}

/// One runtime generation run over a room table.
#[derive(Debug)]
pub struct RuntimeRun<'a> {
    table: &'a RoomTable,
    config: &'a GenerationConfig,
    engine: PlacementEngine,
    rooms: Vec<Room>,
    scheduler: SchedulerState,
    attempts: u32,
    candidate: Option<Room>,
    search: FrontierSearch,
    state: GenerationState,
    report: GenerationReport,
    outcome: Option<TickOutcome>,
    map: Option<GeneratedMap>,
}

impl<'a> RuntimeRun<'a> {
    /// Validates the inputs and sets up an idle run.
    pub fn new(table: &'a RoomTable, config: &'a GenerationConfig) -> MapforgeResult<Self> {
        utils::prepare_run(table, config)?;
        Ok(Self {
            table,
            config,
            engine: PlacementEngine::from_config(config),
            rooms: Vec::new(),
            scheduler: SchedulerState::default(),
            attempts: 0,
            candidate: None,
            search: FrontierSearch::new(0),
            state: GenerationState::Idle,
            report: GenerationReport::default(),
            outcome: None,
            map: None,
        })
    }

    /// Current state of the machine.
    pub fn state(&self) -> GenerationState {
        self.state
    }

    /// Rooms registered in the current attempt.
    pub fn placed_rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Fixed-rule bookkeeping of the current attempt.
    pub fn scheduler(&self) -> &SchedulerState {
        &self.scheduler
    }

    /// Counters collected so far.
    pub fn report(&self) -> &GenerationReport {
        &self.report
    }

    /// Candidates discarded in a row during the current attempt.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The finished map, once the run has completed.
    pub fn map(&self) -> Option<&GeneratedMap> {
        self.map.as_ref()
    }

    /// Consumes the run and returns the finished map, if any.
    pub fn into_map(self) -> Option<GeneratedMap> {
        self.map
    }

    /// Performs one unit of work.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> TickOutcome {
        if let Some(outcome) = self.outcome {
            return outcome;
        }

        self.report.steps += 1;
        if self.candidate.is_some() {
            self.attempt(rng)
        } else {
            self.select_candidate(rng)
        }
    }

    /// Ticks until the run completes or fails.
    pub fn run_to_end<R: Rng + ?Sized>(&mut self, rng: &mut R) -> TickOutcome {
        loop {
            let outcome = self.tick(rng);
            if outcome.is_terminal() {
                return outcome;
            }
        }
    }

    fn select_candidate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> TickOutcome {
        let placed = self.rooms.len();
        if placed >= self.config.room_count as usize {
            if let Some(rule) = self.scheduler.unsatisfied(self.table, self.config.room_count) {
                return self.restart(AbortReason::FixedRoomMissed { rule });
            }
            return self.complete();
        }

        if self.attempts >= self.config.max_attempts {
            return self.restart(AbortReason::AttemptsExhausted);
        }

        let template_id = match self.scheduler.next_prefab(self.table, placed as u32, rng) {
            Schedule::Room(template) => template,
            Schedule::Restart { rule } => {
                return self.restart(AbortReason::FixedRoomMissed { rule })
            }
            Schedule::PoolEmpty => return self.fail(AbortReason::EmptyPool),
        };
        let Some(template) = self.table.template(template_id) else {
            return self.fail(AbortReason::MissingTemplate {
                template: template_id,
            });
        };
        let mut room = Room::instantiate(template_id, template);

        if placed == 0 {
            self.state = GenerationState::PlacingFirstRoom;
            if self.engine.try_place(&mut room, None, &mut self.rooms, rng) {
                self.register(room, false);
            }
            return TickOutcome::Pending;
        }

        self.candidate = Some(room);
        self.search = FrontierSearch::new(placed);
        self.state = GenerationState::PlacingNextRoom;
        TickOutcome::Pending
    }

    fn attempt<R: Rng + ?Sized>(&mut self, rng: &mut R) -> TickOutcome {
        let Some(mut room) = self.candidate.take() else {
            return TickOutcome::Pending;
        };

        let placed = self.rooms.len();
        let anchor = self.search.anchor;
        let socket = self
            .rooms
            .get(anchor)
            .and_then(|anchor_room| anchor_room.random_door(rng))
            .map(|door| AnchorSocket { room: anchor, door });

        if self.engine.try_place(&mut room, socket, &mut self.rooms, rng) {
            let teleported = self.search.is_teleport(placed);
            self.register(room, teleported);
            self.attempts = 0;
            return TickOutcome::Pending;
        }

        match self.search.record_failure(self.config, placed, rng) {
            SearchStep::RetryDoor => {
                self.state = GenerationState::RetryingDoor;
                self.candidate = Some(room);
            }
            SearchStep::SwitchedAnchor => {
                self.state = GenerationState::RetryingAnchor;
                self.candidate = Some(room);
            }
            SearchStep::Exhausted => {
                self.attempts += 1;
                debug!(
                    "Discarded '{}' for room {} (attempt {}/{})",
                    room.name, placed, self.attempts, self.config.max_attempts
                );
            }
        }
        TickOutcome::Pending
    }

    fn register(&mut self, mut room: Room, teleported: bool) {
        let id = self.rooms.len() as u32;
        room.init(id, teleported);
        room.fixed_rule = self.scheduler.trying;
        debug!(
            "Registered room {} '{}'{}",
            id,
            room.name,
            if teleported { " (teleported)" } else { "" }
        );
        self.rooms.push(room);
        self.scheduler.on_room_registered();
    }

    fn restart(&mut self, reason: AbortReason) -> TickOutcome {
        if self.report.restarts >= self.config.max_restarts {
            return self.fail(AbortReason::RestartLimitReached);
        }

        warn!(
            "Restarting map after {} rooms: {}",
            self.rooms.len(),
            reason
        );
        self.report.restarts += 1;
        self.rooms.clear();
        self.scheduler = SchedulerState::default();
        self.attempts = 0;
        self.candidate = None;
        self.search = FrontierSearch::new(0);
        self.state = GenerationState::Aborted(reason);
        TickOutcome::Restarted(reason)
    }

    fn fail(&mut self, reason: AbortReason) -> TickOutcome {
        warn!("Map generation failed: {}", reason);
        self.candidate = None;
        self.state = GenerationState::Aborted(reason);
        let outcome = TickOutcome::Failed(reason);
        self.outcome = Some(outcome);
        outcome
    }

    fn complete(&mut self) -> TickOutcome {
        let finalized = finalize(self.table, self.rooms.clone(), self.config);
        self.report.substitutions = finalized.substitutions;
        info!(
            "Generated {} rooms after {} restarts and {} steps",
            finalized.rooms.len(),
            self.report.restarts,
            self.report.steps
        );

        self.map = Some(GeneratedMap {
            rooms: finalized.rooms,
            connections: finalized.connections,
            complete: true,
            report: self.report.clone(),
        });
        self.state = GenerationState::Completed;
        self.outcome = Some(TickOutcome::Completed);
        TickOutcome::Completed
    }
}

/// Play-mode map generator.
///
/// Restarts the whole map as often as needed (up to `max_restarts`) and only
/// ever returns complete maps.
#[derive(Debug, Clone)]
pub struct RuntimeGenerator<'a> {
    table: &'a RoomTable,
}

impl<'a> RuntimeGenerator<'a> {
    /// Creates a generator over a room table.
    pub fn new(table: &'a RoomTable) -> Self {
        Self { table }
    }
}

impl Generator<GeneratedMap> for RuntimeGenerator<'_> {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> MapforgeResult<GeneratedMap> {
        let mut run = RuntimeRun::new(self.table, config)?;
        if let TickOutcome::Failed(reason) = run.run_to_end(rng) {
            return Err(MapforgeError::GenerationFailed(reason.to_string()));
        }
        run.into_map().ok_or_else(|| {
            MapforgeError::GenerationFailed("run finished without a map".to_string())
        })
    }

    fn validate(&self, map: &GeneratedMap, config: &GenerationConfig) -> MapforgeResult<()> {
        utils::validate_map(map, self.table, config)
    }

    fn generator_type(&self) -> &'static str {
        "RuntimeGenerator"
    }
}
