//! # Editor Driver
//!
//! Offline generation as a synchronous bounded search. Instead of restarting,
//! the editor driver escalates as consecutive failures pile up: first it
//! jumps to random anchor rooms, then it throws candidates away every
//! iteration, and finally it gives up and hands back the partial map.

use crate::generation::{
    finalize, utils, AbortReason, AnchorSocket, FrontierSearch, GenerationConfig,
    GenerationState, Generator, PlacementEngine, Schedule, SchedulerState, SearchStep,
};
use crate::map::{DoorGraph, GeneratedMap, GenerationReport, Room, RoomTable};
use crate::MapforgeResult;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::Rng;

enum EditorStep {
    Placed,
    Failed,
    Abort(AbortReason),
}

/// One editor generation run over a room table.
#[derive(Debug)]
pub struct EditorRun<'a> {
    table: &'a RoomTable,
    config: &'a GenerationConfig,
    engine: PlacementEngine,
    rooms: Vec<Room>,
    scheduler: SchedulerState,
    candidate: Option<Room>,
    search: FrontierSearch,
    loop_count: u32,
    state: GenerationState,
    report: GenerationReport,
}

impl<'a> EditorRun<'a> {
    /// Validates the inputs and sets up an idle run.
    pub fn new(table: &'a RoomTable, config: &'a GenerationConfig) -> MapforgeResult<Self> {
        utils::prepare_run(table, config)?;
        Ok(Self {
            table,
            config,
            engine: PlacementEngine::from_config(config),
            rooms: Vec::new(),
            scheduler: SchedulerState::default(),
            candidate: None,
            search: FrontierSearch::new(0),
            loop_count: 0,
            state: GenerationState::Idle,
            report: GenerationReport::default(),
        })
    }

    /// Current state of the run.
    pub fn state(&self) -> GenerationState {
        self.state
    }

    /// Consecutive failed iterations.
    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    /// Rooms registered so far.
    pub fn placed_rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Fixed-rule bookkeeping of the run.
    pub fn scheduler(&self) -> &SchedulerState {
        &self.scheduler
    }

    /// Grows the map until the quota is reached or the search gives up.
    ///
    /// A finished map is finalized and marked complete. Otherwise the rooms
    /// placed so far are returned unwired with `complete` set to false.
    pub fn run<R: Rng + ?Sized>(&mut self, rng: &mut R) -> GeneratedMap {
        let quota = self.config.room_count as usize;
        let thresholds = self.config.escalation;
        let mut abort = None;

        while self.rooms.len() < quota {
            self.report.steps += 1;
            match self.step(rng) {
                EditorStep::Placed => {
                    self.loop_count = 0;
                    continue;
                }
                EditorStep::Failed => self.loop_count += 1,
                EditorStep::Abort(reason) => {
                    abort = Some(reason);
                    break;
                }
            }

            if self.loop_count > thresholds.random_anchor && !self.rooms.is_empty() {
                self.search.jump_to(rng.gen_range(0..self.rooms.len()));
            }
            if self.loop_count > thresholds.discard_candidate {
                self.candidate = None;
            }
            if self.loop_count > thresholds.abort {
                warn!(
                    "Stopped an endless loop after {} failed iterations with {} rooms",
                    self.loop_count,
                    self.rooms.len()
                );
                abort = Some(AbortReason::LoopLimitReached);
                break;
            }
        }

        if abort.is_none() {
            abort = self
                .scheduler
                .unsatisfied(self.table, self.config.room_count)
                .map(|rule| AbortReason::FixedRoomMissed { rule });
        }

        match abort {
            Some(reason) => self.partial(reason),
            None => self.complete(),
        }
    }

    fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> EditorStep {
        let placed = self.rooms.len();
        let mut room = match self.candidate.take() {
            Some(room) => room,
            None => match self.draw_candidate(placed as u32, rng) {
                Ok(room) => room,
                Err(reason) => return EditorStep::Abort(reason),
            },
        };

        if placed == 0 {
            self.state = GenerationState::PlacingFirstRoom;
            if self.engine.try_place(&mut room, None, &mut self.rooms, rng) {
                self.register(room, false);
                return EditorStep::Placed;
            }
            return EditorStep::Failed;
        }

        let anchor = self.search.anchor;
        let socket = self
            .rooms
            .get(anchor)
            .and_then(|anchor_room| anchor_room.random_door(rng))
            .map(|door| AnchorSocket { room: anchor, door });

        if self.engine.try_place(&mut room, socket, &mut self.rooms, rng) {
            let teleported = self.search.is_teleport(placed);
            self.register(room, teleported);
            self.search = FrontierSearch::new(self.rooms.len());
            return EditorStep::Placed;
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
                debug!("Discarded '{}' for room {}", room.name, placed);
                self.search.reset_loops();
                self.state = GenerationState::PlacingNextRoom;
            }
        }
        EditorStep::Failed
    }

    fn draw_candidate<R: Rng + ?Sized>(&mut self, room_id: u32, rng: &mut R) -> Result<Room, AbortReason> {
        let template_id = match self.scheduler.next_prefab(self.table, room_id, rng) {
            Schedule::Room(template) => template,
            Schedule::Restart { rule } => return Err(AbortReason::FixedRoomMissed { rule }),
            Schedule::PoolEmpty => return Err(AbortReason::EmptyPool),
        };
        let template = self.table.template(template_id).ok_or(AbortReason::MissingTemplate {
            template: template_id,
        })?;
        if room_id > 0 {
            self.state = GenerationState::PlacingNextRoom;
        }
        Ok(Room::instantiate(template_id, template))
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

    fn partial(&mut self, reason: AbortReason) -> GeneratedMap {
        warn!(
            "Editor generation stopped with {} of {} rooms: {}",
            self.rooms.len(),
            self.config.room_count,
            reason
        );
        self.candidate = None;
        self.state = GenerationState::Aborted(reason);
        GeneratedMap {
            rooms: self.rooms.clone(),
            connections: DoorGraph::new(),
            complete: false,
            report: self.report.clone(),
        }
    }

    fn complete(&mut self) -> GeneratedMap {
        let finalized = finalize(self.table, self.rooms.clone(), self.config);
        self.report.substitutions = finalized.substitutions;
        info!(
            "Generated {} rooms in {} steps",
            finalized.rooms.len(),
            self.report.steps
        );
        self.state = GenerationState::Completed;
        GeneratedMap {
            rooms: finalized.rooms,
            connections: finalized.connections,
            complete: true,
            report: self.report.clone(),
        }
    }
}

/// Offline map generator.
///
/// Never restarts; a search that gets stuck yields a partial map, which
/// [`Generator::validate`] rejects.
#[derive(Debug, Clone)]
pub struct EditorGenerator<'a> {
    table: &'a RoomTable,
}

impl<'a> EditorGenerator<'a> {
    /// Creates a generator over a room table.
    pub fn new(table: &'a RoomTable) -> Self {
        Self { table }
    }
}

impl Generator<GeneratedMap> for EditorGenerator<'_> {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> MapforgeResult<GeneratedMap> {
        let mut run = EditorRun::new(self.table, config)?;
        Ok(run.run(rng))
    }

    fn validate(&self, map: &GeneratedMap, config: &GenerationConfig) -> MapforgeResult<()> {
        utils::validate_map(map, self.table, config)
    }

    fn generator_type(&self) -> &'static str {
        "EditorGenerator"
    }
}
