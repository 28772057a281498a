#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative simulation state for Weapon Factory.
//!
//! A [`World`] owns the scheduler, the obstacle grid and the path finder of one
//! session together with every entity and animation. Callers mutate it only
//! through [`apply`] and observe it through the [`query`] module and the events
//! pushed by each command.

mod arena;
mod compass;
mod config;
mod entity;
mod navigation;

use std::{
    collections::{BTreeMap, HashMap},
    time::Duration,
};

use log::{debug, info, warn};
use weapon_factory_core::{
    AnimationDefinition, AnimationId, Command, EntityId, EntityProfile, Event, GridEvent,
    SpawnError, Square, TaskId, TerrainMap, TimedTask, WorldPoint,
};
use weapon_factory_system_animation::AnimationState;
use weapon_factory_system_clock::{FrameClock, Scheduler, TaskRegistry, WallClock};

pub use arena::Arena;
pub use compass::{Compass, SearchBudget};
pub use config::{profile_from_toml_str, SimulationConfig};
pub use navigation::{HopOutcome, NavPath};

use entity::{Entity, Surroundings};

/// Simulation context of one game session.
#[derive(Debug)]
pub struct World {
    config: SimulationConfig,
    scheduler: Scheduler,
    arena: Arena,
    compass: Compass,
    actors: Actors,
    next_entity: u32,
    next_animation: u32,
    tick_index: u64,
}

impl World {
    /// Creates a world over the terrain, timed by a wall clock capped at the
    /// configured frame rate.
    pub fn new(config: SimulationConfig, terrain: &TerrainMap) -> anyhow::Result<Self> {
        let clock = WallClock::new(config.fps);
        Self::with_clock(config, terrain, clock)
    }

    /// Creates a world reading elapsed time from the provided clock.
    ///
    /// Fails when the configuration does not pass [`SimulationConfig::validate`].
    pub fn with_clock(
        config: SimulationConfig,
        terrain: &TerrainMap,
        clock: impl FrameClock + 'static,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        let arena = Arena::new(terrain, config.square_width, config.square_height);
        let compass = Compass::new(config.search);
        info!(
            "world ready: {}x{} squares of {}x{} px",
            arena.columns(),
            arena.rows(),
            config.square_width,
            config.square_height
        );
        Ok(Self {
            scheduler: Scheduler::new(clock),
            arena,
            compass,
            actors: Actors::default(),
            next_entity: 0,
            next_animation: 0,
            tick_index: 0,
            config,
        })
    }

    fn spawn_entity(&mut self, profile: &EntityProfile, at: WorldPoint, out_events: &mut Vec<Event>) {
        let (square, animation) = match self.check_spawn(profile, at) {
            Ok(accepted) => accepted,
            Err(reason) => {
                info!("spawn of `{}` at {at} rejected: {reason}", profile.name);
                out_events.push(Event::SpawnRejected { at, reason });
                return;
            }
        };

        let id = EntityId::new(self.next_entity);
        self.next_entity += 1;
        let mut entity = Entity::spawn(id, profile, at, square, &mut self.scheduler, &mut self.arena);
        let _ = self
            .actors
            .owners
            .insert(entity.rotation.task(), TaskOwner::Rotation(id));
        let _ = self
            .actors
            .owners
            .insert(entity.translation.task(), TaskOwner::Translation(id));
        out_events.push(Event::EntitySpawned { entity: id, square });

        if let Some(state) = animation {
            let animation = self.start_animation(state, Some(id));
            entity.animation = Some(animation);
            out_events.push(Event::AnimationStarted { animation });
        }
        let _ = self.actors.entities.insert(id, entity);
    }

    fn check_spawn(
        &self,
        profile: &EntityProfile,
        at: WorldPoint,
    ) -> Result<(Square, Option<AnimationState>), SpawnError> {
        let positive = |value: f64| value.is_finite() && value > 0.0;
        if !positive(profile.speed)
            || !positive(profile.angular_speed)
            || !profile.orig_angle.is_finite()
        {
            return Err(SpawnError::InvalidProfile);
        }
        if self.next_entity == u32::MAX
            || (profile.animation.is_some() && self.next_animation == u32::MAX)
        {
            return Err(SpawnError::IdsExhausted);
        }
        let square = self.arena.square_of(at).ok_or(SpawnError::OutOfBounds)?;
        if self.arena.is_obstacle(square) {
            return Err(SpawnError::Obstacle);
        }
        let animation = profile
            .animation
            .as_ref()
            .map(AnimationState::new)
            .transpose()
            .map_err(|_| SpawnError::InvalidAnimation)?;
        Ok((square, animation))
    }

    fn despawn_entity(&mut self, id: EntityId, out_events: &mut Vec<Event>) {
        let Some(entity) = self.actors.entities.remove(&id) else {
            out_events.push(Event::UnknownEntity { entity: id });
            return;
        };

        for task in entity.tasks() {
            let _ = self.actors.owners.remove(&task);
            if let Err(error) = self.scheduler.unregister(task) {
                warn!("despawning {id}: {error}");
            }
        }
        if let Some(animation) = entity.animation {
            let _ = self.stop_animation(animation);
        }
        let square = entity.square();
        self.arena.notify(id, GridEvent::RemovedFrom(square));
        debug!("{id} despawned from {square}");
        out_events.push(Event::EntityDespawned { entity: id, square });
    }

    /// Callers check that `next_animation` has not reached `u32::MAX`.
    fn start_animation(&mut self, state: AnimationState, owner: Option<EntityId>) -> AnimationId {
        let id = AnimationId::new(self.next_animation);
        self.next_animation += 1;
        let task = self.scheduler.register();
        let _ = self.actors.owners.insert(task, TaskOwner::Animation(id));
        debug!("animation `{}` started as {task}", state.name());
        let _ = self.actors.animations.insert(
            id,
            Playback {
                task,
                state,
                owner,
                reported: false,
            },
        );
        if let Err(error) = self.scheduler.resume(task) {
            warn!("animation {task} could not start: {error}");
        }
        id
    }

    fn stop_animation(&mut self, id: AnimationId) -> bool {
        let Some(playback) = self.actors.animations.remove(&id) else {
            return false;
        };
        let _ = self.actors.owners.remove(&playback.task);
        if let Err(error) = self.scheduler.unregister(playback.task) {
            warn!("stopping animation `{}`: {error}", playback.state.name());
        }
        if let Some(owner) = playback.owner {
            if let Some(entity) = self.actors.entities.get_mut(&owner) {
                entity.animation = None;
            }
        }
        true
    }

    fn drive_entities(&mut self, out_events: &mut Vec<Event>) {
        let Self {
            scheduler,
            arena,
            compass,
            actors,
            ..
        } = self;
        let mut surroundings = Surroundings {
            scheduler,
            arena,
            compass,
        };
        for entity in actors.entities.values_mut() {
            entity.next_move(&mut surroundings, out_events);
        }
    }

    fn finish_tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced { dt });

        for (id, playback) in &mut self.actors.animations {
            if playback.state.is_done() && !playback.reported {
                playback.reported = true;
                out_events.push(Event::AnimationFinished { animation: *id });
            }
        }
    }
}

/// Applies the provided command to the world.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SpawnEntity { profile, at } => world.spawn_entity(&profile, at, out_events),
        Command::DespawnEntity { entity } => world.despawn_entity(entity, out_events),
        Command::Navigate {
            entity,
            destination,
        } => match world.actors.entities.get_mut(&entity) {
            Some(found) => found.navigate(destination, &world.arena, &world.compass, out_events),
            None => out_events.push(Event::UnknownEntity { entity }),
        },
        Command::MoveTo { entity, point } => match world.actors.entities.get_mut(&entity) {
            Some(found) => {
                if let Err(reason) = found.move_to(point, &world.arena) {
                    out_events.push(Event::MoveRejected {
                        entity,
                        point,
                        reason,
                    });
                }
            }
            None => out_events.push(Event::UnknownEntity { entity }),
        },
        Command::LookAt { entity, point } => match world.actors.entities.get_mut(&entity) {
            Some(found) => found.look_at(point),
            None => out_events.push(Event::UnknownEntity { entity }),
        },
        Command::Stop { entity } => match world.actors.entities.get_mut(&entity) {
            Some(found) => found.stop(),
            None => out_events.push(Event::UnknownEntity { entity }),
        },
        Command::SetObstacle { square } => {
            if !world.arena.set_obstacle(square) {
                warn!("ignored obstacle outside of the grid at {square}");
            }
        }
        Command::SetWalkable { square } => {
            if !world.arena.set_walkable(square) {
                warn!("ignored walkable square outside of the grid at {square}");
            }
        }
        Command::StartAnimation { definition } => start_free_animation(world, &definition, out_events),
        Command::PauseAnimation { animation } => {
            let Some(playback) = world.actors.animations.get(&animation) else {
                out_events.push(Event::UnknownAnimation { animation });
                return;
            };
            if let Err(error) = world.scheduler.pause(playback.task) {
                warn!("pausing animation: {error}");
            }
        }
        Command::ResumeAnimation { animation } => {
            let Some(playback) = world.actors.animations.get(&animation) else {
                out_events.push(Event::UnknownAnimation { animation });
                return;
            };
            if playback.state.is_done() {
                debug!("animation `{}` is finished; rewind it first", playback.state.name());
                return;
            }
            if let Err(error) = world.scheduler.resume(playback.task) {
                warn!("resuming animation: {error}");
            }
        }
        Command::RewindAnimation { animation } => {
            match world.actors.animations.get_mut(&animation) {
                Some(playback) => {
                    playback.state.rewind();
                    playback.reported = false;
                }
                None => out_events.push(Event::UnknownAnimation { animation }),
            }
        }
        Command::StopAnimation { animation } => {
            if !world.stop_animation(animation) {
                out_events.push(Event::UnknownAnimation { animation });
            }
        }
        Command::Tick { dt } => {
            world.drive_entities(out_events);
            let elapsed = world.scheduler.advance(dt, &mut world.actors);
            world.finish_tick(elapsed, out_events);
        }
    }
}

/// Runs one frame against the world's own clock.
///
/// Every entity driver runs first, then the scheduler distributes the time
/// elapsed since the previous frame. Returns that elapsed time.
pub fn run_frame(world: &mut World, out_events: &mut Vec<Event>) -> Duration {
    world.drive_entities(out_events);
    let elapsed = world.scheduler.tick(&mut world.actors);
    world.finish_tick(elapsed, out_events);
    elapsed
}

fn start_free_animation(
    world: &mut World,
    definition: &AnimationDefinition,
    out_events: &mut Vec<Event>,
) {
    if world.next_animation == u32::MAX {
        warn!("no animation ids left for `{}`", definition.name);
        out_events.push(Event::AnimationRejected {
            name: definition.name.clone(),
        });
        return;
    }
    match AnimationState::new(definition) {
        Ok(state) => {
            let animation = world.start_animation(state, None);
            out_events.push(Event::AnimationStarted { animation });
        }
        Err(error) => {
            warn!("{error}");
            out_events.push(Event::AnimationRejected {
                name: definition.name.clone(),
            });
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum TaskOwner {
    Rotation(EntityId),
    Translation(EntityId),
    Animation(AnimationId),
}

#[derive(Debug)]
struct Playback {
    task: TaskId,
    state: AnimationState,
    owner: Option<EntityId>,
    reported: bool,
}

#[derive(Debug, Default)]
struct Actors {
    entities: BTreeMap<EntityId, Entity>,
    animations: BTreeMap<AnimationId, Playback>,
    owners: HashMap<TaskId, TaskOwner>,
}

impl TaskRegistry for Actors {
    fn task_mut(&mut self, id: TaskId) -> Option<&mut dyn TimedTask> {
        match *self.owners.get(&id)? {
            TaskOwner::Rotation(entity) => self
                .entities
                .get_mut(&entity)
                .map(|entity| &mut entity.rotation as &mut dyn TimedTask),
            TaskOwner::Translation(entity) => self
                .entities
                .get_mut(&entity)
                .map(|entity| &mut entity.translation as &mut dyn TimedTask),
            TaskOwner::Animation(animation) => self
                .animations
                .get_mut(&animation)
                .map(|playback| &mut playback.state as &mut dyn TimedTask),
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{Arena, SimulationConfig, World};
    use weapon_factory_core::{
        AnimationId, EntityId, EntitySnapshot, EntityView, NoPath, Square, SquareRect, TimedTask,
        WorldRect,
    };

    /// Captures a read-only view of every entity.
    #[must_use]
    pub fn entity_view(world: &World) -> EntityView {
        EntityView::from_snapshots(
            world
                .actors
                .entities
                .values()
                .map(|entity| entity.snapshot())
                .collect(),
        )
    }

    /// Captures the state of a single entity.
    #[must_use]
    pub fn entity(world: &World, id: EntityId) -> Option<EntitySnapshot> {
        world.actors.entities.get(&id).map(|entity| entity.snapshot())
    }

    /// Provides read-only access to the obstacle grid.
    #[must_use]
    pub fn arena(world: &World) -> &Arena {
        &world.arena
    }

    /// Reports whether the square is blocked by terrain or an entity.
    #[must_use]
    pub fn is_obstacle(world: &World, square: Square) -> bool {
        world.arena.is_obstacle(square)
    }

    /// Entities on the square; empty outside the grid.
    #[must_use]
    pub fn entities_at(world: &World, square: Square) -> Vec<EntityId> {
        world.arena.entities_at(square)
    }

    /// Entities on any square touched by the world rectangle.
    #[must_use]
    pub fn entities_in(world: &World, rect: WorldRect) -> Vec<EntityId> {
        world.arena.entities_in(rect)
    }

    /// Entities on any square of the square rectangle.
    #[must_use]
    pub fn entities_in_squares(world: &World, rect: SquareRect) -> Vec<EntityId> {
        world.arena.entities_in_squares(rect)
    }

    /// Runs a path search on the live grid without moving anything.
    pub fn find_path(world: &World, from: Square, to: Square) -> Result<Vec<Square>, NoPath> {
        world.compass.find_path(&world.arena, from, to)
    }

    /// Frame the render collaborator should draw for the animation.
    #[must_use]
    pub fn animation_frame(world: &World, animation: AnimationId) -> Option<&str> {
        world
            .actors
            .animations
            .get(&animation)
            .map(|playback| playback.state.frame())
    }

    /// Reports whether a non-looping animation played its last frame.
    #[must_use]
    pub fn is_animation_finished(world: &World, animation: AnimationId) -> Option<bool> {
        world
            .actors
            .animations
            .get(&animation)
            .map(|playback| playback.state.is_done())
    }

    /// Reports whether the animation currently receives time.
    #[must_use]
    pub fn is_animation_running(world: &World, animation: AnimationId) -> bool {
        world
            .actors
            .animations
            .get(&animation)
            .is_some_and(|playback| world.scheduler.is_running(playback.task))
    }

    /// Animation attached to the entity, if any.
    #[must_use]
    pub fn entity_animation(world: &World, entity: EntityId) -> Option<AnimationId> {
        world
            .actors
            .entities
            .get(&entity)
            .and_then(|found| found.animation)
    }

    /// Number of tasks receiving time.
    #[must_use]
    pub fn running_task_count(world: &World) -> usize {
        world.scheduler.running_task_count()
    }

    /// Number of registered tasks not receiving time.
    #[must_use]
    pub fn paused_task_count(world: &World) -> usize {
        world.scheduler.paused_task_count()
    }

    /// Frames per second measured by the world clock.
    #[must_use]
    pub fn measured_fps(world: &World) -> f64 {
        world.scheduler.measured_fps()
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Settings the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &SimulationConfig {
        &world.config
    }

    /// Grid dimensions as columns and rows.
    #[must_use]
    pub fn dimensions(world: &World) -> (u32, u32) {
        (world.arena.columns(), world.arena.rows())
    }

    /// Text rendering of the obstacle grid used in debug output.
    #[must_use]
    pub fn obstacle_map(world: &World) -> String {
        world.arena.obstacle_map()
    }
}
