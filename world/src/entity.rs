//! Entities and the driver turning navigation paths into queued moves.

use std::collections::VecDeque;

use log::{debug, info, warn};
use weapon_factory_core::{
    AnimationId, EntityId, EntityProfile, EntitySnapshot, Event, GridEvent, Move, MoveError,
    Square, TaskId, TimedTask, WorldPoint,
};
use weapon_factory_system_clock::{Scheduler, SchedulerError};
use weapon_factory_system_physics::{Rotation, Translation};

use crate::{
    navigation::{HopOutcome, NavPath},
    Arena, Compass,
};

/// Shared state an entity driver needs to act.
pub(crate) struct Surroundings<'a> {
    pub(crate) scheduler: &'a mut Scheduler,
    pub(crate) arena: &'a mut Arena,
    pub(crate) compass: &'a Compass,
}

#[derive(Debug)]
pub(crate) struct Entity {
    id: EntityId,
    name: String,
    square: Square,
    pub(crate) rotation: Rotation,
    pub(crate) translation: Translation,
    moves: VecDeque<Move>,
    nav_path: NavPath,
    pub(crate) animation: Option<AnimationId>,
}

impl Entity {
    /// Registers the entity's motion tasks and claims its square.
    pub(crate) fn spawn(
        id: EntityId,
        profile: &EntityProfile,
        at: WorldPoint,
        square: Square,
        scheduler: &mut Scheduler,
        arena: &mut Arena,
    ) -> Self {
        let rotation = Rotation::register(scheduler, profile.orig_angle, profile.angular_speed);
        let translation = Translation::register(scheduler, at, profile.speed);
        arena.notify(id, GridEvent::SpawnedAt(square));
        debug!(
            "{id} `{}` spawned at {at}, speed {} px/ms",
            profile.name, profile.speed
        );

        Self {
            id,
            name: profile.name.clone(),
            square,
            rotation,
            translation,
            moves: VecDeque::new(),
            nav_path: NavPath::new(),
            animation: None,
        }
    }

    pub(crate) const fn square(&self) -> Square {
        self.square
    }

    pub(crate) fn tasks(&self) -> [TaskId; 2] {
        [self.rotation.task(), self.translation.task()]
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.is_still() && self.moves.is_empty() && self.nav_path.is_done()
    }

    fn is_still(&self) -> bool {
        self.rotation.is_done() && self.translation.is_done()
    }

    /// Drops queued moves and the navigation path; motion in progress finishes.
    pub(crate) fn stop(&mut self) {
        self.moves.clear();
        self.nav_path.clear();
    }

    /// Plans a route to `destination` and queues the first hop.
    pub(crate) fn navigate(
        &mut self,
        destination: Square,
        arena: &Arena,
        compass: &Compass,
        out_events: &mut Vec<Event>,
    ) {
        self.stop();
        match compass.find_path(arena, self.square, destination) {
            Ok(hops) => {
                self.nav_path.set(hops.clone());
                self.queue_current_hop(arena);
                out_events.push(Event::NavigationStarted {
                    entity: self.id,
                    hops,
                });
            }
            Err(reason) => {
                info!("{} cannot navigate to {destination}: {reason}", self.id);
                out_events.push(Event::PathNotFound {
                    entity: self.id,
                    destination,
                    reason,
                });
            }
        }
    }

    /// Validates a direct move and queues the turn and translation for it.
    pub(crate) fn move_to(&mut self, point: WorldPoint, arena: &Arena) -> Result<(), MoveError> {
        let target = arena.square_of(point).ok_or(MoveError::OutOfBounds)?;
        if !self.square.is_next_to(target) {
            return Err(MoveError::NotAdjacent);
        }
        if target != self.square && arena.is_obstacle(target) {
            return Err(MoveError::Obstacle);
        }
        self.stop();
        self.moves.push_back(Move::LookAt(point));
        self.moves.push_back(Move::JumpTo(point));
        Ok(())
    }

    /// Queues a turn toward `point`.
    pub(crate) fn look_at(&mut self, point: WorldPoint) {
        self.moves.push_back(Move::LookAt(point));
    }

    /// Runs one step of the movement driver.
    ///
    /// Nothing happens while the entity is turning or translating. Otherwise
    /// one queued move is performed, or the next hop of the navigation path is
    /// queued as a turn followed by a translation.
    pub(crate) fn next_move(&mut self, world: &mut Surroundings<'_>, out_events: &mut Vec<Event>) {
        if !self.is_still() {
            return;
        }

        if let Some(next) = self.moves.pop_front() {
            self.perform(next, world, out_events);
            return;
        }

        match self.nav_path.next_hop(self.square, world.arena, world.compass) {
            HopOutcome::Idle => {}
            HopOutcome::Arrived => {
                info!("{} reached {}", self.id, self.square);
                out_events.push(Event::DestinationReached {
                    entity: self.id,
                    square: self.square,
                });
            }
            HopOutcome::Next(_) => self.queue_current_hop(world.arena),
            HopOutcome::Replanned { blocked, hops } => {
                self.queue_current_hop(world.arena);
                out_events.push(Event::Replanned {
                    entity: self.id,
                    blocked,
                    hops,
                });
            }
            HopOutcome::StoppedShort { blocked } => {
                out_events.push(Event::StoppedShort {
                    entity: self.id,
                    square: self.square,
                    destination: blocked,
                });
            }
            HopOutcome::Stranded {
                destination,
                reason,
            } => {
                out_events.push(Event::PathNotFound {
                    entity: self.id,
                    destination,
                    reason,
                });
            }
        }
    }

    pub(crate) fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            id: self.id,
            name: self.name.clone(),
            square: self.square,
            position: self.translation.position(),
            orientation: self.rotation.angle(),
            is_idle: self.is_idle(),
            current_hop: self.nav_path.hop(),
            remaining_hops: self.nav_path.queued().collect(),
        }
    }

    fn queue_current_hop(&mut self, arena: &Arena) {
        if let Some(hop) = self.nav_path.hop() {
            let center = arena.square_center(hop);
            self.moves.push_back(Move::LookAt(center));
            self.moves.push_back(Move::JumpTo(center));
        }
    }

    fn perform(&mut self, next: Move, world: &mut Surroundings<'_>, out_events: &mut Vec<Event>) {
        match next {
            Move::LookAt(point) => {
                let position = self.translation.position();
                let turned = self.rotation.look_at(position, point, world.scheduler);
                self.report_scheduler(turned);
            }
            Move::JumpTo(point) => self.jump_to(point, world, out_events),
        }
    }

    fn jump_to(&mut self, point: WorldPoint, world: &mut Surroundings<'_>, out_events: &mut Vec<Event>) {
        let Some(target) = world.arena.square_of(point) else {
            out_events.push(Event::MoveRejected {
                entity: self.id,
                point,
                reason: MoveError::OutOfBounds,
            });
            return;
        };

        if target != self.square {
            if world.arena.is_obstacle(target) {
                self.blocked_jump(target, point, world, out_events);
                return;
            }
            let from = self.square;
            world.arena.notify(self.id, GridEvent::MovedTo { from, to: target });
            self.square = target;
            out_events.push(Event::EntityMoved {
                entity: self.id,
                from,
                to: target,
            });
        }

        let moved = self.translation.move_to(point, world.scheduler);
        self.report_scheduler(moved);
    }

    fn blocked_jump(
        &mut self,
        target: Square,
        point: WorldPoint,
        world: &mut Surroundings<'_>,
        out_events: &mut Vec<Event>,
    ) {
        if self.nav_path.hop() != Some(target) {
            out_events.push(Event::MoveRejected {
                entity: self.id,
                point,
                reason: MoveError::Obstacle,
            });
            return;
        }

        self.moves.clear();
        if self.nav_path.queued().next().is_none() {
            info!("{} found destination {target} blocked; stopping at {}", self.id, self.square);
            self.nav_path.clear();
            out_events.push(Event::StoppedShort {
                entity: self.id,
                square: self.square,
                destination: target,
            });
            return;
        }

        info!("{} found hop {target} blocked; re-planning", self.id);
        let destination = self.nav_path.destination().unwrap_or(target);
        match self.nav_path.replan(self.square, world.arena, world.compass) {
            Ok(hops) => {
                self.queue_current_hop(world.arena);
                out_events.push(Event::Replanned {
                    entity: self.id,
                    blocked: target,
                    hops,
                });
            }
            Err(reason) => {
                out_events.push(Event::PathNotFound {
                    entity: self.id,
                    destination,
                    reason,
                });
            }
        }
    }

    fn report_scheduler(&self, outcome: Result<bool, SchedulerError>) {
        if let Err(error) = outcome {
            warn!("{} motion task rejected: {error}", self.id);
        }
    }
}
