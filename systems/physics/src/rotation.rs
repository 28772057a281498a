use std::time::Duration;

use log::{debug, trace};
use weapon_factory_core::{millis_f64, TaskId, TimedTask, TurnDirection, WorldPoint};
use weapon_factory_system_clock::{Scheduler, SchedulerError, Transition};

/// Degrees in a full turn.
pub const FULL_TURN: f64 = 360.0;

/// Angle in degrees, within `[0, 360)`, at which `to` is seen from `from`.
///
/// Zero points along the positive x axis and angles grow counter-clockwise on
/// screen, where y grows downwards. Returns `None` when both points coincide
/// or either of them is not finite.
#[must_use]
pub fn bearing(from: WorldPoint, to: WorldPoint) -> Option<f64> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;

    if !dx.is_finite() || !dy.is_finite() || (dx == 0.0 && dy == 0.0) {
        return None;
    }
    if dy == 0.0 {
        return Some(if dx > 0.0 { 0.0 } else { 180.0 });
    }
    if dx == 0.0 {
        return Some(if dy < 0.0 { 90.0 } else { 270.0 });
    }

    let length = dx.hypot(dy);
    let acute = (dy.abs() / length).asin().to_degrees();
    let angle = match (dx > 0.0, dy < 0.0) {
        (true, true) => acute,
        (false, true) => 180.0 - acute,
        (false, false) => 180.0 + acute,
        (true, false) => FULL_TURN - acute,
    };
    Some(angle.rem_euclid(FULL_TURN))
}

/// Turns an orientation toward a target angle at constant angular speed.
#[derive(Clone, Debug)]
pub struct Rotation {
    task: TaskId,
    current: f64,
    target: f64,
    direction: TurnDirection,
    angular_speed: f64,
}

impl Rotation {
    /// Creates an idle rotation bound to an already registered task handle.
    ///
    /// `angular_speed` is expressed in degrees per millisecond.
    #[must_use]
    pub fn new(task: TaskId, angle: f64, angular_speed: f64) -> Self {
        let angle = angle.rem_euclid(FULL_TURN);
        Self {
            task,
            current: angle,
            target: angle,
            direction: TurnDirection::CounterClockwise,
            angular_speed,
        }
    }

    /// Registers a new task with the scheduler and creates an idle rotation for it.
    pub fn register(scheduler: &mut Scheduler, angle: f64, angular_speed: f64) -> Self {
        Self::new(scheduler.register(), angle, angular_speed)
    }

    /// Scheduler handle driving this rotation.
    #[must_use]
    pub const fn task(&self) -> TaskId {
        self.task
    }

    /// Current orientation in degrees.
    #[must_use]
    pub const fn angle(&self) -> f64 {
        self.current
    }

    /// Orientation being turned to; equals [`Rotation::angle`] when idle.
    #[must_use]
    pub const fn target(&self) -> f64 {
        self.target
    }

    /// Direction of the current or most recent turn.
    #[must_use]
    pub const fn direction(&self) -> TurnDirection {
        self.direction
    }

    /// Turns to face `to` as seen from `from`.
    ///
    /// Returns `true` when a turn was started. Coincident points and targets
    /// equal to the current angle leave the rotation untouched.
    pub fn look_at(
        &mut self,
        from: WorldPoint,
        to: WorldPoint,
        scheduler: &mut Scheduler,
    ) -> Result<bool, SchedulerError> {
        match bearing(from, to) {
            Some(angle) => self.turn_to(angle, scheduler),
            None => Ok(false),
        }
    }

    /// Turns toward `angle` along the shorter arc, counter-clockwise on ties.
    pub fn turn_to(&mut self, angle: f64, scheduler: &mut Scheduler) -> Result<bool, SchedulerError> {
        let target = angle.rem_euclid(FULL_TURN);
        if target == self.current {
            return Ok(false);
        }

        let counter_clockwise = (target - self.current).rem_euclid(FULL_TURN);
        let clockwise = FULL_TURN - counter_clockwise;
        self.direction = if counter_clockwise <= clockwise {
            TurnDirection::CounterClockwise
        } else {
            TurnDirection::Clockwise
        };
        self.target = target;
        debug!(
            "{}: turning {:?} from {:.2} to {:.2}",
            self.task, self.direction, self.current, self.target
        );

        if scheduler.resume(self.task)? == Transition::Unchanged {
            trace!("{} retargeted while turning", self.task);
        }
        Ok(true)
    }

    /// Degrees left to turn in the current direction.
    #[must_use]
    pub fn remaining_arc(&self) -> f64 {
        match self.direction {
            TurnDirection::CounterClockwise => (self.target - self.current).rem_euclid(FULL_TURN),
            TurnDirection::Clockwise => (self.current - self.target).rem_euclid(FULL_TURN),
        }
    }
}

impl TimedTask for Rotation {
    fn add_time(&mut self, elapsed: Duration) {
        assert!(!self.is_done(), "{} received time while idle", self.task);

        let step = millis_f64(elapsed) * self.angular_speed;
        if step >= self.remaining_arc() {
            self.current = self.target;
            trace!("{} facing {:.2}", self.task, self.current);
        } else {
            self.current = (self.current + self.direction.sign() * step).rem_euclid(FULL_TURN);
        }
    }

    fn is_done(&self) -> bool {
        self.current == self.target
    }
}
