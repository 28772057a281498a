use std::time::Duration;

use log::trace;
use weapon_factory_core::{millis_f64, TaskId, TimedTask, WorldPoint};
use weapon_factory_system_clock::{Scheduler, SchedulerError};

/// Moves a position in a straight line toward a target at constant speed.
#[derive(Clone, Debug)]
pub struct Translation {
    task: TaskId,
    position: WorldPoint,
    target: WorldPoint,
    speed: f64,
}

impl Translation {
    /// Creates an idle translation bound to an already registered task handle.
    ///
    /// `speed` is expressed in pixels per millisecond.
    #[must_use]
    pub const fn new(task: TaskId, position: WorldPoint, speed: f64) -> Self {
        Self {
            task,
            position,
            target: position,
            speed,
        }
    }

    /// Registers a new task with the scheduler and creates an idle translation for it.
    pub fn register(scheduler: &mut Scheduler, position: WorldPoint, speed: f64) -> Self {
        Self::new(scheduler.register(), position, speed)
    }

    /// Scheduler handle driving this translation.
    #[must_use]
    pub const fn task(&self) -> TaskId {
        self.task
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> WorldPoint {
        self.position
    }

    /// Position being moved to; equals [`Translation::position`] when idle.
    #[must_use]
    pub const fn target(&self) -> WorldPoint {
        self.target
    }

    /// Starts moving toward `point`.
    ///
    /// Returns `true` when the translation has somewhere to go.
    pub fn move_to(
        &mut self,
        point: WorldPoint,
        scheduler: &mut Scheduler,
    ) -> Result<bool, SchedulerError> {
        self.target = point;
        if self.is_done() {
            return Ok(false);
        }
        trace!("{} heading from {} to {}", self.task, self.position, self.target);
        let _ = scheduler.resume(self.task)?;
        Ok(true)
    }
}

impl TimedTask for Translation {
    fn add_time(&mut self, elapsed: Duration) {
        assert!(!self.is_done(), "{} received time while idle", self.task);

        let offset = self.target - self.position;
        let distance = offset.length();
        let step = offset.unit().scale(self.speed * millis_f64(elapsed));
        if step.length() < distance {
            self.position = self.position + step;
        } else {
            self.position = self.target;
        }
    }

    fn is_done(&self) -> bool {
        self.position == self.target
    }
}
