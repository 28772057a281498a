#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Cooperative scheduler that distributes elapsed time to timed tasks.
//!
//! The scheduler never owns the state machines it drives. It hands out
//! [`TaskId`] handles, remembers whether each handle is running or paused, and
//! resolves handles through a [`TaskRegistry`] supplied by the owner of the
//! tasks whenever time has to be distributed.

use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    fmt,
    thread,
    time::{Duration, Instant},
};

use log::{debug, trace, warn};
use thiserror::Error;
use weapon_factory_core::{TaskId, TimedTask};

const FPS_SAMPLE_WINDOW: usize = 10;

/// Resolves scheduler handles to the state machines they stand for.
pub trait TaskRegistry {
    /// Returns the task behind `id`, or `None` when it no longer exists.
    fn task_mut(&mut self, id: TaskId) -> Option<&mut dyn TimedTask>;
}

impl<T: TimedTask> TaskRegistry for BTreeMap<TaskId, T> {
    fn task_mut(&mut self, id: TaskId) -> Option<&mut dyn TimedTask> {
        self.get_mut(&id).map(|task| task as &mut dyn TimedTask)
    }
}

impl<T: TimedTask> TaskRegistry for HashMap<TaskId, T> {
    fn task_mut(&mut self, id: TaskId) -> Option<&mut dyn TimedTask> {
        self.get_mut(&id).map(|task| task as &mut dyn TimedTask)
    }
}

/// Source of elapsed wall-clock time, read once per tick.
pub trait FrameClock: fmt::Debug {
    /// Returns the time elapsed since the previous call.
    fn tick(&mut self) -> Duration;

    /// Frames per second measured over the most recent ticks.
    fn measured_fps(&self) -> f64 {
        0.0
    }
}

/// Clock backed by [`Instant`] that caps the frame rate.
///
/// Reported durations are whole milliseconds; the sub-millisecond remainder is
/// carried into the next tick rather than dropped.
#[derive(Debug)]
pub struct WallClock {
    fps: u32,
    last: Instant,
    recent: VecDeque<Duration>,
}

impl WallClock {
    /// Creates a clock targeting `fps` frames per second; zero means uncapped.
    #[must_use]
    pub fn new(fps: u32) -> Self {
        Self {
            fps,
            last: Instant::now(),
            recent: VecDeque::with_capacity(FPS_SAMPLE_WINDOW),
        }
    }

    /// Target frame rate, zero when uncapped.
    #[must_use]
    pub const fn fps(&self) -> u32 {
        self.fps
    }
}

impl FrameClock for WallClock {
    fn tick(&mut self) -> Duration {
        if self.fps > 0 {
            let frame = Duration::from_secs(1) / self.fps;
            let spent = self.last.elapsed();
            if spent < frame {
                thread::sleep(frame - spent);
            }
        }

        let whole_millis = u64::try_from(self.last.elapsed().as_millis()).unwrap_or(u64::MAX);
        let elapsed = Duration::from_millis(whole_millis);
        self.last += elapsed;

        if !elapsed.is_zero() {
            if self.recent.len() == FPS_SAMPLE_WINDOW {
                let _ = self.recent.pop_front();
            }
            self.recent.push_back(elapsed);
        }
        elapsed
    }

    fn measured_fps(&self) -> f64 {
        if self.recent.is_empty() {
            return 0.0;
        }
        let total: Duration = self.recent.iter().sum();
        let average = total.as_secs_f64() / self.recent.len() as f64;
        if average > 0.0 {
            1.0 / average
        } else {
            0.0
        }
    }
}

/// Scripted clock replaying queued durations, for deterministic drivers.
#[derive(Debug, Default)]
pub struct ManualClock {
    queued: VecDeque<Duration>,
}

impl ManualClock {
    /// Creates a clock that will report the provided durations in order.
    #[must_use]
    pub fn scripted(durations: impl IntoIterator<Item = Duration>) -> Self {
        Self {
            queued: durations.into_iter().collect(),
        }
    }

    /// Queues another duration to report.
    pub fn push(&mut self, elapsed: Duration) {
        self.queued.push_back(elapsed);
    }
}

impl FrameClock for ManualClock {
    fn tick(&mut self) -> Duration {
        self.queued.pop_front().unwrap_or(Duration::ZERO)
    }
}

/// Failures reported by scheduler membership operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// The handle is neither running nor paused.
    #[error("{0} is not registered with the scheduler")]
    UnknownTask(TaskId),
}

/// Outcome of a pause or resume request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The task changed set.
    Moved,
    /// The task already was in the requested set.
    Unchanged,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lane {
    Running,
    Paused,
}

/// Owns the running and paused task sets and distributes elapsed time.
#[derive(Debug)]
pub struct Scheduler {
    clock: Box<dyn FrameClock>,
    next_id: u64,
    lanes: BTreeMap<TaskId, Lane>,
    running: usize,
    paused: usize,
    snapshot: Vec<TaskId>,
}

impl Scheduler {
    /// Creates a scheduler reading elapsed time from the provided clock.
    #[must_use]
    pub fn new(clock: impl FrameClock + 'static) -> Self {
        Self {
            clock: Box::new(clock),
            next_id: 0,
            lanes: BTreeMap::new(),
            running: 0,
            paused: 0,
            snapshot: Vec::new(),
        }
    }

    /// Allocates a handle for a new task and places it in the paused set.
    pub fn register(&mut self) -> TaskId {
        let id = TaskId::new(self.next_id);
        self.next_id += 1;
        let _ = self.lanes.insert(id, Lane::Paused);
        self.paused += 1;
        debug!("registered paused {id}");
        id
    }

    /// Removes the task from whichever set holds it.
    pub fn unregister(&mut self, id: TaskId) -> Result<(), SchedulerError> {
        match self.lanes.remove(&id) {
            Some(Lane::Running) => {
                self.running -= 1;
                debug!("unregistered running {id}");
            }
            Some(Lane::Paused) => {
                self.paused -= 1;
                debug!("unregistered paused {id}");
            }
            None => return Err(SchedulerError::UnknownTask(id)),
        }
        Ok(())
    }

    /// Moves the task to the paused set.
    pub fn pause(&mut self, id: TaskId) -> Result<Transition, SchedulerError> {
        self.move_to(id, Lane::Paused)
    }

    /// Moves the task to the running set.
    pub fn resume(&mut self, id: TaskId) -> Result<Transition, SchedulerError> {
        self.move_to(id, Lane::Running)
    }

    /// Reads the clock and distributes the elapsed time to running tasks.
    ///
    /// Returns the elapsed time reported by the clock.
    pub fn tick<R>(&mut self, registry: &mut R) -> Duration
    where
        R: TaskRegistry + ?Sized,
    {
        let elapsed = self.clock.tick();
        self.advance(elapsed, registry)
    }

    /// Distributes `elapsed` to every running task in registration order.
    ///
    /// Tasks reporting completion right after receiving time are parked before
    /// the next task is visited. Tasks unregistered or paused while the
    /// iteration is in progress are skipped; tasks resumed during it wait for
    /// the next tick. A zero duration leaves every task untouched.
    pub fn advance<R>(&mut self, elapsed: Duration, registry: &mut R) -> Duration
    where
        R: TaskRegistry + ?Sized,
    {
        if elapsed.is_zero() || self.running == 0 {
            return elapsed;
        }

        let mut snapshot = std::mem::take(&mut self.snapshot);
        snapshot.clear();
        snapshot.extend(self.running_tasks());
        trace!(
            "tick: {} ms to {} running tasks",
            elapsed.as_millis(),
            snapshot.len()
        );

        for &id in &snapshot {
            if self.lane(id) != Some(Lane::Running) {
                continue;
            }

            let Some(task) = registry.task_mut(id) else {
                warn!("{id} no longer resolves to a task; dropping it");
                let _ = self.unregister(id);
                continue;
            };

            task.add_time(elapsed);
            if task.is_done() {
                let _ = self.move_to(id, Lane::Paused);
            }
        }

        self.snapshot = snapshot;
        elapsed
    }

    /// Reports whether the task is in the running set.
    #[must_use]
    pub fn is_running(&self, id: TaskId) -> bool {
        self.lane(id) == Some(Lane::Running)
    }

    /// Reports whether the task is in the paused set.
    #[must_use]
    pub fn is_paused(&self, id: TaskId) -> bool {
        self.lane(id) == Some(Lane::Paused)
    }

    /// Reports whether the handle is known to the scheduler.
    #[must_use]
    pub fn is_registered(&self, id: TaskId) -> bool {
        self.lane(id).is_some()
    }

    /// Number of tasks in the running set.
    #[must_use]
    pub const fn running_task_count(&self) -> usize {
        self.running
    }

    /// Number of tasks in the paused set.
    #[must_use]
    pub const fn paused_task_count(&self) -> usize {
        self.paused
    }

    /// Frames per second measured by the underlying clock.
    #[must_use]
    pub fn measured_fps(&self) -> f64 {
        self.clock.measured_fps()
    }

    /// Handles of the running tasks in registration order.
    pub fn running_tasks(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.lanes
            .iter()
            .filter(|(_, lane)| **lane == Lane::Running)
            .map(|(id, _)| *id)
    }

    fn move_to(&mut self, id: TaskId, target: Lane) -> Result<Transition, SchedulerError> {
        let slot = self
            .lanes
            .get_mut(&id)
            .ok_or(SchedulerError::UnknownTask(id))?;
        if *slot == target {
            debug!("{id} already {target:?}; nothing to do");
            return Ok(Transition::Unchanged);
        }

        *slot = target;
        match target {
            Lane::Running => {
                self.paused -= 1;
                self.running += 1;
                debug!("resumed {id}");
            }
            Lane::Paused => {
                self.running -= 1;
                self.paused += 1;
                debug!("paused {id}");
            }
        }
        Ok(Transition::Moved)
    }

    fn lane(&self, id: TaskId) -> Option<Lane> {
        self.lanes.get(&id).copied()
    }
}
