#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Weapon Factory simulation.
//!
//! This crate defines the vocabulary that connects the tick-driven state
//! machines, the authoritative world, and the excluded application shell.
//! The shell submits [`Command`] values describing intents, the world executes
//! them via its `apply` entry point and broadcasts [`Event`] values describing
//! what happened. Everything advanced by elapsed time implements [`TimedTask`].

use std::{
    fmt,
    ops::{Add, Sub},
    time::Duration,
};

use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// State machine advanced by elapsed wall-clock time.
///
/// Implementors must treat a call to [`TimedTask::add_time`] while
/// [`TimedTask::is_done`] reports `true` as a caller bug and panic.
pub trait TimedTask {
    /// Consumes the provided amount of elapsed time.
    fn add_time(&mut self, elapsed: Duration);

    /// Reports whether the task has nothing left to do.
    fn is_done(&self) -> bool;
}

impl<T: TimedTask + ?Sized> TimedTask for Box<T> {
    fn add_time(&mut self, elapsed: Duration) {
        (**self).add_time(elapsed);
    }

    fn is_done(&self) -> bool {
        (**self).is_done()
    }
}

/// Converts a duration into fractional milliseconds.
#[must_use]
pub fn millis_f64(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1_000.0
}

/// Location of a single grid square expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Square {
    u: u32,
    v: u32,
}

impl Square {
    /// Creates a new square coordinate.
    #[must_use]
    pub const fn new(u: u32, v: u32) -> Self {
        Self { u, v }
    }

    /// Zero-based column index of the square.
    #[must_use]
    pub const fn u(&self) -> u32 {
        self.u
    }

    /// Zero-based row index of the square.
    #[must_use]
    pub const fn v(&self) -> u32 {
        self.v
    }

    /// Chebyshev distance, the number of 8-directional hops between squares.
    #[must_use]
    pub fn chebyshev_distance(self, other: Square) -> u32 {
        self.u.abs_diff(other.u).max(self.v.abs_diff(other.v))
    }

    /// Reports whether `other` is this square or one of its eight neighbours.
    #[must_use]
    pub fn is_next_to(self, other: Square) -> bool {
        self.chebyshev_distance(other) <= 1
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.u, self.v)
    }
}

/// Axis-aligned rectangle expressed in whole squares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SquareRect {
    origin: Square,
    width: u32,
    height: u32,
}

impl SquareRect {
    /// Constructs a rectangle from its upper-left square and size.
    #[must_use]
    pub const fn new(origin: Square, width: u32, height: u32) -> Self {
        Self {
            origin,
            width,
            height,
        }
    }

    /// Smallest rectangle containing both corners, in any order.
    #[must_use]
    pub fn spanning(a: Square, b: Square) -> Self {
        let origin = Square::new(a.u().min(b.u()), a.v().min(b.v()));
        Self {
            origin,
            width: a.u().abs_diff(b.u()) + 1,
            height: a.v().abs_diff(b.v()) + 1,
        }
    }

    /// Upper-left square that anchors the rectangle.
    #[must_use]
    pub const fn origin(&self) -> Square {
        self.origin
    }

    /// Width of the rectangle in squares.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in squares.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Iterates the covered squares in row-major order.
    pub fn squares(&self) -> impl Iterator<Item = Square> {
        let origin = self.origin;
        let width = self.width;
        (0..self.height).flat_map(move |dv| {
            (0..width).map(move |du| {
                Square::new(
                    origin.u().saturating_add(du),
                    origin.v().saturating_add(dv),
                )
            })
        })
    }
}

/// Continuous world-space position measured in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPoint {
    /// Horizontal coordinate, growing to the right.
    pub x: f64,
    /// Vertical coordinate, growing downwards.
    pub y: f64,
}

impl WorldPoint {
    /// Creates a point from its coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for WorldPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

impl Sub for WorldPoint {
    type Output = Vector2D;

    fn sub(self, rhs: WorldPoint) -> Vector2D {
        Vector2D::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add<Vector2D> for WorldPoint {
    type Output = WorldPoint;

    fn add(self, rhs: Vector2D) -> WorldPoint {
        WorldPoint::new(self.x + rhs.x(), self.y + rhs.y())
    }
}

/// Displacement between two world points.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2D(DVec2);

impl Vector2D {
    /// Creates a vector from its components.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self(DVec2::new(x, y))
    }

    /// Horizontal component.
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.0.x
    }

    /// Vertical component.
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.0.y
    }

    /// Euclidean length (magnitude).
    #[must_use]
    pub fn length(&self) -> f64 {
        self.0.length()
    }

    /// Vector of length one pointing the same way; the zero vector stays zero.
    #[must_use]
    pub fn unit(&self) -> Self {
        Self(self.0.normalize_or_zero())
    }

    /// Vector multiplied by the provided factor.
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        Self(self.0 * factor)
    }
}

/// Axis-aligned rectangle expressed in world pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldRect {
    origin: WorldPoint,
    width: f64,
    height: f64,
}

impl WorldRect {
    /// Creates a rectangle anchored at its top-left corner.
    #[must_use]
    pub const fn new(origin: WorldPoint, width: f64, height: f64) -> Self {
        Self {
            origin,
            width,
            height,
        }
    }

    /// Top-left corner of the rectangle.
    #[must_use]
    pub const fn origin(&self) -> WorldPoint {
        self.origin
    }

    /// Horizontal extent in pixels.
    #[must_use]
    pub const fn width(&self) -> f64 {
        self.width
    }

    /// Vertical extent in pixels.
    #[must_use]
    pub const fn height(&self) -> f64 {
        self.height
    }
}

/// Unique identifier assigned to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

/// Handle the scheduler hands out for every registered timed task.
///
/// Handles are allocated in increasing order, so comparing two handles
/// compares their registration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    /// Creates a task handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Unique identifier assigned to a running animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnimationId(u32);

impl AnimationId {
    /// Creates a new animation identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Direction in which an orientation is advanced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnDirection {
    /// Decreasing angles.
    Clockwise,
    /// Increasing angles.
    CounterClockwise,
}

impl TurnDirection {
    /// Sign applied to the angular speed when turning this way.
    #[must_use]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Clockwise => -1.0,
            Self::CounterClockwise => 1.0,
        }
    }
}

/// Deferred action queued on an entity and consumed by its movement driver.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Move {
    /// Turn to face the provided world point.
    LookAt(WorldPoint),
    /// Translate to the provided world point, claiming the square containing it.
    JumpTo(WorldPoint),
}

/// Occupancy notifications delivered to the obstacle grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GridEvent {
    /// The entity appeared on the square.
    SpawnedAt(Square),
    /// The entity left `from` and now occupies `to`.
    MovedTo {
        /// Square the entity occupied before the move.
        from: Square,
        /// Square the entity occupies after the move.
        to: Square,
    },
    /// The entity was removed from the square.
    RemovedFrom(Square),
}

/// Static terrain supplied once at construction time.
///
/// Squares are stored in row-major order; `true` marks a terrain obstacle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTerrain")]
pub struct TerrainMap {
    columns: u32,
    rows: u32,
    obstacles: Vec<bool>,
}

#[derive(Deserialize)]
struct RawTerrain {
    columns: u32,
    rows: u32,
    obstacles: Vec<bool>,
}

impl TryFrom<RawTerrain> for TerrainMap {
    type Error = TerrainError;

    fn try_from(raw: RawTerrain) -> Result<Self, Self::Error> {
        let expected = u64::from(raw.columns) * u64::from(raw.rows);
        let found = raw.obstacles.len();
        if u64::try_from(found).map_or(true, |found| found != expected) {
            return Err(TerrainError::SizeMismatch { expected, found });
        }
        Ok(Self {
            columns: raw.columns,
            rows: raw.rows,
            obstacles: raw.obstacles,
        })
    }
}

impl TerrainMap {
    /// Creates a fully walkable terrain of the provided dimensions.
    #[must_use]
    pub fn walkable(columns: u32, rows: u32) -> Self {
        let count = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        Self {
            columns,
            rows,
            obstacles: vec![false; count],
        }
    }

    /// Parses a textual map where `#` marks an obstacle and `.` a walkable square.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, TerrainError> {
        let mut obstacles = Vec::new();
        let mut columns: Option<usize> = None;

        for (row_index, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let width = row.chars().count();
            match columns {
                None => columns = Some(width),
                Some(expected) if expected != width => {
                    return Err(TerrainError::RaggedRow {
                        row: row_index,
                        expected,
                        found: width,
                    });
                }
                Some(_) => {}
            }

            for (column_index, symbol) in row.chars().enumerate() {
                match symbol {
                    '#' => obstacles.push(true),
                    '.' => obstacles.push(false),
                    other => {
                        return Err(TerrainError::UnknownSymbol {
                            symbol: other,
                            row: row_index,
                            column: column_index,
                        });
                    }
                }
            }
        }

        let columns = columns.unwrap_or(0);
        Ok(Self {
            columns: u32::try_from(columns).map_err(|_| TerrainError::TooLarge)?,
            rows: u32::try_from(rows.len()).map_err(|_| TerrainError::TooLarge)?,
            obstacles,
        })
    }

    /// Returns the terrain with the provided square marked as an obstacle.
    #[must_use]
    pub fn with_obstacle(mut self, square: Square) -> Self {
        if let Some(flag) = self.index(square).and_then(|index| self.obstacles.get_mut(index)) {
            *flag = true;
        }
        self
    }

    /// Number of columns contained in the terrain.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the terrain.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether the square is a terrain obstacle; squares outside the
    /// map are obstacles.
    #[must_use]
    pub fn is_obstacle(&self, square: Square) -> bool {
        self.index(square)
            .and_then(|index| self.obstacles.get(index).copied())
            .unwrap_or(true)
    }

    fn index(&self, square: Square) -> Option<usize> {
        if square.u() < self.columns && square.v() < self.rows {
            let row = usize::try_from(square.v()).ok()?;
            let column = usize::try_from(square.u()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Reasons a textual terrain map may be rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TerrainError {
    /// A row's width differs from the first row.
    #[error("row {row} has {found} squares, expected {expected}")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// A character other than `#` or `.` was found.
    #[error("unknown terrain symbol {symbol:?} at row {row}, column {column}")]
    UnknownSymbol {
        /// The unexpected character.
        symbol: char,
        /// Zero-based row of the character.
        row: usize,
        /// Zero-based column of the character.
        column: usize,
    },
    /// The map does not fit 32-bit coordinates.
    #[error("terrain dimensions exceed the coordinate range")]
    TooLarge,
    /// The obstacle flags do not cover the declared dimensions.
    #[error("terrain declares {expected} squares but lists {found}")]
    SizeMismatch {
        /// Squares implied by the declared columns and rows.
        expected: u64,
        /// Obstacle flags actually present.
        found: usize,
    },
}

/// One frame of an animation definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSpec {
    /// Identifier the render collaborator uses to draw the frame.
    pub frame: String,
    /// Time the frame stays on screen, in milliseconds.
    pub duration_ms: u64,
}

impl FrameSpec {
    /// Creates a frame specification.
    #[must_use]
    pub fn new(frame: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            frame: frame.into(),
            duration_ms,
        }
    }
}

/// Ordered frames plus loop flag, as handed over by the asset provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationDefinition {
    /// Human readable name of the animation.
    pub name: String,
    /// Frames played in order.
    pub frames: Vec<FrameSpec>,
    /// Whether the animation rewinds after its last frame.
    #[serde(default)]
    pub looped: bool,
}

/// Movement characteristics of an entity type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityProfile {
    /// Entity type name used in logs.
    pub name: String,
    /// Linear speed in pixels per millisecond.
    pub speed: f64,
    /// Angular speed in degrees per millisecond.
    pub angular_speed: f64,
    /// Orientation at spawn time, in degrees.
    pub orig_angle: f64,
    /// Animation attached to the entity while it exists.
    pub animation: Option<AnimationDefinition>,
}

impl Default for EntityProfile {
    fn default() -> Self {
        Self {
            name: String::from("entity"),
            speed: 0.05,
            angular_speed: 0.36,
            orig_angle: 0.0,
            animation: None,
        }
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Creates an entity at the provided world point.
    SpawnEntity {
        /// Movement characteristics of the new entity.
        profile: EntityProfile,
        /// World point where the entity appears.
        at: WorldPoint,
    },
    /// Removes an entity and every task it owns.
    DespawnEntity {
        /// Entity to remove.
        entity: EntityId,
    },
    /// Plans a path to the destination square and starts following it.
    Navigate {
        /// Entity to move.
        entity: EntityId,
        /// Square the entity should reach.
        destination: Square,
    },
    /// Turns then translates the entity to a point in its square or a neighbour.
    MoveTo {
        /// Entity to move.
        entity: EntityId,
        /// World point to reach.
        point: WorldPoint,
    },
    /// Turns the entity to face a point.
    LookAt {
        /// Entity to turn.
        entity: EntityId,
        /// World point to face.
        point: WorldPoint,
    },
    /// Drops every queued move and the navigation path of an entity.
    Stop {
        /// Entity to stop.
        entity: EntityId,
    },
    /// Marks a square as a terrain obstacle.
    SetObstacle {
        /// Square to block.
        square: Square,
    },
    /// Clears the terrain obstacle flag of a square.
    SetWalkable {
        /// Square to clear.
        square: Square,
    },
    /// Starts a free-standing animation.
    StartAnimation {
        /// Frames and loop flag of the animation.
        definition: AnimationDefinition,
    },
    /// Stops delivering time to an animation.
    PauseAnimation {
        /// Animation to pause.
        animation: AnimationId,
    },
    /// Resumes delivering time to an animation.
    ResumeAnimation {
        /// Animation to resume.
        animation: AnimationId,
    },
    /// Resets an animation to its first frame.
    RewindAnimation {
        /// Animation to rewind.
        animation: AnimationId,
    },
    /// Removes an animation from the simulation.
    StopAnimation {
        /// Animation to remove.
        animation: AnimationId,
    },
    /// Runs every entity driver then advances the simulation clock.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that running tasks received elapsed time.
    TimeAdvanced {
        /// Duration distributed to every running task.
        dt: Duration,
    },
    /// Confirms that an entity was created.
    EntitySpawned {
        /// Identifier assigned to the entity.
        entity: EntityId,
        /// Square the entity occupies.
        square: Square,
    },
    /// Reports that a spawn request was refused.
    SpawnRejected {
        /// Requested spawn point.
        at: WorldPoint,
        /// Why the request was refused.
        reason: SpawnError,
    },
    /// Confirms that an entity was removed.
    EntityDespawned {
        /// Identifier of the removed entity.
        entity: EntityId,
        /// Square the entity released.
        square: Square,
    },
    /// Confirms that an entity claimed a new square and started moving to it.
    EntityMoved {
        /// Identifier of the moving entity.
        entity: EntityId,
        /// Square released by the entity.
        from: Square,
        /// Square claimed by the entity.
        to: Square,
    },
    /// Confirms that a path was found and the entity started following it.
    NavigationStarted {
        /// Identifier of the navigating entity.
        entity: EntityId,
        /// Hops to traverse, excluding the entity's own square.
        hops: Vec<Square>,
    },
    /// Reports that no path could be found; the entity stays in place.
    PathNotFound {
        /// Identifier of the entity.
        entity: EntityId,
        /// Requested destination.
        destination: Square,
        /// Why the search produced nothing.
        reason: NoPath,
    },
    /// Reports that a blocked hop forced a new path.
    Replanned {
        /// Identifier of the entity.
        entity: EntityId,
        /// Hop that turned out to be blocked.
        blocked: Square,
        /// Replacement hops.
        hops: Vec<Square>,
    },
    /// Reports that navigation ended before the destination.
    StoppedShort {
        /// Identifier of the entity.
        entity: EntityId,
        /// Square the entity stopped on.
        square: Square,
        /// Destination that was not reached.
        destination: Square,
    },
    /// Confirms that an entity reached the end of its path.
    DestinationReached {
        /// Identifier of the entity.
        entity: EntityId,
        /// Square the entity arrived on.
        square: Square,
    },
    /// Reports that a direct move request was refused.
    MoveRejected {
        /// Identifier of the entity.
        entity: EntityId,
        /// Requested point.
        point: WorldPoint,
        /// Why the request was refused.
        reason: MoveError,
    },
    /// Confirms that an animation was created.
    AnimationStarted {
        /// Identifier assigned to the animation.
        animation: AnimationId,
    },
    /// Reports that an animation definition could not be played.
    AnimationRejected {
        /// Name carried by the rejected definition.
        name: String,
    },
    /// Reports that a non-looping animation played its last frame.
    AnimationFinished {
        /// Identifier of the animation.
        animation: AnimationId,
    },
    /// Reports that a command referenced an entity that does not exist.
    UnknownEntity {
        /// The missing identifier.
        entity: EntityId,
    },
    /// Reports that a command referenced an animation that does not exist.
    UnknownAnimation {
        /// The missing identifier.
        animation: AnimationId,
    },
}

/// Reasons a path search may produce no hops.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum NoPath {
    /// Origin or destination lies outside the grid.
    #[error("square outside of the grid")]
    OutOfBounds,
    /// Origin and destination are the same square.
    #[error("already on the destination square")]
    AlreadyThere,
    /// Every route is blocked.
    #[error("destination unreachable")]
    Unreachable,
    /// The search ran out of its expansion or time budget.
    #[error("search budget exhausted")]
    BudgetExhausted,
}

/// Reasons a spawn request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum SpawnError {
    /// The spawn point lies outside the grid.
    #[error("spawn point outside of the grid")]
    OutOfBounds,
    /// The square is a terrain obstacle or already occupied.
    #[error("spawn square is an obstacle")]
    Obstacle,
    /// Speeds must be finite and strictly positive, the initial angle finite.
    #[error("entity profile speeds must be positive and its angle finite")]
    InvalidProfile,
    /// The attached animation definition is unusable.
    #[error("entity animation definition is invalid")]
    InvalidAnimation,
    /// Every entity or animation id has been handed out.
    #[error("no identifiers left for a new entity")]
    IdsExhausted,
}

/// Reasons a direct move request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum MoveError {
    /// The point lies outside the grid.
    #[error("target outside of the grid")]
    OutOfBounds,
    /// The point lies further than one square away.
    #[error("target is not adjacent to the entity")]
    NotAdjacent,
    /// The target square is an obstacle.
    #[error("target square is an obstacle")]
    Obstacle,
}

/// Immutable representation of a single entity's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EntitySnapshot {
    /// Unique identifier assigned to the entity.
    pub id: EntityId,
    /// Entity type name.
    pub name: String,
    /// Square currently claimed by the entity.
    pub square: Square,
    /// Continuous position in world pixels.
    pub position: WorldPoint,
    /// Orientation in degrees within `[0, 360)`.
    pub orientation: f64,
    /// Whether the entity has no motion and no queued moves.
    pub is_idle: bool,
    /// Hop currently being travelled to, if navigating.
    pub current_hop: Option<Square>,
    /// Hops queued after the current one.
    pub remaining_hops: Vec<Square>,
}

/// Read-only snapshot describing all entities.
#[derive(Clone, Debug, Default)]
pub struct EntityView {
    snapshots: Vec<EntitySnapshot>,
}

impl EntityView {
    /// Creates a new entity view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EntitySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EntitySnapshot> {
        self.snapshots
    }
}
