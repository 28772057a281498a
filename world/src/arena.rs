//! Obstacle grid combining static terrain with live entity occupancy.

use log::{debug, trace};
use weapon_factory_core::{
    EntityId, GridEvent, Square, SquareRect, TerrainMap, WorldPoint, WorldRect,
};

/// Grid of squares that knows which ones can be entered.
///
/// A square is an obstacle when its terrain blocks it or when an entity
/// occupies it. Occupancy changes only through [`Arena::notify`], which keeps
/// at most one entity per square. Path searches read the same structure, so
/// there is no second grid to keep in sync.
#[derive(Clone, Debug)]
pub struct Arena {
    columns: u32,
    rows: u32,
    square_width: f64,
    square_height: f64,
    terrain: Vec<bool>,
    occupants: Vec<Option<EntityId>>,
}

impl Arena {
    /// Builds an empty arena over the provided terrain.
    #[must_use]
    pub fn new(terrain: &TerrainMap, square_width: f64, square_height: f64) -> Self {
        let columns = terrain.columns();
        let rows = terrain.rows();
        let count = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        let mut blocked = Vec::with_capacity(count);
        for v in 0..rows {
            for u in 0..columns {
                blocked.push(terrain.is_obstacle(Square::new(u, v)));
            }
        }

        Self {
            columns,
            rows,
            square_width,
            square_height,
            terrain: blocked,
            occupants: vec![None; count],
        }
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Width of one square in pixels.
    #[must_use]
    pub const fn square_width(&self) -> f64 {
        self.square_width
    }

    /// Height of one square in pixels.
    #[must_use]
    pub const fn square_height(&self) -> f64 {
        self.square_height
    }

    /// Reports whether the square lies inside the grid.
    #[must_use]
    pub fn contains(&self, square: Square) -> bool {
        square.u() < self.columns && square.v() < self.rows
    }

    /// Reports whether the square cannot be entered; squares outside the grid
    /// are obstacles.
    #[must_use]
    pub fn is_obstacle(&self, square: Square) -> bool {
        self.index(square).map_or(true, |index| {
            self.terrain[index] || self.occupants[index].is_some()
        })
    }

    /// Reports whether the terrain alone blocks the square.
    #[must_use]
    pub fn is_terrain_obstacle(&self, square: Square) -> bool {
        self.index(square).map_or(true, |index| self.terrain[index])
    }

    /// Entity holding the square, if any.
    #[must_use]
    pub fn occupant(&self, square: Square) -> Option<EntityId> {
        self.index(square).and_then(|index| self.occupants[index])
    }

    /// Entities holding the square; empty outside the grid.
    #[must_use]
    pub fn entities_at(&self, square: Square) -> Vec<EntityId> {
        self.occupant(square).into_iter().collect()
    }

    /// Entities holding any square covered by the rectangle, in row-major order.
    ///
    /// The part of the rectangle outside the grid is ignored.
    #[must_use]
    pub fn entities_in_squares(&self, rect: SquareRect) -> Vec<EntityId> {
        let origin = rect.origin();
        let u_end = origin.u().saturating_add(rect.width()).min(self.columns);
        let v_end = origin.v().saturating_add(rect.height()).min(self.rows);

        let mut found = Vec::new();
        for v in origin.v()..v_end {
            for u in origin.u()..u_end {
                if let Some(entity) = self.occupant(Square::new(u, v)) {
                    found.push(entity);
                }
            }
        }
        found
    }

    /// Entities holding any square the world rectangle touches.
    #[must_use]
    pub fn entities_in(&self, rect: WorldRect) -> Vec<EntityId> {
        let origin = rect.origin();
        let Some((u_start, u_end)) =
            covered_span(origin.x, rect.width(), self.square_width, self.columns)
        else {
            return Vec::new();
        };
        let Some((v_start, v_end)) =
            covered_span(origin.y, rect.height(), self.square_height, self.rows)
        else {
            return Vec::new();
        };

        self.entities_in_squares(SquareRect::new(
            Square::new(u_start, v_start),
            u_end - u_start + 1,
            v_end - v_start + 1,
        ))
    }

    /// Square containing the world point, or `None` outside the grid.
    #[must_use]
    pub fn square_of(&self, point: WorldPoint) -> Option<Square> {
        let u = grid_coordinate(point.x, self.square_width)?;
        let v = grid_coordinate(point.y, self.square_height)?;
        let square = Square::new(u, v);
        self.contains(square).then_some(square)
    }

    /// World point at the centre of the square.
    #[must_use]
    pub fn square_center(&self, square: Square) -> WorldPoint {
        WorldPoint::new(
            (f64::from(square.u()) + 0.5) * self.square_width,
            (f64::from(square.v()) + 0.5) * self.square_height,
        )
    }

    /// Applies an occupancy notification.
    ///
    /// # Panics
    ///
    /// Panics when the notification would stack two entities on one square,
    /// when a square outside the grid is claimed, or when the entity does not
    /// hold the square it claims to leave.
    pub fn notify(&mut self, entity: EntityId, event: GridEvent) {
        match event {
            GridEvent::SpawnedAt(square) => {
                self.claim(entity, square);
                debug!("{entity} spawned at {square}");
            }
            GridEvent::MovedTo { from, to } => {
                self.release(entity, from);
                self.claim(entity, to);
                debug!("{entity} moved from {from} to {to}");
            }
            GridEvent::RemovedFrom(square) => {
                self.release(entity, square);
                debug!("{entity} removed from {square}");
            }
        }
        trace!("obstacle map:\n{}", self.obstacle_map());
    }

    /// Marks the square as a terrain obstacle.
    ///
    /// Returns `false` when the square lies outside the grid.
    pub fn set_obstacle(&mut self, square: Square) -> bool {
        self.set_terrain(square, true)
    }

    /// Clears the terrain obstacle flag; occupancy is unaffected.
    ///
    /// Returns `false` when the square lies outside the grid.
    pub fn set_walkable(&mut self, square: Square) -> bool {
        self.set_terrain(square, false)
    }

    /// Occupied squares with their occupants in row-major order.
    pub fn occupied_squares(&self) -> impl Iterator<Item = (Square, EntityId)> + '_ {
        let columns = self.columns;
        self.occupants
            .iter()
            .enumerate()
            .filter_map(move |(index, occupant)| {
                let entity = (*occupant)?;
                let index = u32::try_from(index).ok()?;
                Some((Square::new(index % columns, index / columns), entity))
            })
    }

    /// Text rendering of the grid: `#` terrain, `@` occupied, `.` walkable.
    #[must_use]
    pub fn obstacle_map(&self) -> String {
        let mut map = String::new();
        for v in 0..self.rows {
            for u in 0..self.columns {
                let square = Square::new(u, v);
                let symbol = if self.is_terrain_obstacle(square) {
                    '#'
                } else if self.occupant(square).is_some() {
                    '@'
                } else {
                    '.'
                };
                map.push(symbol);
            }
            map.push('\n');
        }
        map
    }

    fn claim(&mut self, entity: EntityId, square: Square) {
        let Some(index) = self.index(square) else {
            panic!("{entity} claimed {square} outside of the grid");
        };
        if let Some(holder) = self.occupants[index] {
            panic!("{entity} cannot stack onto {square} held by {holder}");
        }
        self.occupants[index] = Some(entity);
    }

    fn release(&mut self, entity: EntityId, square: Square) {
        let index = self.index(square);
        let holder = index.and_then(|index| self.occupants[index]);
        assert_eq!(
            holder,
            Some(entity),
            "{entity} does not hold {square}"
        );
        if let Some(index) = index {
            self.occupants[index] = None;
        }
    }

    fn set_terrain(&mut self, square: Square, blocked: bool) -> bool {
        match self.index(square) {
            Some(index) => {
                self.terrain[index] = blocked;
                debug!(
                    "terrain at {square} is now {}",
                    if blocked { "an obstacle" } else { "walkable" }
                );
                true
            }
            None => false,
        }
    }

    fn index(&self, square: Square) -> Option<usize> {
        if self.contains(square) {
            let row = usize::try_from(square.v()).ok()?;
            let column = usize::try_from(square.u()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

fn grid_coordinate(position: f64, extent: f64) -> Option<u32> {
    if !position.is_finite() || position < 0.0 {
        return None;
    }
    let cell = (position / extent).floor();
    if cell > f64::from(u32::MAX) {
        return None;
    }
    Some(cell as u32)
}

/// Inclusive range of squares touched by `[start, start + length)`, clamped to the grid.
fn covered_span(start: f64, length: f64, extent: f64, count: u32) -> Option<(u32, u32)> {
    if count == 0 || !start.is_finite() || !length.is_finite() || length <= 0.0 {
        return None;
    }
    let first = (start / extent).floor();
    let last = ((start + length) / extent).ceil() - 1.0;
    let last_square = f64::from(count - 1);
    if last < 0.0 || first > last_square {
        return None;
    }
    let first = first.max(0.0) as u32;
    let last = last.min(last_square).max(f64::from(first)) as u32;
    Some((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> Arena {
        Arena::new(&TerrainMap::walkable(4, 3), 10.0, 10.0)
    }

    #[test]
    fn covered_span_clamps_to_the_grid() {
        assert_eq!(covered_span(-5.0, 12.0, 10.0, 4), Some((0, 0)));
        assert_eq!(covered_span(5.0, 20.0, 10.0, 4), Some((0, 2)));
        assert_eq!(covered_span(35.0, 100.0, 10.0, 4), Some((3, 3)));
        assert_eq!(covered_span(40.0, 5.0, 10.0, 4), None);
        assert_eq!(covered_span(-20.0, 5.0, 10.0, 4), None);
    }

    #[test]
    fn square_lookup_rejects_points_outside_the_grid() {
        let arena = arena();
        assert_eq!(
            arena.square_of(WorldPoint::new(15.0, 25.0)),
            Some(Square::new(1, 2))
        );
        assert_eq!(arena.square_of(WorldPoint::new(-0.1, 5.0)), None);
        assert_eq!(arena.square_of(WorldPoint::new(40.0, 5.0)), None);
        assert_eq!(arena.square_of(WorldPoint::new(f64::NAN, 5.0)), None);
    }

    #[test]
    #[should_panic(expected = "cannot stack")]
    fn stacking_is_a_precondition_violation() {
        let mut arena = arena();
        arena.notify(EntityId::new(1), GridEvent::SpawnedAt(Square::new(1, 1)));
        arena.notify(EntityId::new(2), GridEvent::SpawnedAt(Square::new(1, 1)));
    }

    #[test]
    fn obstacle_map_marks_terrain_and_occupants() {
        let mut arena = arena();
        let _ = arena.set_obstacle(Square::new(0, 0));
        arena.notify(EntityId::new(1), GridEvent::SpawnedAt(Square::new(3, 2)));

        assert_eq!(arena.obstacle_map(), "#...\n....\n...@\n");
    }
}
