//! Budgeted 8-directional path search over the arena.

use std::{
    cell::Cell,
    time::{Duration, Instant},
};

use log::{debug, info};
use pathfinding::prelude::astar;
use serde::{Deserialize, Serialize};
use weapon_factory_core::{NoPath, Square};

use crate::Arena;

const STRAIGHT_COST: u32 = 10;
const DIAGONAL_COST: u32 = 14;

/// Limits applied to a single path search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchBudget {
    /// Maximum number of squares expanded before giving up.
    pub max_expansions: usize,
    /// Wall-clock time allowed per search, in milliseconds.
    pub time_limit_ms: u64,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            max_expansions: 100_000,
            time_limit_ms: 500,
        }
    }
}

/// Path finder answering square-to-square routes on the live arena.
///
/// Movement is allowed in all eight directions, including diagonally past
/// blocked corners. The compass holds no grid of its own.
#[derive(Clone, Copy, Debug, Default)]
pub struct Compass {
    budget: SearchBudget,
}

impl Compass {
    /// Creates a compass enforcing the provided budget.
    #[must_use]
    pub const fn new(budget: SearchBudget) -> Self {
        Self { budget }
    }

    /// Budget applied to every search.
    #[must_use]
    pub const fn budget(&self) -> SearchBudget {
        self.budget
    }

    /// Finds the cheapest hop sequence leading from `from` to `to`.
    ///
    /// The returned hops exclude `from` and end with `to`; consecutive hops are
    /// always neighbours. The origin square itself may be occupied, usually by
    /// the entity asking for the route.
    pub fn find_path(&self, arena: &Arena, from: Square, to: Square) -> Result<Vec<Square>, NoPath> {
        if !arena.contains(from) || !arena.contains(to) {
            return Err(NoPath::OutOfBounds);
        }
        if from == to {
            return Err(NoPath::AlreadyThere);
        }
        if arena.is_obstacle(to) {
            info!("no path from {from} to {to}: destination is an obstacle");
            return Err(NoPath::Unreachable);
        }

        let started = Instant::now();
        let time_limit = Duration::from_millis(self.budget.time_limit_ms);
        let expansions = Cell::new(0_usize);
        let exhausted = Cell::new(false);

        let result = astar(
            &from,
            |square| {
                let count = expansions.get() + 1;
                expansions.set(count);
                if count > self.budget.max_expansions || started.elapsed() > time_limit {
                    exhausted.set(true);
                    return Vec::new();
                }
                walkable_neighbours(arena, *square)
            },
            |square| octile_distance(*square, to),
            |square| *square == to,
        );

        let Some((mut path, cost)) = result else {
            let reason = if exhausted.get() {
                NoPath::BudgetExhausted
            } else {
                NoPath::Unreachable
            };
            info!(
                "no path from {from} to {to} after {} expansions: {reason}",
                expansions.get()
            );
            return Err(reason);
        };

        assert_eq!(path.first(), Some(&from), "search must start at the origin");
        let _ = path.remove(0);
        assert!(
            path.windows(2).all(|pair| pair[0].is_next_to(pair[1])),
            "search produced non-adjacent hops"
        );
        if path.is_empty() {
            return Err(NoPath::Unreachable);
        }

        debug!(
            "path from {from} to {to}: {} hops, cost {cost}, {} expansions",
            path.len(),
            expansions.get()
        );
        Ok(path)
    }
}

fn walkable_neighbours(arena: &Arena, square: Square) -> Vec<(Square, u32)> {
    let mut neighbours = Vec::with_capacity(8);
    for dv in -1_i64..=1 {
        for du in -1_i64..=1 {
            if du == 0 && dv == 0 {
                continue;
            }
            let u = i64::from(square.u()) + du;
            let v = i64::from(square.v()) + dv;
            let (Ok(u), Ok(v)) = (u32::try_from(u), u32::try_from(v)) else {
                continue;
            };
            let neighbour = Square::new(u, v);
            if arena.is_obstacle(neighbour) {
                continue;
            }
            let cost = if du != 0 && dv != 0 {
                DIAGONAL_COST
            } else {
                STRAIGHT_COST
            };
            neighbours.push((neighbour, cost));
        }
    }
    neighbours
}

fn octile_distance(a: Square, b: Square) -> u32 {
    let du = a.u().abs_diff(b.u());
    let dv = a.v().abs_diff(b.v());
    let (long, short) = if du > dv { (du, dv) } else { (dv, du) };
    STRAIGHT_COST * long + (DIAGONAL_COST - STRAIGHT_COST) * short
}
