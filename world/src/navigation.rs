//! Hop-by-hop navigation state of a single entity.

use std::collections::VecDeque;

use log::{debug, info};
use weapon_factory_core::{NoPath, Square};

use crate::{Arena, Compass};

/// Result of asking a [`NavPath`] for its next hop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HopOutcome {
    /// The path was already done; nothing happened.
    Idle,
    /// The queue ran dry: the previous hop was the destination.
    Arrived,
    /// The next hop is free and became the current hop.
    Next(Square),
    /// The next hop was blocked; a fresh route now leads to the destination.
    Replanned {
        /// Hop that turned out to be blocked.
        blocked: Square,
        /// Replacement hops, the first being the new current hop.
        hops: Vec<Square>,
    },
    /// The destination itself was blocked; navigation ended one hop short.
    StoppedShort {
        /// The blocked destination.
        blocked: Square,
    },
    /// The next hop was blocked and no replacement route exists.
    Stranded {
        /// Destination that can no longer be reached.
        destination: Square,
        /// Why the replacement search failed.
        reason: NoPath,
    },
}

/// Current hop plus the queue of hops left to reach a destination.
///
/// Consecutive hops are neighbours on the grid.
#[derive(Clone, Debug, Default)]
pub struct NavPath {
    hop: Option<Square>,
    hops: VecDeque<Square>,
    destination: Option<Square>,
}

impl NavPath {
    /// Creates an empty, finished path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the path; the first hop becomes the current hop.
    ///
    /// # Panics
    ///
    /// Panics when `hops` is empty.
    pub fn set(&mut self, hops: Vec<Square>) {
        assert!(!hops.is_empty(), "navigation path needs at least one hop");
        let mut hops = VecDeque::from(hops);
        self.hop = hops.pop_front();
        self.destination = hops.back().copied().or(self.hop);
        self.hops = hops;
        debug!(
            "navigation path towards {:?}: current {:?}, {} queued",
            self.destination,
            self.hop,
            self.hops.len()
        );
    }

    /// Drops every hop.
    pub fn clear(&mut self) {
        self.hop = None;
        self.hops.clear();
        self.destination = None;
    }

    /// Reports whether there is no current hop.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.hop.is_none()
    }

    /// Hop currently being travelled to.
    #[must_use]
    pub const fn hop(&self) -> Option<Square> {
        self.hop
    }

    /// Hops queued after the current one, in travel order.
    pub fn queued(&self) -> impl Iterator<Item = Square> + '_ {
        self.hops.iter().copied()
    }

    /// Final square of the path.
    #[must_use]
    pub const fn destination(&self) -> Option<Square> {
        self.destination
    }

    /// Advances to the next queued hop, re-planning from `from` when it is blocked.
    pub fn next_hop(&mut self, from: Square, arena: &Arena, compass: &Compass) -> HopOutcome {
        if self.is_done() {
            return HopOutcome::Idle;
        }

        let Some(hop) = self.hops.pop_front() else {
            debug!("navigation done at {from}");
            self.clear();
            return HopOutcome::Arrived;
        };
        self.hop = Some(hop);
        if !arena.is_obstacle(hop) {
            return HopOutcome::Next(hop);
        }

        if self.hops.is_empty() {
            info!("destination {hop} is blocked; stopping at {from}");
            self.clear();
            return HopOutcome::StoppedShort { blocked: hop };
        }

        info!("hop {hop} is blocked; re-planning from {from}");
        let destination = self.destination.unwrap_or(hop);
        match self.replan(from, arena, compass) {
            Ok(hops) => HopOutcome::Replanned { blocked: hop, hops },
            Err(reason) => HopOutcome::Stranded {
                destination,
                reason,
            },
        }
    }

    /// Replaces the remaining hops with a fresh route from `from` to the destination.
    ///
    /// The path is cleared when no route is found.
    pub fn replan(
        &mut self,
        from: Square,
        arena: &Arena,
        compass: &Compass,
    ) -> Result<Vec<Square>, NoPath> {
        let Some(destination) = self.destination else {
            return Err(NoPath::AlreadyThere);
        };
        match compass.find_path(arena, from, destination) {
            Ok(hops) => {
                self.set(hops.clone());
                Ok(hops)
            }
            Err(reason) => {
                info!("re-planning to {destination} failed: {reason}; stopping at {from}");
                self.clear();
                Err(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weapon_factory_core::{EntityId, GridEvent, TerrainMap};

    fn open_arena() -> Arena {
        Arena::new(&TerrainMap::walkable(5, 5), 10.0, 10.0)
    }

    #[test]
    fn set_takes_the_first_hop_as_current() {
        let mut path = NavPath::new();
        path.set(vec![Square::new(1, 1), Square::new(2, 2), Square::new(3, 3)]);

        assert_eq!(path.hop(), Some(Square::new(1, 1)));
        assert_eq!(
            path.queued().collect::<Vec<_>>(),
            vec![Square::new(2, 2), Square::new(3, 3)]
        );
        assert_eq!(path.destination(), Some(Square::new(3, 3)));
    }

    #[test]
    fn consuming_every_hop_finishes_the_path() {
        let arena = open_arena();
        let compass = Compass::default();
        let mut path = NavPath::new();
        path.set(vec![Square::new(1, 0), Square::new(2, 0)]);

        assert_eq!(
            path.next_hop(Square::new(1, 0), &arena, &compass),
            HopOutcome::Next(Square::new(2, 0))
        );
        assert_eq!(
            path.next_hop(Square::new(2, 0), &arena, &compass),
            HopOutcome::Arrived
        );
        assert!(path.is_done());
        assert_eq!(
            path.next_hop(Square::new(2, 0), &arena, &compass),
            HopOutcome::Idle
        );
    }

    #[test]
    fn blocked_destination_stops_short() {
        let mut arena = open_arena();
        let compass = Compass::default();
        let mut path = NavPath::new();
        path.set(vec![Square::new(1, 0), Square::new(2, 0)]);
        arena.notify(EntityId::new(9), GridEvent::SpawnedAt(Square::new(2, 0)));

        assert_eq!(
            path.next_hop(Square::new(1, 0), &arena, &compass),
            HopOutcome::StoppedShort {
                blocked: Square::new(2, 0)
            }
        );
        assert!(path.is_done());
    }

    #[test]
    fn blocked_intermediate_hop_replans_around_it() {
        let mut arena = open_arena();
        let compass = Compass::default();
        let mut path = NavPath::new();
        path.set(vec![Square::new(1, 0), Square::new(2, 0), Square::new(3, 0)]);
        arena.notify(EntityId::new(9), GridEvent::SpawnedAt(Square::new(2, 0)));

        let outcome = path.next_hop(Square::new(1, 0), &arena, &compass);

        let HopOutcome::Replanned { blocked, hops } = outcome else {
            panic!("expected a re-plan, got {outcome:?}");
        };
        assert_eq!(blocked, Square::new(2, 0));
        assert!(!hops.contains(&Square::new(2, 0)));
        assert_eq!(hops.last(), Some(&Square::new(3, 0)));
        assert_eq!(path.hop(), hops.first().copied());
    }

    #[test]
    fn failed_replan_strands_the_path() {
        let mut arena = Arena::new(
            &TerrainMap::from_rows(&["...", "###"]).expect("valid map"),
            10.0,
            10.0,
        );
        let compass = Compass::default();
        let mut path = NavPath::new();
        path.set(vec![Square::new(1, 0), Square::new(2, 0), Square::new(2, 1)]);
        arena.notify(EntityId::new(9), GridEvent::SpawnedAt(Square::new(2, 0)));

        assert_eq!(
            path.next_hop(Square::new(1, 0), &arena, &compass),
            HopOutcome::Stranded {
                destination: Square::new(2, 1),
                reason: NoPath::Unreachable,
            }
        );
        assert!(path.is_done());
    }
}
