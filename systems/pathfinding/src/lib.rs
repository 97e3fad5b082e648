#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! A* route search over the 4-connected node grid.
//!
//! The frontier is ordered by `f = g + h` with the Manhattan distance as the
//! heuristic and an insertion counter as the secondary key, so equal-cost
//! candidates always pop in the order they were pushed. Identical grids and
//! endpoints therefore always produce identical routes.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use grid_siege_core::{Command, Event, NodeCoord, Path};
use grid_siege_world::Grid;

/// Result of a single search step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchStep {
    /// A node was popped from the frontier and finalized.
    Expanded(NodeCoord),
    /// The end node was popped; the route runs from start to end inclusive.
    Found(Path),
    /// The frontier is empty and the end node was never reached.
    Exhausted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FrontierEntry {
    f_score: u32,
    order: u64,
    coord: NodeCoord,
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reversed so the lowest f, then the oldest entry, pops first.
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Incremental A* search that can be stepped, observed or abandoned.
///
/// The grid is borrowed immutably for the lifetime of the search, so it
/// cannot change until the search completes or is dropped.
#[derive(Debug)]
pub struct PathSearch<'grid> {
    grid: &'grid Grid,
    start: NodeCoord,
    end: NodeCoord,
    frontier: BinaryHeap<FrontierEntry>,
    g_score: Vec<u32>,
    came_from: Vec<Option<NodeCoord>>,
    finalized: Vec<bool>,
    visited: Vec<NodeCoord>,
    pushed: u64,
    finished: bool,
}

impl<'grid> PathSearch<'grid> {
    /// Prepares a search from `start` to `end`.
    ///
    /// # Panics
    ///
    /// Panics if either endpoint lies outside the grid or if the neighbor
    /// lists have not been refreshed since the last grid mutation.
    #[must_use]
    pub fn new(grid: &'grid Grid, start: NodeCoord, end: NodeCoord) -> Self {
        assert!(
            !grid.neighbors_stale(),
            "neighbor lists must be refreshed before searching"
        );
        let start_index = grid.index(start);
        let _ = grid.index(end);

        let mut g_score = vec![u32::MAX; grid.len()];
        g_score[start_index] = 0;

        let mut frontier = BinaryHeap::new();
        frontier.push(FrontierEntry {
            f_score: start.manhattan_distance(end),
            order: 0,
            coord: start,
        });

        Self {
            grid,
            start,
            end,
            frontier,
            g_score,
            came_from: vec![None; grid.len()],
            finalized: vec![false; grid.len()],
            visited: Vec::new(),
            pushed: 1,
            finished: false,
        }
    }

    /// Pops the next frontier node and relaxes its neighbors.
    ///
    /// Once the search has found a route or exhausted the frontier every
    /// further call returns [`SearchStep::Exhausted`].
    ///
    /// # Panics
    ///
    /// Panics if the came-from links of a found route do not lead back to
    /// the start without repeating a node.
    pub fn step(&mut self) -> SearchStep {
        if self.finished {
            return SearchStep::Exhausted;
        }

        while let Some(entry) = self.frontier.pop() {
            let index = self.grid.index(entry.coord);
            if self.finalized[index] {
                continue;
            }
            self.finalized[index] = true;
            self.visited.push(entry.coord);

            if entry.coord == self.end {
                self.finished = true;
                return SearchStep::Found(self.reconstruct());
            }

            let tentative = self.g_score[index] + 1;
            for &neighbor in self.grid.neighbors(entry.coord) {
                let neighbor_index = self.grid.index(neighbor);
                if self.finalized[neighbor_index] || tentative >= self.g_score[neighbor_index] {
                    continue;
                }

                self.came_from[neighbor_index] = Some(entry.coord);
                self.g_score[neighbor_index] = tentative;
                self.frontier.push(FrontierEntry {
                    f_score: tentative + neighbor.manhattan_distance(self.end),
                    order: self.pushed,
                    coord: neighbor,
                });
                self.pushed += 1;
            }

            return SearchStep::Expanded(entry.coord);
        }

        self.finished = true;
        SearchStep::Exhausted
    }

    /// Drives the search to completion, calling `on_step` after every pop.
    ///
    /// The observer cannot influence the search; it only sees the popped node.
    pub fn run<F>(&mut self, mut on_step: F) -> Option<Path>
    where
        F: FnMut(NodeCoord),
    {
        loop {
            match self.step() {
                SearchStep::Expanded(coord) => on_step(coord),
                SearchStep::Found(path) => {
                    on_step(path.last());
                    return Some(path);
                }
                SearchStep::Exhausted => return None,
            }
        }
    }

    /// Node each reached node was first relaxed from, if any.
    #[must_use]
    pub fn came_from(&self, coord: NodeCoord) -> Option<NodeCoord> {
        self.came_from[self.grid.index(coord)]
    }

    /// Nodes finalized so far, in pop order.
    #[must_use]
    pub fn visited(&self) -> &[NodeCoord] {
        &self.visited
    }

    /// Consumes the search, yielding the finalized nodes.
    #[must_use]
    pub fn into_visited(self) -> Vec<NodeCoord> {
        self.visited
    }

    fn reconstruct(&self) -> Path {
        let mut waypoints = vec![self.end];
        let mut current = self.end;
        while current != self.start {
            let previous = self.came_from(current).unwrap_or_else(|| {
                panic!(
                    "came-from chain broken at {current:?} while walking from {:?} back to {:?}",
                    self.end, self.start
                )
            });
            waypoints.push(previous);
            assert!(
                waypoints.len() <= self.grid.len(),
                "came-from chain from {:?} cycles without reaching {:?}",
                self.end,
                self.start
            );
            current = previous;
        }
        waypoints.reverse();
        Path::new(waypoints)
    }
}

/// Computes the shortest 4-connected route between two nodes.
///
/// Returns `None` when no route exists.
#[must_use]
pub fn find_path(grid: &Grid, start: NodeCoord, end: NodeCoord) -> Option<Path> {
    find_path_with(grid, start, end, |_| {})
}

/// Computes a route while reporting every popped node to `on_step`.
pub fn find_path_with<F>(
    grid: &Grid,
    start: NodeCoord,
    end: NodeCoord,
    on_step: F,
) -> Option<Path>
where
    F: FnMut(NodeCoord),
{
    PathSearch::new(grid, start, end).run(on_step)
}

/// Pure system that answers route requests raised when a round begins.
#[derive(Debug, Default)]
pub struct Pathfinding;

impl Pathfinding {
    /// Runs a search for every [`Event::RouteRequested`] in the batch.
    pub fn handle(&mut self, events: &[Event], grid: &Grid, out: &mut Vec<Command>) {
        for event in events {
            let Event::RouteRequested { start, end } = event else {
                continue;
            };

            let mut search = PathSearch::new(grid, *start, *end);
            let route = search.run(|_| {});
            match &route {
                Some(path) => {
                    tracing::info!(waypoints = path.len(), "route found");
                }
                None => {
                    tracing::warn!(?start, ?end, "no route between start and end");
                }
            }
            out.push(Command::AssignRoute {
                route,
                visited: search.into_visited(),
            });
        }
    }
}
