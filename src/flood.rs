// Route counting: flood-fill estimate of open space behind each candidate move
//
// Each visited cell carries a path multiplicity. Reaching an already visited
// cell adds to its multiplicity instead of expanding it again, and cells that
// discover nothing new (leaves) contribute their multiplicity to the total.
// Open regions fan out and accumulate far more routes than a dead-end corridor
// of the same cell count.

use std::collections::VecDeque;

use crate::blocking::BlockArray;
use crate::board::{CellState, Grid, Position};
use crate::types::Direction;

/// Route counts per direction, indexed by `Direction::index`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteCounts([u64; 4]);

impl RouteCounts {
    pub fn new(counts: [u64; 4]) -> Self {
        RouteCounts(counts)
    }

    /// Runs one fill per unblocked direction; blocked directions score 0
    pub fn compute(grid: &Grid, head: Position, blocks: &BlockArray) -> Self {
        let mut counts = [0u64; 4];
        for dir in Direction::all() {
            if !blocks.is_blocked(dir) {
                counts[dir.index()] = count_routes(grid, head.step(dir));
            }
        }
        RouteCounts(counts)
    }

    pub fn get(&self, dir: Direction) -> u64 {
        self.0[dir.index()]
    }

    pub fn total(&self) -> u64 {
        self.0.iter().fold(0u64, |acc, &c| acc.saturating_add(c))
    }

    /// Unblocked direction with the most routes, lowest index on ties
    pub fn most_open(&self, blocks: &BlockArray) -> Option<Direction> {
        let mut best: Option<Direction> = None;
        for dir in blocks.open_directions() {
            match best {
                Some(b) if self.get(b) >= self.get(dir) => {}
                _ => best = Some(dir),
            }
        }
        best
    }
}

fn expandable(grid: &Grid, pos: Position) -> bool {
    matches!(grid.get(pos), Some(CellState::Empty) | Some(CellState::Food))
}

/// Flood fill from `start`, returning the accumulated leaf multiplicity.
/// Returns 0 when `start` is off-board. Work is bounded by the board area.
pub fn count_routes(grid: &Grid, start: Position) -> u64 {
    if !grid.in_bounds(start) {
        return 0;
    }

    // 0 marks unvisited; every visited cell has multiplicity >= 1
    let mut multiplicity = vec![0u64; grid.area()];
    let mut queue = VecDeque::with_capacity(grid.area());

    multiplicity[grid.index_of(start)] = 1;
    queue.push_back(start);

    let mut total = 0u64;
    while let Some(cell) = queue.pop_front() {
        let current = multiplicity[grid.index_of(cell)];
        let mut discovered = 0;

        for (_, next) in grid.neighbors(cell) {
            if !expandable(grid, next) {
                continue;
            }
            let idx = grid.index_of(next);
            if multiplicity[idx] > 0 {
                multiplicity[idx] = multiplicity[idx].saturating_add(current);
            } else {
                multiplicity[idx] = current;
                queue.push_back(next);
                discovered += 1;
            }
        }

        if discovered == 0 {
            total = total.saturating_add(current);
        }
    }

    total
}
