// Immediate-collision detection for the four candidate moves
//
// The block array constrains move choice but is never part of the learned state.

use crate::board::{CellState, Grid, Position, Snapshot};
use crate::types::Direction;

/// Tails of agents at or below this length never vacate
pub const MIN_LENGTH_FOR_VACATING_TAIL: usize = 3;

/// Health an agent has on the turn it ate; its tail stays put next turn
pub const FULL_HEALTH: i32 = 100;

/// Per-direction flags, indexed by `Direction::index`; true means the move is fatal now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockArray([bool; 4]);

impl BlockArray {
    pub const fn new(flags: [bool; 4]) -> Self {
        BlockArray(flags)
    }

    pub const fn all() -> Self {
        BlockArray([true; 4])
    }

    pub fn is_blocked(&self, dir: Direction) -> bool {
        self.0[dir.index()]
    }

    pub fn all_blocked(&self) -> bool {
        self.0.iter().all(|&b| b)
    }

    /// Unblocked directions in canonical order
    pub fn open_directions(&self) -> Vec<Direction> {
        Direction::all()
            .into_iter()
            .filter(|&d| !self.is_blocked(d))
            .collect()
    }

    /// Computes the block array around self's head
    pub fn detect(grid: &Grid, snapshot: &Snapshot) -> Self {
        let head = match snapshot.you.head() {
            Some(h) => h,
            None => return BlockArray::all(),
        };

        let mut flags = [false; 4];
        for dir in Direction::all() {
            let next = head.step(dir);
            flags[dir.index()] = match grid.get(next) {
                None => true,
                Some(CellState::Occupied) => !is_vacating_tail(snapshot, next),
                Some(_) => false,
            };
        }
        BlockArray(flags)
    }
}

/// True when `pos` is the tail of an agent that will move off it before anyone can collide.
/// Short agents and agents that just ate (full health) keep their tails in place.
pub fn is_vacating_tail(snapshot: &Snapshot, pos: Position) -> bool {
    snapshot
        .agents
        .iter()
        .chain(std::iter::once(&snapshot.you))
        .any(|agent| {
            agent.length > MIN_LENGTH_FOR_VACATING_TAIL
                && agent.health < FULL_HEALTH
                && agent.tail() == Some(pos)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::test_support::{agent, snapshot};

    fn detect(snap: &Snapshot) -> BlockArray {
        BlockArray::detect(&Grid::from_snapshot(snap), snap)
    }

    #[test]
    fn test_corner_blocks_off_board_directions() {
        let you = agent("me", &[(0, 0)], 50);
        let blocks = detect(&snapshot(5, 5, you, vec![], &[]));
        assert!(blocks.is_blocked(Direction::Up));
        assert!(blocks.is_blocked(Direction::Left));
        assert!(!blocks.is_blocked(Direction::Down));
        assert!(!blocks.is_blocked(Direction::Right));
    }

    #[test]
    fn test_long_hungry_tail_is_passable() {
        // Head at (2,2); body curls so the tail sits directly to the left.
        let you = agent("me", &[(2, 2), (1, 2), (1, 1), (2, 1)], 80);
        let blocks = detect(&snapshot(5, 5, you, vec![], &[]));
        assert!(!blocks.is_blocked(Direction::Left));
        assert!(blocks.is_blocked(Direction::Up));
    }

    #[test]
    fn test_tail_after_eating_is_blocked() {
        let you = agent("me", &[(2, 2), (1, 2), (1, 1), (2, 1)], 100);
        let blocks = detect(&snapshot(5, 5, you, vec![], &[]));
        assert!(blocks.is_blocked(Direction::Left));
    }

    #[test]
    fn test_short_agent_tail_is_blocked() {
        let you = agent("me", &[(2, 2), (1, 2), (1, 1)], 50);
        let other = agent("them", &[(3, 1), (3, 2), (2, 3)], 50);
        let blocks = detect(&snapshot(5, 5, you, vec![other], &[]));
        assert!(blocks.is_blocked(Direction::Right));
        assert!(blocks.is_blocked(Direction::Down));
    }

    #[test]
    fn test_surrounded_head_is_fully_blocked() {
        let you = agent("me", &[(2, 2), (2, 1)], 50);
        let other = agent("them", &[(1, 2), (1, 3), (2, 3), (3, 3), (3, 2), (4, 2)], 50);
        let blocks = detect(&snapshot(5, 5, you, vec![other], &[]));
        assert!(blocks.all_blocked());
        assert!(blocks.open_directions().is_empty());
    }

    #[test]
    fn test_off_board_is_always_blocked() {
        for (r, c) in [(0, 0), (0, 3), (3, 0), (3, 3), (1, 1)] {
            let you = agent("me", &[(r, c)], 50);
            let snap = snapshot(4, 4, you, vec![], &[]);
            let grid = Grid::from_snapshot(&snap);
            let blocks = BlockArray::detect(&grid, &snap);
            for dir in Direction::all() {
                if !grid.in_bounds(Position::new(r, c).step(dir)) {
                    assert!(blocks.is_blocked(dir), "{:?} from ({}, {})", dir, r, c);
                }
            }
        }
    }
}
