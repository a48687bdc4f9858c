// State discretization for the tabular policy
//
// Layout of a state id, low to high:
//   digits 0..4  openness digit (0-9) for Up, Down, Left, Right
//   10^4 * bits  food flags Up=1, Down=2, Left=4, Right=8, danger flag=16

use serde::{Deserialize, Serialize};

use crate::board::{CellState, Grid, Position};
use crate::flood::RouteCounts;
use crate::types::Direction;

pub type StateId = u32;

const FLAG_BASE: u32 = 10_000;
const DANGER_BIT: u32 = 16;

/// Exclusive upper bound of every id the encoder can produce
pub const STATE_SPACE: u32 = FLAG_BASE * 32;

/// How openness toward each direction is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Share of the turn's total route count behind each move
    #[default]
    Routes,
    /// Open fraction of the 3-wide strip from the neighbor cell to the wall
    Strip,
    /// Open fraction of the whole half-board beyond the head
    HalfBoard,
}

/// Maps a ratio in [0, 1] to one decimal digit. Halves round to even, so an
/// even split (0.5) lands on 4.
pub fn ratio_digit(ratio: f64) -> u32 {
    let digit = (ratio * 10.0 - 0.5).round_ties_even();
    digit.clamp(0.0, 9.0) as u32
}

fn in_half_plane(dir: Direction, head: Position, pos: Position) -> bool {
    match dir {
        Direction::Up => pos.row < head.row,
        Direction::Down => pos.row > head.row,
        Direction::Left => pos.col < head.col,
        Direction::Right => pos.col > head.col,
    }
}

fn is_open(state: CellState) -> bool {
    state != CellState::Occupied
}

/// Whether any food lies in the half-board beyond the head, per direction
pub fn food_flags(grid: &Grid, head: Position) -> [bool; 4] {
    let mut flags = [false; 4];
    for (pos, state) in grid.cells() {
        if state != CellState::Food {
            continue;
        }
        for dir in Direction::all() {
            if in_half_plane(dir, head, pos) {
                flags[dir.index()] = true;
            }
        }
    }
    flags
}

#[derive(Debug, Clone, Copy)]
pub struct StateEncoder {
    resolution: Resolution,
}

impl StateEncoder {
    pub fn new(resolution: Resolution) -> Self {
        StateEncoder { resolution }
    }

    /// Pure function of its inputs; the same board always yields the same id
    pub fn encode(
        &self,
        grid: &Grid,
        head: Position,
        health: i32,
        danger_threshold: f64,
        routes: &RouteCounts,
    ) -> StateId {
        let ratios = self.openness(grid, head, routes);
        let mut id = 0u32;
        let mut place = 1u32;
        for ratio in ratios {
            id += ratio_digit(ratio) * place;
            place *= 10;
        }

        let food = food_flags(grid, head);
        let mut bits = 0u32;
        for dir in Direction::all() {
            if food[dir.index()] {
                bits |= 1 << dir.index();
            }
        }
        if f64::from(health) <= danger_threshold {
            bits |= DANGER_BIT;
        }

        id + bits * FLAG_BASE
    }

    /// Openness ratio per direction in [0, 1]
    pub fn openness(&self, grid: &Grid, head: Position, routes: &RouteCounts) -> [f64; 4] {
        let mut ratios = [0.0; 4];
        match self.resolution {
            Resolution::Routes => {
                let total = routes.total();
                if total > 0 {
                    for dir in Direction::all() {
                        ratios[dir.index()] = routes.get(dir) as f64 / total as f64;
                    }
                }
            }
            Resolution::Strip => {
                for dir in Direction::all() {
                    ratios[dir.index()] = strip_ratio(grid, head, dir);
                }
            }
            Resolution::HalfBoard => {
                for dir in Direction::all() {
                    ratios[dir.index()] = half_board_ratio(grid, head, dir);
                }
            }
        }
        ratios
    }
}

/// Open fraction of the 3-wide strip running from the head's neighbor to the
/// board edge. Off-board strip cells count as blocked.
fn strip_ratio(grid: &Grid, head: Position, dir: Direction) -> f64 {
    let (dr, dc) = dir.delta();
    // Perpendicular unit offset for the strip's width
    let (pr, pc) = (dc, dr);

    let mut cells = 0u32;
    let mut open = 0u32;
    let mut center = head.step(dir);
    while grid.in_bounds(center) {
        for k in -1..=1 {
            let pos = Position::new(center.row + pr * k, center.col + pc * k);
            cells += 1;
            if grid.get(pos).map(is_open).unwrap_or(false) {
                open += 1;
            }
        }
        center = Position::new(center.row + dr, center.col + dc);
    }

    if cells == 0 {
        0.0
    } else {
        f64::from(open) / f64::from(cells)
    }
}

/// Open fraction of every cell strictly beyond the head in `dir`
fn half_board_ratio(grid: &Grid, head: Position, dir: Direction) -> f64 {
    let mut cells = 0u32;
    let mut open = 0u32;
    for (pos, state) in grid.cells() {
        if in_half_plane(dir, head, pos) {
            cells += 1;
            if is_open(state) {
                open += 1;
            }
        }
    }

    if cells == 0 {
        0.0
    } else {
        f64::from(open) / f64::from(cells)
    }
}
