// Head-to-head arbitration against nearby opposing heads
//
// Two geometries matter: a head diagonally adjacent to ours, and a head two
// cells away on the same row or column (one shared gap cell between us).
// Longer-or-equal opponents are dodged, shorter ones are attacked.

use log::debug;

use crate::blocking::BlockArray;
use crate::board::{Position, Snapshot};
use crate::flood::RouteCounts;
use crate::types::Direction;

/// Relative placement of an opposing head
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threat {
    /// Row and column each differ by exactly one
    Diagonal,
    /// Two cells apart along one axis, aligned on the other
    Opposite,
}

impl Threat {
    pub fn classify(me: Position, other: Position) -> Option<Threat> {
        let dr = (other.row - me.row).abs();
        let dc = (other.col - me.col).abs();
        match (dr, dc) {
            (1, 1) => Some(Threat::Diagonal),
            (2, 0) | (0, 2) => Some(Threat::Opposite),
            _ => None,
        }
    }
}

/// Projection of `dir` onto the offset from `me` to `other`;
/// positive means the move closes the gap.
fn approach(dir: Direction, me: Position, other: Position) -> i32 {
    let (dr, dc) = dir.delta();
    dr * (other.row - me.row) + dc * (other.col - me.col)
}

pub struct TacticalArbiter {
    min_route_count: u64,
}

impl TacticalArbiter {
    pub fn new(min_route_count: u64) -> Self {
        TacticalArbiter { min_route_count }
    }

    /// Accumulated dodge/attack scores per direction, blocked directions zeroed
    pub fn score(&self, snapshot: &Snapshot, blocks: &BlockArray) -> [i32; 4] {
        let mut scores = [0i32; 4];
        let me = match snapshot.you.head() {
            Some(h) => h,
            None => return scores,
        };
        let my_length = snapshot.you.length;

        for agent in snapshot.others() {
            let head = match agent.head() {
                Some(h) => h,
                None => continue,
            };
            let threat = match Threat::classify(me, head) {
                Some(t) => t,
                None => continue,
            };
            let dodge = agent.length >= my_length;

            for dir in Direction::all() {
                let toward = approach(dir, me, head);
                let scored = match (threat, dodge) {
                    (Threat::Diagonal, true) => toward < 0,
                    (Threat::Diagonal, false) => toward > 0,
                    // Sidestepping also leaves the shared gap cell
                    (Threat::Opposite, true) => toward <= 0,
                    (Threat::Opposite, false) => toward > 0,
                };
                if scored {
                    scores[dir.index()] += 1;
                }
            }
        }

        for dir in Direction::all() {
            if blocks.is_blocked(dir) {
                scores[dir.index()] = 0;
            }
        }
        scores
    }

    /// Tactical recommendation, or `None` when no threat applies or the best
    /// tactical move leads into too little space.
    pub fn recommend(
        &self,
        snapshot: &Snapshot,
        blocks: &BlockArray,
        routes: &RouteCounts,
    ) -> Option<Direction> {
        let scores = self.score(snapshot, blocks);
        if scores.iter().all(|&s| s == 0) {
            return None;
        }

        let mut best = Direction::Up;
        for dir in Direction::all() {
            if scores[dir.index()] > scores[best.index()] {
                best = dir;
            }
        }

        if routes.get(best) < self.min_route_count {
            debug!(
                "Tactical move {} declined: {} routes below floor {}",
                best.as_str(),
                routes.get(best),
                self.min_route_count
            );
            return None;
        }

        Some(best)
    }
}
