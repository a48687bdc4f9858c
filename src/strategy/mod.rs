// Move strategies and the ordered fallback chain that composes them
//
// Every turn the board model, block array and route counts are computed once
// in a TurnContext and shared by all strategies. Strategies are asked in
// order; the first one that proposes a legal move wins.

use log::{debug, info, warn};
use std::sync::Arc;

use crate::blocking::BlockArray;
use crate::board::{Grid, Position, Snapshot};
use crate::flood::RouteCounts;
use crate::types::Direction;

pub mod food;
pub mod head;
pub mod learned;

pub use food::FoodStrategy;
pub use head::HeadStrategy;
pub use learned::LearnedStrategy;

/// Strategy label reported when every move is blocked
pub const BLOCKED: &str = "BLOCKED";
/// Strategy label reported when the chain produced nothing usable
pub const FALLBACK: &str = "FALLBACK";

/// Everything derived from one snapshot, computed once per turn
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub snapshot: Snapshot,
    pub grid: Grid,
    pub blocks: BlockArray,
    pub routes: RouteCounts,
}

impl TurnContext {
    pub fn new(snapshot: Snapshot) -> Self {
        let grid = Grid::from_snapshot(&snapshot);
        let blocks = BlockArray::detect(&grid, &snapshot);
        let routes = match snapshot.you.head() {
            Some(head) if !blocks.all_blocked() => RouteCounts::compute(&grid, head, &blocks),
            _ => RouteCounts::default(),
        };
        TurnContext {
            snapshot,
            grid,
            blocks,
            routes,
        }
    }

    pub fn head(&self) -> Option<Position> {
        self.snapshot.you.head()
    }
}

/// One move source. `start` and `end` bracket a game; `propose` may decline
/// by returning `None` so the next strategy in the chain gets a turn.
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn start(&self, _session_id: &str, _turn: &TurnContext) {}

    fn propose(&self, session_id: &str, turn: &TurnContext) -> Option<Direction>;

    fn end(&self, _session_id: &str, _turn: &TurnContext) {}
}

impl<T: Strategy + ?Sized> Strategy for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn start(&self, session_id: &str, turn: &TurnContext) {
        (**self).start(session_id, turn)
    }

    fn propose(&self, session_id: &str, turn: &TurnContext) -> Option<Direction> {
        (**self).propose(session_id, turn)
    }

    fn end(&self, session_id: &str, turn: &TurnContext) {
        (**self).end(session_id, turn)
    }
}

/// The chosen move and the strategy that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub direction: Direction,
    pub strategy: &'static str,
}

pub struct StrategyChain {
    strategies: Vec<Box<dyn Strategy>>,
}

impl StrategyChain {
    pub fn new(strategies: Vec<Box<dyn Strategy>>) -> Self {
        StrategyChain { strategies }
    }

    /// Strategy names in the order they are consulted
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn start(&self, session_id: &str, snapshot: Snapshot) {
        let turn = TurnContext::new(snapshot);
        for strategy in &self.strategies {
            strategy.start(session_id, &turn);
        }
    }

    pub fn end(&self, session_id: &str, snapshot: Snapshot) {
        let turn = TurnContext::new(snapshot);
        for strategy in &self.strategies {
            strategy.end(session_id, &turn);
        }
    }

    pub fn decide(&self, session_id: &str, snapshot: Snapshot) -> Decision {
        self.decide_turn(session_id, &TurnContext::new(snapshot))
    }

    /// Walks the chain. Never returns a blocked move unless all four are blocked.
    pub fn decide_turn(&self, session_id: &str, turn: &TurnContext) -> Decision {
        if turn.blocks.all_blocked() {
            info!("All moves blocked, forced {}", Direction::Up.as_str());
            return Decision {
                direction: Direction::Up,
                strategy: BLOCKED,
            };
        }

        for strategy in &self.strategies {
            match strategy.propose(session_id, turn) {
                Some(dir) if turn.blocks.is_blocked(dir) => {
                    warn!(
                        "{} proposed blocked move {}, skipping",
                        strategy.name(),
                        dir.as_str()
                    );
                }
                Some(dir) => {
                    return Decision {
                        direction: dir,
                        strategy: strategy.name(),
                    };
                }
                None => debug!("{} declined", strategy.name()),
            }
        }

        let direction = turn
            .routes
            .most_open(&turn.blocks)
            .unwrap_or(Direction::Up);
        Decision {
            direction,
            strategy: FALLBACK,
        }
    }
}
