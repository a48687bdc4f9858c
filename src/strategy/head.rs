// Tactical strategy: dodge or attack nearby heads

use crate::strategy::{Strategy, TurnContext};
use crate::tactics::TacticalArbiter;
use crate::types::Direction;

pub struct HeadStrategy {
    arbiter: TacticalArbiter,
}

impl HeadStrategy {
    pub fn new(min_route_count: u64) -> Self {
        HeadStrategy {
            arbiter: TacticalArbiter::new(min_route_count),
        }
    }
}

impl Strategy for HeadStrategy {
    fn name(&self) -> &'static str {
        "HEAD"
    }

    fn propose(&self, _session_id: &str, turn: &TurnContext) -> Option<Direction> {
        self.arbiter
            .recommend(&turn.snapshot, &turn.blocks, &turn.routes)
    }
}
