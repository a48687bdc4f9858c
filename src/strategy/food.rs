// Food-seeking strategy
//
// Active only while we are not comfortably longer than every opponent.
// Follows the shortest path to the nearest food when its first step is legal
// and leads into enough space, otherwise takes the most open legal move.
// Declines when no food is reachable.

use log::debug;

use crate::pathfinding::FoodPathfinder;
use crate::strategy::{Strategy, TurnContext};
use crate::types::Direction;

pub struct FoodStrategy {
    min_route_count: u64,
    length_margin: i32,
}

impl FoodStrategy {
    pub fn new(min_route_count: u64, length_margin: i32) -> Self {
        FoodStrategy {
            min_route_count,
            length_margin,
        }
    }

    /// True while our length < longest opponent length + margin
    pub fn is_hungry(&self, turn: &TurnContext) -> bool {
        let longest = turn
            .snapshot
            .others()
            .map(|a| a.length)
            .max()
            .unwrap_or(0) as i64;
        (turn.snapshot.you.length as i64) < longest + i64::from(self.length_margin)
    }
}

impl Strategy for FoodStrategy {
    fn name(&self) -> &'static str {
        "FOOD"
    }

    fn propose(&self, _session_id: &str, turn: &TurnContext) -> Option<Direction> {
        if !self.is_hungry(turn) {
            return None;
        }
        let head = turn.head()?;
        let step = FoodPathfinder::new(&turn.grid).next_step(head)?;

        if turn.blocks.is_blocked(step) || turn.routes.get(step) < self.min_route_count {
            debug!(
                "Food step {} unsafe ({} routes), taking most open move",
                step.as_str(),
                turn.routes.get(step)
            );
            return turn.routes.most_open(&turn.blocks);
        }

        Some(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::test_support::{agent, snapshot};

    #[test]
    fn test_hunger_threshold() {
        let strategy = FoodStrategy::new(11, 2);
        let you = agent("me", &[(5, 5), (5, 6), (5, 7), (5, 8)], 80);
        let rival = agent("them", &[(0, 0), (0, 1), (0, 2)], 80);
        // 4 < 3 + 2
        let turn = TurnContext::new(snapshot(11, 11, you.clone(), vec![rival], &[]));
        assert!(strategy.is_hungry(&turn));

        let short = agent("them", &[(0, 0), (0, 1)], 80);
        // 4 < 2 + 2 is false
        let turn = TurnContext::new(snapshot(11, 11, you, vec![short], &[]));
        assert!(!strategy.is_hungry(&turn));
    }

    #[test]
    fn test_follows_path_when_safe() {
        let strategy = FoodStrategy::new(11, 2);
        let you = agent("me", &[(5, 5), (6, 5)], 80);
        let turn = TurnContext::new(snapshot(11, 11, you, vec![], &[(5, 8)]));
        assert_eq!(strategy.propose("g", &turn), Some(Direction::Right));
    }

    #[test]
    fn test_declines_without_reachable_food() {
        let strategy = FoodStrategy::new(11, 2);
        let you = agent("me", &[(5, 5), (6, 5)], 80);
        let turn = TurnContext::new(snapshot(11, 11, you, vec![], &[]));
        assert_eq!(strategy.propose("g", &turn), None);
    }

    #[test]
    fn test_unsafe_first_step_takes_most_open_move() {
        // Food sits in a one-cell pocket to the left; the open board is to the right
        let you = agent("me", &[(2, 1), (3, 1), (4, 1)], 80);
        let wall = agent("wall", &[(1, 0), (1, 1), (1, 2)], 100);
        let floor = agent("floor", &[(3, 0), (4, 0)], 100);
        let turn = TurnContext::new(snapshot(7, 7, you, vec![wall, floor], &[(2, 0)]));
        let strategy = FoodStrategy::new(11, 10);
        assert_eq!(turn.routes.get(Direction::Left), 1);
        assert_eq!(strategy.propose("g", &turn), Some(Direction::Right));
    }
}
