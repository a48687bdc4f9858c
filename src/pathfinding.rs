// Breadth-first food seeking
//
// Both searches walk every cell not marked Occupied (food and empty cells are
// traversable), expand neighbors in canonical direction order and start with
// the head already visited, so ties resolve Up, Down, Left, Right.

use std::collections::VecDeque;

use crate::board::{CellState, Grid, Position};
use crate::types::Direction;

pub struct FoodPathfinder<'a> {
    grid: &'a Grid,
}

impl<'a> FoodPathfinder<'a> {
    pub fn new(grid: &'a Grid) -> Self {
        FoodPathfinder { grid }
    }

    fn traversable(&self, pos: Position) -> bool {
        matches!(
            self.grid.get(pos),
            Some(CellState::Empty) | Some(CellState::Food)
        )
    }

    /// Nearest food by hop count, or `None` when the head's region has no food
    pub fn find_closest_food(&self, head: Position) -> Option<Position> {
        if !self.grid.in_bounds(head) {
            return None;
        }

        let mut visited = vec![false; self.grid.area()];
        let mut queue = VecDeque::new();
        visited[self.grid.index_of(head)] = true;
        queue.push_back(head);

        while let Some(pos) = queue.pop_front() {
            if self.grid.get(pos) == Some(CellState::Food) {
                return Some(pos);
            }
            for (_, next) in self.grid.neighbors(pos) {
                let idx = self.grid.index_of(next);
                if !visited[idx] && self.traversable(next) {
                    visited[idx] = true;
                    queue.push_back(next);
                }
            }
        }

        None
    }

    /// Shortest path from `head` to `target` as a list of moves.
    /// Parent links record the direction used to discover each cell.
    pub fn path_to(&self, head: Position, target: Position) -> Option<Vec<Direction>> {
        if !self.grid.in_bounds(head) || !self.grid.in_bounds(target) {
            return None;
        }
        if head == target {
            return Some(Vec::new());
        }

        let mut came_from: Vec<Option<Direction>> = vec![None; self.grid.area()];
        let mut visited = vec![false; self.grid.area()];
        let mut queue = VecDeque::new();
        visited[self.grid.index_of(head)] = true;
        queue.push_back(head);

        while let Some(pos) = queue.pop_front() {
            if pos == target {
                return Some(self.reconstruct(head, target, &came_from));
            }
            for (dir, next) in self.grid.neighbors(pos) {
                let idx = self.grid.index_of(next);
                if !visited[idx] && self.traversable(next) {
                    visited[idx] = true;
                    came_from[idx] = Some(dir);
                    queue.push_back(next);
                }
            }
        }

        None
    }

    fn reconstruct(
        &self,
        head: Position,
        target: Position,
        came_from: &[Option<Direction>],
    ) -> Vec<Direction> {
        let mut path = Vec::new();
        let mut pos = target;
        while pos != head {
            match came_from[self.grid.index_of(pos)] {
                Some(dir) => {
                    path.push(dir);
                    pos = pos.step(dir.opposite());
                }
                None => break,
            }
        }
        path.reverse();
        path
    }

    /// Shortest path to the nearest food, if any food is reachable
    pub fn path_to_closest_food(&self, head: Position) -> Option<Vec<Direction>> {
        let food = self.find_closest_food(head)?;
        self.path_to(head, food)
    }

    /// First move of the shortest path to the nearest food
    pub fn next_step(&self, head: Position) -> Option<Direction> {
        self.path_to_closest_food(head)
            .and_then(|path| path.first().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::test_support::{agent, snapshot};

    #[test]
    fn test_empty_board_corner_to_corner() {
        let you = agent("me", &[(4, 4)], 50);
        let grid = Grid::from_snapshot(&snapshot(5, 5, you, vec![], &[(0, 0)]));
        let finder = FoodPathfinder::new(&grid);

        let path = finder.path_to_closest_food(Position::new(4, 4)).unwrap();
        assert_eq!(path.len(), 8);
        assert_eq!(path[0], Direction::Up);
        assert_eq!(finder.next_step(Position::new(4, 4)), Some(Direction::Up));
    }

    #[test]
    fn test_path_length_matches_manhattan_without_obstacles() {
        let head = Position::new(3, 2);
        for food in [(0, 0), (6, 6), (3, 6), (0, 2), (5, 1)] {
            let you = agent("me", &[(3, 2)], 50);
            let grid = Grid::from_snapshot(&snapshot(7, 7, you, vec![], &[food]));
            let path = FoodPathfinder::new(&grid)
                .path_to_closest_food(head)
                .unwrap();
            assert_eq!(
                path.len() as i32,
                head.manhattan(Position::new(food.0, food.1))
            );
        }
    }

    #[test]
    fn test_nearest_food_wins() {
        let you = agent("me", &[(2, 2)], 50);
        let grid = Grid::from_snapshot(&snapshot(5, 5, you, vec![], &[(0, 0), (2, 4)]));
        let finder = FoodPathfinder::new(&grid);
        assert_eq!(
            finder.find_closest_food(Position::new(2, 2)),
            Some(Position::new(2, 4))
        );
        assert_eq!(finder.next_step(Position::new(2, 2)), Some(Direction::Right));
    }

    #[test]
    fn test_walled_off_food_is_unreachable() {
        // Column 2 is a wall; food sits on the far side
        let you = agent("me", &[(2, 0)], 50);
        let wall = agent("wall", &[(0, 2), (1, 2), (2, 2), (3, 2), (4, 2)], 100);
        let grid = Grid::from_snapshot(&snapshot(5, 5, you, vec![wall], &[(2, 4)]));
        let finder = FoodPathfinder::new(&grid);
        assert_eq!(finder.find_closest_food(Position::new(2, 0)), None);
        assert_eq!(finder.next_step(Position::new(2, 0)), None);
    }

    #[test]
    fn test_path_routes_around_bodies() {
        let you = agent("me", &[(2, 0)], 50);
        let wall = agent("wall", &[(1, 1), (2, 1), (3, 1), (4, 1)], 100);
        let grid = Grid::from_snapshot(&snapshot(5, 5, you, vec![wall], &[(2, 2)]));
        let path = FoodPathfinder::new(&grid)
            .path_to_closest_food(Position::new(2, 0))
            .unwrap();
        assert_eq!(
            path,
            vec![
                Direction::Up,
                Direction::Up,
                Direction::Right,
                Direction::Right,
                Direction::Down,
                Direction::Down
            ]
        );
    }
}
