// Board model: typed occupancy grid built fresh from each turn's snapshot
//
// The wire format uses (x, y) with y growing upward. Internally everything is
// (row, col) with row 0 at the top edge, so row = height - 1 - y.

use crate::types::{Battlesnake, Board, Coord, Direction};

/// Grid coordinate, valid when inside `[0, height) x [0, width)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub fn new(row: i32, col: i32) -> Self {
        Position { row, col }
    }

    /// Neighbor one step away in `dir`, possibly off-board
    pub fn step(self, dir: Direction) -> Position {
        let (dr, dc) = dir.delta();
        Position {
            row: self.row + dr,
            col: self.col + dc,
        }
    }

    pub fn manhattan(self, other: Position) -> i32 {
        (self.row - other.row).abs() + (self.col - other.col).abs()
    }
}

/// What a single cell holds this turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Empty,
    Occupied,
    Food,
    Head,
}

/// One agent as seen in the snapshot; body is head-first, tail-last
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub id: String,
    pub body: Vec<Position>,
    pub health: i32,
    pub length: usize,
}

impl Agent {
    pub fn head(&self) -> Option<Position> {
        self.body.first().copied()
    }

    pub fn tail(&self) -> Option<Position> {
        self.body.last().copied()
    }
}

/// Parsed per-turn input consumed by the decision core
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub height: i32,
    pub width: i32,
    pub food: Vec<Position>,
    /// Every agent on the board, normally including self
    pub agents: Vec<Agent>,
    pub you: Agent,
}

impl Snapshot {
    /// Converts the Battlesnake wire representation into grid coordinates
    pub fn from_wire(board: &Board, you: &Battlesnake) -> Self {
        let height = board.height;
        let to_pos = |c: &Coord| Position::new(height - 1 - c.y, c.x);

        let convert = |snake: &Battlesnake| {
            let mut body: Vec<Position> = snake.body.iter().map(to_pos).collect();
            if body.is_empty() {
                body.push(to_pos(&snake.head));
            }
            let length = if snake.length > 0 {
                snake.length as usize
            } else {
                body.len()
            };
            Agent {
                id: snake.id.clone(),
                body,
                health: snake.health,
                length,
            }
        };

        Snapshot {
            height,
            width: board.width,
            food: board.food.iter().map(to_pos).collect(),
            agents: board.snakes.iter().map(convert).collect(),
            you: convert(you),
        }
    }

    /// Agents other than self
    pub fn others(&self) -> impl Iterator<Item = &Agent> {
        let my_id = self.you.id.clone();
        self.agents.iter().filter(move |a| a.id != my_id)
    }

    /// Whether self is still listed among the live agents on the board
    pub fn you_on_board(&self) -> bool {
        self.agents.iter().any(|a| a.id == self.you.id)
    }
}

/// Row-major occupancy grid
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    height: i32,
    width: i32,
    cells: Vec<CellState>,
}

impl Grid {
    pub fn new(height: i32, width: i32) -> Self {
        let height = height.max(0);
        let width = width.max(0);
        Grid {
            height,
            width,
            cells: vec![CellState::Empty; (height * width) as usize],
        }
    }

    /// Paints bodies, then food, then self's head. Later writes win, and
    /// coordinates outside the board are dropped.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut grid = Grid::new(snapshot.height, snapshot.width);

        for agent in snapshot.agents.iter().chain(std::iter::once(&snapshot.you)) {
            for &pos in &agent.body {
                grid.set(pos, CellState::Occupied);
            }
        }
        for &pos in &snapshot.food {
            grid.set(pos, CellState::Food);
        }
        if let Some(head) = snapshot.you.head() {
            grid.set(head, CellState::Head);
        }

        grid
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn area(&self) -> usize {
        self.cells.len()
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.row >= 0 && pos.row < self.height && pos.col >= 0 && pos.col < self.width
    }

    fn offset(&self, pos: Position) -> Option<usize> {
        if self.in_bounds(pos) {
            Some((pos.row * self.width + pos.col) as usize)
        } else {
            None
        }
    }

    /// Cell contents, `None` when off-board
    pub fn get(&self, pos: Position) -> Option<CellState> {
        self.offset(pos).map(|i| self.cells[i])
    }

    /// Writes a cell; returns false and leaves the grid untouched when off-board
    pub fn set(&mut self, pos: Position, state: CellState) -> bool {
        match self.offset(pos) {
            Some(i) => {
                self.cells[i] = state;
                true
            }
            None => false,
        }
    }

    /// Dense index usable for visited bitmaps; callers must check bounds first
    pub fn index_of(&self, pos: Position) -> usize {
        (pos.row * self.width + pos.col) as usize
    }

    /// In-board neighbors in canonical direction order
    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = (Direction, Position)> + '_ {
        Direction::all()
            .into_iter()
            .map(move |dir| (dir, pos.step(dir)))
            .filter(move |(_, next)| self.in_bounds(*next))
    }

    /// Iterates over every in-board position with its state
    pub fn cells(&self) -> impl Iterator<Item = (Position, CellState)> + '_ {
        let width = self.width;
        self.cells.iter().enumerate().map(move |(i, &state)| {
            let i = i as i32;
            (Position::new(i / width, i % width), state)
        })
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_head_overrides_food_and_body() {
        let you = agent("me", &[(2, 2), (2, 3)], 80);
        let snap = snapshot(5, 5, you, vec![], &[(2, 2), (0, 0)]);
        let grid = Grid::from_snapshot(&snap);
        assert_eq!(grid.get(Position::new(2, 2)), Some(CellState::Head));
        assert_eq!(grid.get(Position::new(2, 3)), Some(CellState::Occupied));
        assert_eq!(grid.get(Position::new(0, 0)), Some(CellState::Food));
        assert_eq!(grid.get(Position::new(4, 4)), Some(CellState::Empty));
    }

    #[test]
    fn test_out_of_range_coordinates_are_dropped() {
        let you = agent("me", &[(1, 1), (1, 0), (1, -1)], 80);
        let other = agent("them", &[(9, 9), (3, 3)], 80);
        let snap = snapshot(4, 4, you, vec![other], &[(-1, 2), (2, 7)]);
        let grid = Grid::from_snapshot(&snap);
        assert_eq!(grid.get(Position::new(1, -1)), None);
        assert_eq!(grid.get(Position::new(3, 3)), Some(CellState::Occupied));
        let food = grid.cells().filter(|(_, s)| *s == CellState::Food).count();
        assert_eq!(food, 0);
    }

    #[test]
    fn test_wire_conversion_flips_y_axis() {
        let you = Battlesnake {
            id: "me".to_string(),
            health: 90,
            body: vec![Coord { x: 1, y: 0 }, Coord { x: 1, y: 1 }],
            head: Coord { x: 1, y: 0 },
            length: 2,
            ..Default::default()
        };
        let board = Board {
            height: 5,
            width: 5,
            food: vec![Coord { x: 0, y: 4 }],
            snakes: vec![you.clone()],
            hazards: vec![],
        };
        let snap = Snapshot::from_wire(&board, &you);
        assert_eq!(snap.you.head(), Some(Position::new(4, 1)));
        assert_eq!(snap.food, vec![Position::new(0, 0)]);

        // Battlesnake "up" (y + 1) must be a row decrease
        let up = Position::new(4, 1).step(Direction::Up);
        assert_eq!(up, Position::new(3, 1));
        assert_eq!(up, to_grid(&board, Coord { x: 1, y: 1 }));
    }

    fn to_grid(board: &Board, c: Coord) -> Position {
        Position::new(board.height - 1 - c.y, c.x)
    }
}
