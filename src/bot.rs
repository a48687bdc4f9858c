// Battlesnake bot: wires the strategy chain to the API lifecycle
//
// The chain is built once at startup and shared by every game. Each move runs
// on the blocking thread pool under the effective time budget; if the budget
// runs out the first legal move is returned instead.

use log::{info, warn};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::blocking::BlockArray;
use crate::board::{Grid, Snapshot};
use crate::config::Config;
use crate::debug_logger::DebugLogger;
use crate::encoder::StateEncoder;
use crate::learning::QLearner;
use crate::strategy::{
    Decision, FoodStrategy, HeadStrategy, LearnedStrategy, Strategy, StrategyChain,
};
use crate::types::{Battlesnake, Board, Direction, Game};

/// Strategy label reported when the decision missed the time budget
pub const TIMEOUT: &str = "TIMEOUT";

/// Battlesnake Bot with OOP-style API
/// Takes static configuration dependencies and exposes methods corresponding to API endpoints
pub struct Bot {
    config: Config,
    chain: Arc<StrategyChain>,
    learned: Arc<LearnedStrategy>,
    logger: DebugLogger,
}

impl Bot {
    /// Creates a bot whose learner starts from the configured Q table file
    pub fn new(config: Config) -> Self {
        let learner = Arc::new(QLearner::load_or_empty(&config.learner));
        Self::with_learner(config, learner)
    }

    /// Creates a bot around an existing learner, sharing its table
    pub fn with_learner(config: Config, learner: Arc<QLearner>) -> Self {
        let learned = Arc::new(LearnedStrategy::new(
            learner,
            StateEncoder::new(config.encoder.resolution),
            config.runtime.clone(),
            config.reward.clone(),
            config.learner.q_table_path.clone(),
        ));

        let strategies: Vec<Box<dyn Strategy>> = vec![
            Box::new(HeadStrategy::new(config.safety.min_route_count)),
            Box::new(FoodStrategy::new(
                config.safety.min_route_count,
                config.runtime.is_food_strategy_threshold,
            )),
            Box::new(learned.clone()),
        ];
        let chain = Arc::new(StrategyChain::new(strategies));
        info!("Strategy chain: {}", chain.names().join(" -> "));

        Bot {
            config,
            chain,
            learned,
            logger: DebugLogger::disabled(),
        }
    }

    pub fn with_logger(mut self, logger: DebugLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn learned(&self) -> &Arc<LearnedStrategy> {
        &self.learned
    }

    /// Returns bot metadata and appearance
    /// Corresponds to GET / endpoint
    pub fn info(&self) -> Value {
        info!("INFO");

        json!({
            "apiversion": "1",
            "author": "dyna-snake",
            "color": "#3E8EDE",
            "head": "default",
            "tail": "default",
        })
    }

    /// Called when a game starts
    /// Corresponds to POST /start endpoint
    pub fn start(&self, game: &Game, _turn: &i32, board: &Board, you: &Battlesnake) {
        info!("GAME START {}", game.id);
        self.chain.start(&game.id, Snapshot::from_wire(board, you));
    }

    /// Called when a game ends
    /// Corresponds to POST /end endpoint
    ///
    /// The final update and any table dump run on the blocking pool so a
    /// large dump never stalls the async workers serving other games.
    pub async fn end(&self, game: &Game, turn: &i32, board: &Board, you: &Battlesnake) {
        info!("GAME OVER {} after {} turns", game.id, turn);
        let chain = self.chain.clone();
        let game_id = game.id.clone();
        let snapshot = Snapshot::from_wire(board, you);
        if let Err(e) = tokio::task::spawn_blocking(move || chain.end(&game_id, snapshot)).await {
            warn!("Game {}: end task failed ({})", game.id, e);
        }
    }

    /// Runs the strategy chain synchronously
    pub fn decide(&self, game_id: &str, board: &Board, you: &Battlesnake) -> Decision {
        self.chain.decide(game_id, Snapshot::from_wire(board, you))
    }

    /// Computes and returns the next move
    /// Corresponds to POST /move endpoint
    ///
    /// # Returns
    /// * `Value` - JSON response containing the chosen move direction
    pub async fn get_move(
        &self,
        game: &Game,
        turn: &i32,
        board: &Board,
        you: &Battlesnake,
    ) -> Value {
        let start_time = Instant::now();
        let snapshot = Snapshot::from_wire(board, you);
        let fallback = Decision {
            direction: first_open(&snapshot),
            strategy: TIMEOUT,
        };

        let chain = self.chain.clone();
        let game_id = game.id.clone();
        let task = tokio::task::spawn_blocking(move || chain.decide(&game_id, snapshot));

        let budget = Duration::from_millis(self.config.timing.effective_budget_ms());
        let decision = match tokio::time::timeout(budget, task).await {
            Ok(Ok(decision)) => decision,
            Ok(Err(e)) => {
                warn!("Turn {}: decision task failed ({}), using fallback", turn, e);
                fallback
            }
            Err(_) => {
                warn!(
                    "Turn {}: no decision within {}ms, using fallback",
                    turn,
                    budget.as_millis()
                );
                fallback
            }
        };

        info!(
            "Turn {}: {} chose {} (time: {}ms)",
            turn,
            decision.strategy,
            decision.direction.as_str(),
            start_time.elapsed().as_millis()
        );

        self.logger
            .log_move(&game.id, *turn, decision, board.clone(), you.id.clone());

        json!({ "move": decision.direction.as_str() })
    }
}

/// First unblocked direction in canonical order, Up when none is open
fn first_open(snapshot: &Snapshot) -> Direction {
    let grid = Grid::from_snapshot(snapshot);
    BlockArray::detect(&grid, snapshot)
        .open_directions()
        .first()
        .copied()
        .unwrap_or(Direction::Up)
}
