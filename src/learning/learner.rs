// Tabular Q-learning with Dyna-style replay
//
// The table, experience log, exploration rate and RNG sit behind a single
// table-wide lock. An update reads and writes Q(s, a) under that lock, so
// concurrent games never interleave between the read and the write.

use log::{debug, info, warn};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use std::path::Path;

use crate::blocking::BlockArray;
use crate::config::LearnerConfig;
use crate::encoder::StateId;
use crate::learning::session::Session;
use crate::learning::table::{ActionValues, QTable};
use crate::types::Direction;

/// Action returned when every move is blocked
pub const FORCED_ACTION: Direction = Direction::Up;

/// One observed step. The block array of `next_state` travels with it so
/// replayed updates mask the same illegal moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub state: StateId,
    pub action: Direction,
    pub next_state: StateId,
    pub reward: f64,
    pub next_blocks: BlockArray,
}

struct Shared {
    table: QTable,
    experience: Vec<Transition>,
    exploration_rate: f64,
    rng: StdRng,
}

pub struct QLearner {
    alpha: f64,
    gamma: f64,
    decay: f64,
    dyna: usize,
    verbose: bool,
    shared: Mutex<Shared>,
}

impl QLearner {
    pub fn new(config: &LearnerConfig) -> Self {
        let table = QTable::new(config.storage, config.num_states, config.initial_q);
        Self::with_table(config, table)
    }

    pub fn with_table(config: &LearnerConfig, table: QTable) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        QLearner {
            alpha: config.alpha,
            gamma: config.gamma,
            decay: config.radr,
            dyna: config.dyna,
            verbose: config.verbose,
            shared: Mutex::new(Shared {
                table,
                experience: Vec::new(),
                exploration_rate: config.rar,
                rng,
            }),
        }
    }

    /// Builds a learner from the configured table file. A missing or
    /// unreadable file starts from an empty table.
    pub fn load_or_empty(config: &LearnerConfig) -> Self {
        let mut table = QTable::new(config.storage, config.num_states, config.initial_q);
        if let Some(path) = &config.q_table_path {
            if Path::new(path).is_file() {
                match table.load(path) {
                    Ok(()) => info!("Loaded Q table from {} ({} states)", path, table.len()),
                    Err(e) => {
                        warn!("Could not load Q table {} ({}), starting empty", path, e);
                        table = QTable::new(config.storage, config.num_states, config.initial_q);
                    }
                }
            } else {
                info!("No Q table at {}, starting empty", path);
            }
        }
        Self::with_table(config, table)
    }

    /// Picks the first action of a session without touching the table
    pub fn observe_initial(
        &self,
        session: &mut Session,
        state: StateId,
        blocks: &BlockArray,
    ) -> Direction {
        let mut shared = self.shared.lock();
        let action = Self::choose_action(&mut shared, state, blocks);
        if self.verbose {
            debug!("s = {}, a = {}", state, action.as_str());
        }
        session.pending = Some((state, action));
        action
    }

    /// Learns from the session's pending (state, action), replays past
    /// experience, then picks and records the next action.
    pub fn step(
        &self,
        session: &mut Session,
        next_state: StateId,
        reward: f64,
        blocks: &BlockArray,
    ) -> Direction {
        let (state, action) = match session.pending {
            Some(pending) => pending,
            None => {
                debug!("No pending action for state {}, nothing to learn", next_state);
                return self.observe_initial(session, next_state, blocks);
            }
        };

        let mut shared = self.shared.lock();
        let transition = Transition {
            state,
            action,
            next_state,
            reward,
            next_blocks: *blocks,
        };
        self.update(&mut shared.table, &transition);
        shared.experience.push(transition);

        if self.dyna > 0 {
            self.replay(&mut shared);
        }

        let next_action = Self::choose_action(&mut shared, next_state, blocks);
        shared.exploration_rate *= self.decay;

        if self.verbose {
            debug!(
                "s = {}, a = {}, r = {}",
                next_state,
                next_action.as_str(),
                reward
            );
        }

        session.pending = Some((next_state, next_action));
        next_action
    }

    /// Q(s,a) <- (1 - alpha) Q(s,a) + alpha (r + gamma max_a' Q(s',a')),
    /// with a' restricted to moves legal in s'
    fn update(&self, table: &mut QTable, t: &Transition) {
        let future = best_value(&table.values(t.next_state), &t.next_blocks).unwrap_or(0.0);
        let old = table.get(t.state, t.action);
        let new = (1.0 - self.alpha) * old + self.alpha * (t.reward + self.gamma * future);
        table.set(t.state, t.action, new);
    }

    fn replay(&self, shared: &mut Shared) {
        let len = shared.experience.len();
        if len == 0 {
            return;
        }
        for _ in 0..self.dyna {
            let i = shared.rng.random_range(0..len);
            let t = shared.experience[i];
            self.update(&mut shared.table, &t);
        }
    }

    fn choose_action(shared: &mut Shared, state: StateId, blocks: &BlockArray) -> Direction {
        let open = blocks.open_directions();
        if open.is_empty() {
            return FORCED_ACTION;
        }

        if shared.rng.random::<f64>() < shared.exploration_rate {
            if let Some(&dir) = open.choose(&mut shared.rng) {
                return dir;
            }
        }

        greedy_action(&shared.table.values(state), blocks).unwrap_or(FORCED_ACTION)
    }

    pub fn exploration_rate(&self) -> f64 {
        self.shared.lock().exploration_rate
    }

    pub fn q_values(&self, state: StateId) -> ActionValues {
        self.shared.lock().table.values(state)
    }

    pub fn experience_len(&self) -> usize {
        self.shared.lock().experience.len()
    }

    pub fn known_states(&self) -> usize {
        self.shared.lock().table.len()
    }

    /// Copy of the current table, mostly for inspection and tests
    pub fn table(&self) -> QTable {
        self.shared.lock().table.clone()
    }

    /// Writes a snapshot of the table. Only the copy happens under the lock;
    /// other games keep learning while it is serialized and written.
    pub fn dump<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        self.table().dump(path)
    }
}

/// Highest value among unblocked actions, `None` when all are blocked
pub fn best_value(values: &ActionValues, blocks: &BlockArray) -> Option<f64> {
    greedy_action(values, blocks).map(|d| values[d.index()])
}

/// Unblocked action with the highest value, lowest index on ties
pub fn greedy_action(values: &ActionValues, blocks: &BlockArray) -> Option<Direction> {
    let mut best: Option<Direction> = None;
    for dir in blocks.open_directions() {
        match best {
            Some(b) if values[b.index()] >= values[dir.index()] => {}
            _ => best = Some(dir),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(alpha: f64, gamma: f64, rar: f64, radr: f64, dyna: usize) -> LearnerConfig {
        LearnerConfig {
            alpha,
            gamma,
            rar,
            radr,
            dyna,
            seed: Some(7),
            q_table_path: None,
            ..LearnerConfig::default()
        }
    }

    #[test]
    fn test_greedy_ignores_blocked_values() {
        let values = [10.0, 3.0, 3.0, -1.0];
        let blocks = BlockArray::new([true, false, false, false]);
        assert_eq!(greedy_action(&values, &blocks), Some(Direction::Down));
        assert_eq!(best_value(&values, &blocks), Some(3.0));
        assert_eq!(greedy_action(&values, &BlockArray::all()), None);
    }

    #[test]
    fn test_observe_initial_does_not_decay_or_learn() {
        let learner = QLearner::new(&config(0.5, 0.9, 0.3, 0.5, 0));
        let mut session = Session::new(50.0);
        learner.observe_initial(&mut session, 1, &BlockArray::default());
        assert_eq!(learner.exploration_rate(), 0.3);
        assert_eq!(learner.known_states(), 0);
        assert!(session.pending.is_some());
    }

    #[test]
    fn test_all_blocked_returns_forced_action() {
        let learner = QLearner::new(&config(0.5, 0.9, 1.0, 1.0, 0));
        let mut session = Session::new(50.0);
        let a = learner.observe_initial(&mut session, 1, &BlockArray::all());
        assert_eq!(a, FORCED_ACTION);
    }

    #[test]
    fn test_step_without_pending_behaves_like_initial() {
        let learner = QLearner::new(&config(0.5, 0.9, 0.0, 0.5, 0));
        let mut session = Session::new(50.0);
        learner.step(&mut session, 4, 1.0, &BlockArray::default());
        assert_eq!(learner.experience_len(), 0);
        assert_eq!(learner.exploration_rate(), 0.0);
        assert_eq!(session.pending, Some((4, Direction::Up)));
    }

    #[test]
    fn test_dump_runs_alongside_learning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let learner = std::sync::Arc::new(QLearner::new(&config(0.5, 0.9, 0.0, 1.0, 0)));

        let dumper = {
            let learner = learner.clone();
            let path = path.clone();
            std::thread::spawn(move || {
                for _ in 0..20 {
                    learner.dump(&path).unwrap();
                }
            })
        };

        let mut session = Session::new(50.0);
        learner.observe_initial(&mut session, 0, &BlockArray::default());
        for s in 1..200 {
            learner.step(&mut session, s, -1.0, &BlockArray::default());
        }
        dumper.join().unwrap();

        let mut saved = QTable::sparse(0.0);
        saved.load(&path).unwrap();
        assert!(saved.len() <= learner.known_states());
        assert_eq!(learner.known_states(), 199);
    }
}
