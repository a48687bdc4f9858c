// Learned strategy: Q-policy fallback with per-game sessions
//
// Each move first settles the outcome of the previous (state, action) pair,
// then encodes the current board and asks the learner for the next action.
// The danger threshold decays in both modes so state ids agree; in inference
// mode the reward is discarded and the table is never touched.

use log::{debug, info, warn};
use std::sync::Arc;

use crate::config::{RewardConfig, RuntimeConfig};
use crate::encoder::{StateEncoder, StateId};
use crate::learning::{Outcome, QLearner, Remembered, Session, SessionStore};
use crate::strategy::{Strategy, TurnContext};
use crate::types::Direction;

pub struct LearnedStrategy {
    learner: Arc<QLearner>,
    sessions: SessionStore,
    encoder: StateEncoder,
    runtime: RuntimeConfig,
    rewards: RewardConfig,
    q_table_path: Option<String>,
}

impl LearnedStrategy {
    pub fn new(
        learner: Arc<QLearner>,
        encoder: StateEncoder,
        runtime: RuntimeConfig,
        rewards: RewardConfig,
        q_table_path: Option<String>,
    ) -> Self {
        LearnedStrategy {
            sessions: SessionStore::new(runtime.health_threshold),
            learner,
            encoder,
            runtime,
            rewards,
            q_table_path,
        }
    }

    pub fn learner(&self) -> &Arc<QLearner> {
        &self.learner
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn encode(&self, turn: &TurnContext, session: &Session) -> Option<StateId> {
        let head = turn.head()?;
        Some(self.encoder.encode(
            &turn.grid,
            head,
            turn.snapshot.you.health,
            session.health_threshold,
            &turn.routes,
        ))
    }

    /// Classifies the turn against the remembered health and returns its
    /// reward. Eating lowers the session's danger threshold.
    fn settle(&self, session: &mut Session, health: i32, died: bool) -> Option<f64> {
        let previous = session.remembered?;
        let outcome = Outcome::classify(health, previous.health, session.health_threshold, died);
        if outcome == Outcome::Ate {
            session.health_threshold *= self.runtime.health_threshold_decay;
        }
        let reward = self.rewards.value(outcome);
        debug!("Outcome {:?}, reward {}", outcome, reward);
        Some(reward)
    }
}

impl Strategy for LearnedStrategy {
    fn name(&self) -> &'static str {
        "LEARN"
    }

    fn start(&self, session_id: &str, _turn: &TurnContext) {
        self.sessions.start(session_id);
    }

    fn propose(&self, session_id: &str, turn: &TurnContext) -> Option<Direction> {
        let handle = self.sessions.get_or_start(session_id);
        let mut session = handle.lock();

        let health = turn.snapshot.you.health;
        let reward = self
            .settle(&mut session, health, false)
            .filter(|_| self.runtime.is_learning_mode);

        let state = self.encode(turn, &session)?;
        let action = match reward {
            Some(r) => self.learner.step(&mut session, state, r, &turn.blocks),
            None => self
                .learner
                .observe_initial(&mut session, state, &turn.blocks),
        };

        session.remembered = Some(Remembered::from(&turn.snapshot.you));
        Some(action)
    }

    fn end(&self, session_id: &str, turn: &TurnContext) {
        let Some(handle) = self.sessions.end(session_id) else {
            debug!("No session {} to end", session_id);
            return;
        };

        if self.runtime.is_learning_mode {
            let mut session = handle.lock();
            let died = turn.snapshot.you.health <= 0 || !turn.snapshot.you_on_board();
            let final_reward = self.settle(&mut session, turn.snapshot.you.health, died);
            if let (Some(reward), Some(state)) = (final_reward, self.encode(turn, &session)) {
                self.learner.step(&mut session, state, reward, &turn.blocks);
                info!(
                    "Game {} ended (died: {}), final reward {}",
                    session_id, died, reward
                );
            }
        }

        if self.runtime.dump_at_end {
            if let Some(path) = &self.q_table_path {
                match self.learner.dump(path) {
                    Ok(()) => info!(
                        "Dumped Q table to {} ({} states)",
                        path,
                        self.learner.known_states()
                    ),
                    Err(e) => warn!("Failed to dump Q table: {}", e),
                }
            }
        }
    }
}
