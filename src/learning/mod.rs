// Learned fallback policy: value table, per-game sessions, rewards and the learner

pub mod learner;
pub mod reward;
pub mod session;
pub mod table;

pub use learner::{QLearner, Transition, FORCED_ACTION};
pub use reward::Outcome;
pub use session::{Remembered, Session, SessionStore};
pub use table::{ActionValues, QTable, Storage};
