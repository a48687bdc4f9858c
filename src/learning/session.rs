// Per-game learning state
//
// Each concurrent game owns one Session, created on /start and dropped on /end.
// The store hands out Arc<Mutex<Session>> so the map lock is never held while
// a turn is being computed.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::board::Agent;
use crate::encoder::StateId;
use crate::types::Direction;

/// Health and length observed on the previous learned turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remembered {
    pub health: i32,
    pub length: usize,
}

impl From<&Agent> for Remembered {
    fn from(agent: &Agent) -> Self {
        Remembered {
            health: agent.health,
            length: agent.length,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// (state, action) awaiting its reward
    pub pending: Option<(StateId, Direction)>,
    pub remembered: Option<Remembered>,
    /// Health at or below which the danger signal fires; decays after each meal
    pub health_threshold: f64,
}

impl Session {
    pub fn new(health_threshold: f64) -> Self {
        Session {
            pending: None,
            remembered: None,
            health_threshold,
        }
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionHandle>>,
    initial_threshold: f64,
}

impl SessionStore {
    pub fn new(initial_threshold: f64) -> Self {
        SessionStore {
            sessions: Mutex::new(HashMap::new()),
            initial_threshold,
        }
    }

    /// Creates a fresh session, replacing any stale one with the same id
    pub fn start(&self, id: &str) -> SessionHandle {
        let handle = Arc::new(Mutex::new(Session::new(self.initial_threshold)));
        self.sessions.lock().insert(id.to_string(), handle.clone());
        handle
    }

    pub fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.lock().get(id).cloned()
    }

    /// Looks up a session, starting one if the game began before we saw /start
    pub fn get_or_start(&self, id: &str) -> SessionHandle {
        let mut sessions = self.sessions.lock();
        sessions
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(self.initial_threshold))))
            .clone()
    }

    /// Removes the session and returns it for final bookkeeping
    pub fn end(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.lock().remove(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
