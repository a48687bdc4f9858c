// Action-value table with lazy entries and JSON persistence
//
// Two on-disk layouts are understood:
//   sparse  {"<state id>": [up, down, left, right], ...}
//   dense   [[up, down, left, right], ...] indexed by state id
// Load accepts either; dump writes the layout matching the in-memory storage.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::encoder::StateId;
use crate::types::Direction;

pub type ActionValues = [f64; 4];

/// In-memory representation of the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Storage {
    /// Hash map holding only visited states
    #[default]
    Sparse,
    /// One row per possible state id
    Dense,
}

#[derive(Debug, Clone)]
enum Rows {
    Sparse(HashMap<StateId, ActionValues>),
    Dense(Vec<Option<ActionValues>>),
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
enum PersistedTable {
    Sparse(BTreeMap<String, ActionValues>),
    Dense(Vec<ActionValues>),
}

/// Q table. States never written read as `default` for every action.
#[derive(Debug, Clone)]
pub struct QTable {
    default: f64,
    rows: Rows,
}

impl QTable {
    pub fn new(storage: Storage, num_states: usize, default: f64) -> Self {
        let rows = match storage {
            Storage::Sparse => Rows::Sparse(HashMap::new()),
            Storage::Dense => Rows::Dense(vec![None; num_states]),
        };
        QTable { default, rows }
    }

    pub fn sparse(default: f64) -> Self {
        QTable::new(Storage::Sparse, 0, default)
    }

    /// Whether `state` has ever been written or loaded
    pub fn contains(&self, state: StateId) -> bool {
        match &self.rows {
            Rows::Sparse(map) => map.contains_key(&state),
            Rows::Dense(rows) => matches!(rows.get(state as usize), Some(Some(_))),
        }
    }

    /// Number of known states
    pub fn len(&self) -> usize {
        match &self.rows {
            Rows::Sparse(map) => map.len(),
            Rows::Dense(rows) => rows.iter().filter(|r| r.is_some()).count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of every known state, ascending
    pub fn states(&self) -> Vec<StateId> {
        let mut states: Vec<StateId> = match &self.rows {
            Rows::Sparse(map) => map.keys().copied().collect(),
            Rows::Dense(rows) => rows
                .iter()
                .enumerate()
                .filter(|(_, r)| r.is_some())
                .map(|(i, _)| i as StateId)
                .collect(),
        };
        states.sort_unstable();
        states
    }

    pub fn values(&self, state: StateId) -> ActionValues {
        let known = match &self.rows {
            Rows::Sparse(map) => map.get(&state).copied(),
            Rows::Dense(rows) => rows.get(state as usize).copied().flatten(),
        };
        known.unwrap_or([self.default; 4])
    }

    pub fn get(&self, state: StateId, action: Direction) -> f64 {
        self.values(state)[action.index()]
    }

    /// Writes one entry, creating the state's row on first access
    pub fn set(&mut self, state: StateId, action: Direction, value: f64) {
        let default = self.default;
        let row = match &mut self.rows {
            Rows::Sparse(map) => map.entry(state).or_insert([default; 4]),
            Rows::Dense(rows) => {
                let idx = state as usize;
                if idx >= rows.len() {
                    rows.resize(idx + 1, None);
                }
                rows[idx].get_or_insert([default; 4])
            }
        };
        row[action.index()] = value;
    }

    fn insert_row(&mut self, state: StateId, values: ActionValues) {
        match &mut self.rows {
            Rows::Sparse(map) => {
                map.insert(state, values);
            }
            Rows::Dense(rows) => {
                let idx = state as usize;
                if idx >= rows.len() {
                    rows.resize(idx + 1, None);
                }
                rows[idx] = Some(values);
            }
        }
    }

    fn clear(&mut self) {
        match &mut self.rows {
            Rows::Sparse(map) => map.clear(),
            Rows::Dense(rows) => rows.iter_mut().for_each(|r| *r = None),
        }
    }

    /// Replaces the table contents with the parsed JSON document
    pub fn load_json(&mut self, json: &str) -> Result<(), String> {
        let persisted: PersistedTable = serde_json::from_str(json)
            .map_err(|e| format!("Failed to parse Q table: {}", e))?;

        self.clear();
        match persisted {
            PersistedTable::Sparse(entries) => {
                for (key, values) in entries {
                    let state = key
                        .trim()
                        .parse::<StateId>()
                        .map_err(|e| format!("Invalid state id '{}': {}", key, e))?;
                    self.insert_row(state, values);
                }
            }
            PersistedTable::Dense(rows) => {
                for (state, values) in rows.into_iter().enumerate() {
                    self.insert_row(state as StateId, values);
                }
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, String> {
        let persisted = match &self.rows {
            Rows::Sparse(map) => PersistedTable::Sparse(
                map.iter().map(|(s, v)| (s.to_string(), *v)).collect(),
            ),
            Rows::Dense(rows) => PersistedTable::Dense(
                rows.iter().map(|r| r.unwrap_or([self.default; 4])).collect(),
            ),
        };
        serde_json::to_string(&persisted).map_err(|e| format!("Failed to serialize Q table: {}", e))
    }

    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read Q table file: {}", e))?;
        self.load_json(&contents)
    }

    pub fn dump<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let json = self.to_json()?;
        fs::write(path.as_ref(), json).map_err(|e| format!("Failed to write Q table file: {}", e))
    }
}
