// Configuration module for reading Snake.toml
// Every section and field has a default, so a partial file is still valid.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::encoder::{Resolution, STATE_SPACE};
use crate::learning::Storage;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub learner: LearnerConfig,
    pub runtime: RuntimeConfig,
    pub reward: RewardConfig,
    pub safety: SafetyConfig,
    pub encoder: EncoderConfig,
    pub timing: TimingConfig,
    pub debug: DebugConfig,
}

/// Q-learner hyperparameters and table location
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LearnerConfig {
    /// Rows preallocated by the dense table
    pub num_states: usize,
    /// Always 4: up, down, left, right
    pub num_actions: usize,
    /// Learning rate
    pub alpha: f64,
    /// Discount factor
    pub gamma: f64,
    /// Initial random action rate
    pub rar: f64,
    /// Random action rate decay applied after every learning step
    pub radr: f64,
    /// Replayed transitions per learning step
    pub dyna: usize,
    pub verbose: bool,
    /// Q table file; a missing file starts from an empty table
    #[serde(rename = "Q")]
    pub q_table_path: Option<String>,
    pub storage: Storage,
    /// Value read for state/action pairs never visited
    pub initial_q: f64,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        LearnerConfig {
            num_states: STATE_SPACE as usize,
            num_actions: 4,
            alpha: 0.2,
            gamma: 0.9,
            rar: 0.5,
            radr: 0.99,
            dyna: 0,
            verbose: false,
            q_table_path: Some("qtable.json".to_string()),
            storage: Storage::Sparse,
            initial_q: 0.0,
            seed: None,
        }
    }
}

/// Per-game behaviour switches
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// When false the learned policy only picks actions and never updates
    pub is_learning_mode: bool,
    /// Starting danger threshold of every session
    pub health_threshold: f64,
    /// Multiplier applied to the session threshold after each meal
    pub health_threshold_decay: f64,
    /// Write the Q table to disk after each game
    pub dump_at_end: bool,
    /// Seek food while our length < longest opponent length + this margin
    pub is_food_strategy_threshold: i32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            is_learning_mode: true,
            health_threshold: 100.0,
            health_threshold_decay: 0.9,
            dump_at_end: false,
            is_food_strategy_threshold: 2,
        }
    }
}

/// Rewards fed to the learner, one per turn outcome
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RewardConfig {
    pub default: f64,
    pub low_health: f64,
    pub die: f64,
    pub eat_food: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        RewardConfig {
            default: -1.0,
            low_health: -10.0,
            die: -10000.0,
            eat_food: 100.0,
        }
    }
}

/// Open-space floor shared by the tactical and food strategies
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SafetyConfig {
    pub min_route_count: u64,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        SafetyConfig { min_route_count: 11 }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct EncoderConfig {
    pub resolution: Resolution,
}

/// Timing and performance constants
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    pub response_time_budget_ms: u64,
    pub network_overhead_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            response_time_budget_ms: 400,
            network_overhead_ms: 50,
        }
    }
}

impl TimingConfig {
    /// Computes the effective computation budget
    pub fn effective_budget_ms(&self) -> u64 {
        self.response_time_budget_ms.saturating_sub(self.network_overhead_ms)
    }
}

/// Debug configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        DebugConfig {
            enabled: false,
            log_file_path: "battlesnake_debug.jsonl".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_hardcoded()
    }
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Snake.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, String> {
        let config: Config =
            toml::from_str(contents).map_err(|e| format!("Failed to parse config file: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads default configuration from Snake.toml in the project root
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Snake.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Snake.toml
    pub fn default_hardcoded() -> Self {
        Config {
            learner: LearnerConfig::default(),
            runtime: RuntimeConfig::default(),
            reward: RewardConfig::default(),
            safety: SafetyConfig::default(),
            encoder: EncoderConfig::default(),
            timing: TimingConfig::default(),
            debug: DebugConfig::default(),
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            eprintln!(
                "Warning: Could not load Snake.toml ({}), using hardcoded defaults",
                e
            );
            Self::default_hardcoded()
        })
    }

    /// Rejects parameter values the learner cannot work with
    pub fn validate(&self) -> Result<(), String> {
        let l = &self.learner;
        if l.num_actions != 4 {
            return Err(format!("num_actions must be 4, got {}", l.num_actions));
        }
        for (name, value) in [
            ("alpha", l.alpha),
            ("gamma", l.gamma),
            ("rar", l.rar),
            ("radr", l.radr),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be within [0, 1], got {}", name, value));
            }
        }
        if !l.initial_q.is_finite() {
            return Err("initial_q must be finite".to_string());
        }
        if !(0.0..=1.0).contains(&self.runtime.health_threshold_decay) {
            return Err(format!(
                "health_threshold_decay must be within [0, 1], got {}",
                self.runtime.health_threshold_decay
            ));
        }
        Ok(())
    }
}
