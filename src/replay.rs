// Replay module for analyzing historical game states and debugging decision-making
//
// This module provides functionality to:
// 1. Parse JSONL debug logs
// 2. Replay the strategy chain on historical states (inference mode, no exploration)
// 3. Compare logged vs replayed moves, per turn and per strategy
// 4. Generate detailed analysis reports

use log::{info, warn};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use crate::bot::Bot;
use crate::config::Config;
use crate::types::{Battlesnake, Direction};

pub use crate::debug_logger::DebugLogEntry as LogEntry;

/// Result of replaying a single turn
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub turn: i32,
    pub original_move: Direction,
    pub replayed_move: Direction,
    pub original_strategy: String,
    pub replayed_strategy: &'static str,
    pub matches: bool,
    pub computation_time_ms: u128,
}

/// Match counts for one strategy
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StrategyStats {
    pub turns: usize,
    pub matches: usize,
}

/// Statistics for a complete replay session
#[derive(Debug, Default)]
pub struct ReplayStats {
    pub total_turns: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub match_rate: f64,
    /// Keyed by the strategy that produced the replayed move
    pub per_strategy: BTreeMap<&'static str, StrategyStats>,
}

/// Replay engine for analyzing debug logs
pub struct ReplayEngine {
    bot: Bot,
    verbose: bool,
}

impl ReplayEngine {
    /// Creates a new replay engine. Learning, exploration, table dumps and
    /// debug logging are switched off so replays are deterministic.
    pub fn new(config: Config, verbose: bool) -> Self {
        ReplayEngine {
            bot: Bot::new(Self::inference_config(config)),
            verbose,
        }
    }

    pub fn inference_config(mut config: Config) -> Config {
        config.runtime.is_learning_mode = false;
        config.runtime.dump_at_end = false;
        config.learner.rar = 0.0;
        config.debug.enabled = false;
        config
    }

    /// Loads all log entries from a JSONL file
    pub fn load_log_file<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<LogEntry>, String> {
        let file =
            File::open(log_path.as_ref()).map_err(|e| format!("Failed to open log file: {}", e))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: LogEntry = serde_json::from_str(&line)
                .map_err(|e| format!("Failed to parse JSON on line {}: {}", line_num + 1, e))?;

            entries.push(entry);
        }

        info!("Loaded {} log entries", entries.len());
        Ok(entries)
    }

    /// Our snake in a logged board; the first snake when the entry has no id
    fn find_you(entry: &LogEntry) -> Result<&Battlesnake, String> {
        if entry.you_id.is_empty() {
            return entry
                .board
                .snakes
                .first()
                .ok_or_else(|| "No snakes found in board state".to_string());
        }
        entry
            .board
            .snakes
            .iter()
            .find(|s| s.id == entry.you_id)
            .ok_or_else(|| format!("Snake with id '{}' not found in board state", entry.you_id))
    }

    /// Replays a single log entry and compares the result
    pub fn replay_entry(&self, entry: &LogEntry) -> Result<ReplayResult, String> {
        if self.verbose {
            info!("Replaying turn {}...", entry.turn);
        }

        let you = Self::find_you(entry)?;
        let original_move = Direction::parse(&entry.chosen_move)?;

        let start_time = Instant::now();
        let decision = self.bot.decide(&entry.game_id, &entry.board, you);
        let computation_time_ms = start_time.elapsed().as_millis();

        let matches = original_move == decision.direction;
        let result = ReplayResult {
            turn: entry.turn,
            original_move,
            replayed_move: decision.direction,
            original_strategy: entry.strategy.clone(),
            replayed_strategy: decision.strategy,
            matches,
            computation_time_ms,
        };

        if self.verbose {
            if matches {
                info!(
                    "Turn {}: MATCH - {} via {} (time: {}ms)",
                    entry.turn,
                    result.replayed_move.as_str(),
                    result.replayed_strategy,
                    computation_time_ms
                );
            } else {
                warn!(
                    "Turn {}: MISMATCH - Original: {} via {}, Replayed: {} via {}",
                    entry.turn,
                    original_move.as_str(),
                    entry.strategy,
                    result.replayed_move.as_str(),
                    result.replayed_strategy
                );
            }
        }

        Ok(result)
    }

    /// Drops the learned session a replayed game left behind
    fn close_game(&self, game_id: &str) {
        if self.bot.learned().sessions().end(game_id).is_some() && self.verbose {
            info!("Closed session for game {}", game_id);
        }
    }

    /// Replays all entries in a log file. Each game's session is closed as
    /// soon as the log moves on to another game.
    pub fn replay_all(&self, entries: &[LogEntry]) -> Vec<ReplayResult> {
        let mut results = Vec::new();
        let mut current: Option<&str> = None;

        for entry in entries {
            if let Some(previous) = current.filter(|id| *id != entry.game_id) {
                self.close_game(previous);
            }
            current = Some(entry.game_id.as_str());

            match self.replay_entry(entry) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Failed to replay turn {}: {}", entry.turn, e);
                }
            }
        }
        if let Some(last) = current {
            self.close_game(last);
        }

        results
    }

    /// Replays specific turns from a log file
    pub fn replay_turns(
        &self,
        entries: &[LogEntry],
        turn_numbers: &[i32],
    ) -> Result<Vec<ReplayResult>, String> {
        let mut results = Vec::new();

        for turn_num in turn_numbers {
            let entry = entries
                .iter()
                .find(|e| e.turn == *turn_num)
                .ok_or_else(|| format!("Turn {} not found in log file", turn_num))?;

            match self.replay_entry(entry) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Failed to replay turn {}: {}", turn_num, e);
                }
            }
        }

        let mut games: Vec<&str> = entries.iter().map(|e| e.game_id.as_str()).collect();
        games.dedup();
        for game_id in games {
            self.close_game(game_id);
        }

        Ok(results)
    }

    /// Generates statistics from replay results
    pub fn generate_stats(&self, results: &[ReplayResult]) -> ReplayStats {
        let total_turns = results.len();
        let matches = results.iter().filter(|r| r.matches).count();
        let mismatches = total_turns - matches;
        let match_rate = if total_turns > 0 {
            (matches as f64 / total_turns as f64) * 100.0
        } else {
            0.0
        };

        let mut per_strategy: BTreeMap<&'static str, StrategyStats> = BTreeMap::new();
        for result in results {
            let stats = per_strategy.entry(result.replayed_strategy).or_default();
            stats.turns += 1;
            if result.matches {
                stats.matches += 1;
            }
        }

        ReplayStats {
            total_turns,
            matches,
            mismatches,
            match_rate,
            per_strategy,
        }
    }

    /// Prints a detailed report of replay results
    pub fn print_report(&self, results: &[ReplayResult]) {
        let stats = self.generate_stats(results);

        println!("\n═══════════════════════════════════════════════════════════");
        println!("                    REPLAY REPORT");
        println!("═══════════════════════════════════════════════════════════");
        println!("Total Turns:    {}", stats.total_turns);
        println!("Matches:        {} ({:.1}%)", stats.matches, stats.match_rate);
        println!("Mismatches:     {}", stats.mismatches);
        println!("═══════════════════════════════════════════════════════════\n");

        if !results.is_empty() {
            let avg_time: f64 = results
                .iter()
                .map(|r| r.computation_time_ms as f64)
                .sum::<f64>()
                / results.len() as f64;
            println!("Average Computation Time:   {:.1}ms\n", avg_time);

            println!("Per strategy (replayed):");
            for (name, s) in &stats.per_strategy {
                println!("  {:<10} {:>4} / {:<4} matched", name, s.matches, s.turns);
            }
            println!();
        }

        let mismatches: Vec<_> = results.iter().filter(|r| !r.matches).collect();
        if !mismatches.is_empty() {
            println!("═══════════════════════════════════════════════════════════");
            println!("                  DETAILED MISMATCHES");
            println!("═══════════════════════════════════════════════════════════");

            for result in mismatches {
                println!(
                    "Turn {}: {} ({}) → {} ({})",
                    result.turn,
                    result.original_move.as_str(),
                    result.original_strategy,
                    result.replayed_move.as_str(),
                    result.replayed_strategy
                );
            }
            println!();
        }
    }

    /// Validates that specific expected moves were made
    pub fn validate_expected_moves(
        &self,
        entries: &[LogEntry],
        expected_moves: &[(i32, Vec<Direction>)], // (turn, acceptable_moves)
    ) -> Result<(), String> {
        for (turn, acceptable) in expected_moves {
            let entry = entries
                .iter()
                .find(|e| e.turn == *turn)
                .ok_or_else(|| format!("Turn {} not found in log", turn))?;

            let actual_move = Direction::parse(&entry.chosen_move)?;

            if !acceptable.contains(&actual_move) {
                return Err(format!(
                    "Turn {}: Expected one of {:?}, but got {}",
                    turn,
                    acceptable.iter().map(|d| d.as_str()).collect::<Vec<_>>(),
                    actual_move.as_str()
                ));
            }
        }

        Ok(())
    }
}
