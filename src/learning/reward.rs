// Per-turn reward classification
//
// Exactly one outcome applies per turn, by priority:
// death > ate (health did not drop) > low health > plain step.

use log::warn;

use crate::config::RewardConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Died,
    Ate,
    LowHealth,
    Step,
}

impl Outcome {
    /// `previous_health` and `threshold` come from the session; `died` is
    /// decided by the caller (zero health, or eliminated at game end).
    pub fn classify(current_health: i32, previous_health: i32, threshold: f64, died: bool) -> Self {
        if died || current_health <= 0 {
            Outcome::Died
        } else if current_health >= previous_health {
            Outcome::Ate
        } else if f64::from(previous_health) <= threshold {
            Outcome::LowHealth
        } else {
            Outcome::Step
        }
    }
}

impl RewardConfig {
    /// Configured reward for an outcome; non-finite values fall back to 0
    pub fn value(&self, outcome: Outcome) -> f64 {
        let r = match outcome {
            Outcome::Died => self.die,
            Outcome::Ate => self.eat_food,
            Outcome::LowHealth => self.low_health,
            Outcome::Step => self.default,
        };
        if r.is_finite() {
            r
        } else {
            warn!("Non-finite reward configured for {:?}, using 0", outcome);
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        assert_eq!(Outcome::classify(0, 100, 50.0, false), Outcome::Died);
        assert_eq!(Outcome::classify(100, 20, 50.0, true), Outcome::Died);
        assert_eq!(Outcome::classify(100, 20, 50.0, false), Outcome::Ate);
        assert_eq!(Outcome::classify(19, 20, 50.0, false), Outcome::LowHealth);
        assert_eq!(Outcome::classify(79, 80, 50.0, false), Outcome::Step);
    }

    #[test]
    fn test_rewards_are_finite() {
        let rewards = RewardConfig {
            default: -1.0,
            low_health: f64::NAN,
            die: f64::NEG_INFINITY,
            eat_food: 100.0,
        };
        assert_eq!(rewards.value(Outcome::Step), -1.0);
        assert_eq!(rewards.value(Outcome::LowHealth), 0.0);
        assert_eq!(rewards.value(Outcome::Died), 0.0);
        assert_eq!(rewards.value(Outcome::Ate), 100.0);
    }
}
