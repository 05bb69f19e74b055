//! High score tracking
//!
//! Lives for the process only. The best score rises as soon as the running
//! score passes it; whether a game set a new record is settled when the
//! game ends.

use serde::{Deserialize, Serialize};

/// Process-lifetime high score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScore {
    /// Best score seen so far, including the game in progress
    pub best: u64,
    /// Best score when the current game began
    at_game_start: u64,
}

impl HighScore {
    /// Start from the value handed over by the presentation layer
    pub fn new(initial: u64) -> Self {
        Self {
            best: initial,
            at_game_start: initial,
        }
    }

    /// Remember the record to beat for a new game
    pub fn begin_game(&mut self) {
        self.at_game_start = self.best;
    }

    /// Track a running score; true if it is a new best
    pub fn observe(&mut self, score: u64) -> bool {
        if score > self.best {
            self.best = score;
            true
        } else {
            false
        }
    }

    /// Close the game; true if it beat the record it started with
    pub fn settle(&mut self) -> bool {
        let beaten = self.best > self.at_game_start;
        self.at_game_start = self.best;
        beaten
    }
}

impl Default for HighScore {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_raises_best() {
        let mut hi = HighScore::new(20_000);
        assert!(!hi.observe(500));
        assert_eq!(hi.best, 20_000);
        assert!(hi.observe(20_100));
        assert_eq!(hi.best, 20_100);
    }

    #[test]
    fn test_settle_reports_once() {
        let mut hi = HighScore::new(100);
        hi.begin_game();
        hi.observe(150);
        assert!(hi.settle());
        hi.begin_game();
        hi.observe(120);
        assert!(!hi.settle());
    }
}
