//! High score leaderboard
//!
//! A local top-10 persisted as JSON. The simulation never touches this;
//! the host records an entry when it sees a death event, and a failed
//! read or write degrades silently to an empty board.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::sim::DeathCause;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Rows crossed
    pub score: u32,
    /// Level reached
    pub level: u32,
    /// What ended the run
    pub cause: DeathCause,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// High score leaderboard, sorted descending by score
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u32) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u32) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a run to the leaderboard (if it qualifies).
    /// Returns the rank achieved (1-indexed) or None if it didn't qualify.
    pub fn add_score(
        &mut self,
        score: u32,
        level: u32,
        cause: DeathCause,
        timestamp: f64,
    ) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let entry = HighScoreEntry {
            score,
            level,
            cause,
            timestamp,
        };

        let pos = self.entries.iter().position(|e| score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u32> {
        self.entries.first().map(|e| e.score)
    }

    /// Load from a JSON file; any failure means an empty board
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<HighScores>(&json) {
                Ok(scores) => {
                    log::info!("Loaded {} high scores", scores.entries.len());
                    scores
                }
                Err(err) => {
                    log::warn!("High score file unreadable ({}), starting fresh", err);
                    Self::new()
                }
            },
            Err(_) => {
                log::info!("No high scores found, starting fresh");
                Self::new()
            }
        }
    }

    /// Persist to a JSON file. Failures are logged, never fatal.
    pub fn save(&self, path: &Path) {
        match serde_json::to_string(self) {
            Ok(json) => {
                if let Err(err) = std::fs::write(path, json) {
                    log::warn!("Failed to save high scores: {}", err);
                } else {
                    log::info!("High scores saved ({} entries)", self.entries.len());
                }
            }
            Err(err) => log::warn!("Failed to encode high scores: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_score_never_qualifies() {
        let scores = HighScores::new();
        assert!(!scores.qualifies(0));
        assert!(scores.qualifies(1));
    }

    #[test]
    fn test_add_keeps_descending_order() {
        let mut scores = HighScores::new();
        scores.add_score(5, 1, DeathCause::Vehicle, 0.0);
        scores.add_score(12, 1, DeathCause::Water, 1.0);
        scores.add_score(8, 1, DeathCause::Train, 2.0);

        let values: Vec<u32> = scores.entries.iter().map(|e| e.score).collect();
        assert_eq!(values, vec![12, 8, 5]);
        assert_eq!(scores.top_score(), Some(12));
    }

    #[test]
    fn test_rank_and_truncation() {
        let mut scores = HighScores::new();
        for i in 1..=MAX_HIGH_SCORES as u32 {
            scores.add_score(i * 10, 1, DeathCause::Vehicle, 0.0);
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);

        // Worse than everything on a full board
        assert_eq!(scores.add_score(1, 1, DeathCause::Water, 0.0), None);

        // Beats the lowest entry, lands at the bottom
        let rank = scores.add_score(15, 1, DeathCause::Water, 0.0);
        assert_eq!(rank, Some(MAX_HIGH_SCORES));
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);

        // New best takes rank 1
        assert_eq!(scores.add_score(999, 2, DeathCause::Train, 0.0), Some(1));
    }

    #[test]
    fn test_potential_rank_matches_insertion() {
        let mut scores = HighScores::new();
        scores.add_score(30, 1, DeathCause::Vehicle, 0.0);
        scores.add_score(20, 1, DeathCause::Vehicle, 0.0);

        assert_eq!(scores.potential_rank(25), Some(2));
        assert_eq!(scores.potential_rank(40), Some(1));
        assert_eq!(scores.potential_rank(0), None);
    }
}
