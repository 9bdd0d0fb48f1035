use std::time::Duration;

use typemate_types::Player;

/// Live statistics for one player at a word boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressStats {
    pub progress: u32,
    pub attempted: u32,
    pub wpm: u32,
    pub accuracy: u32,
}

pub struct ScoringEngine;

impl ScoringEngine {
    /// Words per minute: completed words over elapsed minutes, rounded.
    /// Zero elapsed time yields 0 rather than dividing by zero.
    pub fn words_per_minute(completed: u32, elapsed: Duration) -> u32 {
        let minutes = elapsed.as_secs_f64() / 60.0;
        if minutes <= 0.0 {
            return 0;
        }

        (completed as f64 / minutes).round() as u32
    }

    /// Accuracy as a rounded percentage of attempted words that were correct
    pub fn accuracy_percent(correct: u32, attempted: u32) -> u32 {
        if attempted == 0 {
            return 0;
        }

        (100.0 * correct as f64 / attempted as f64).round() as u32
    }

    pub fn stats(correct: u32, attempted: u32, elapsed: Duration) -> ProgressStats {
        ProgressStats {
            progress: correct,
            attempted,
            wpm: Self::words_per_minute(correct, elapsed),
            accuracy: Self::accuracy_percent(correct, attempted),
        }
    }

    /// Results order: highest WPM first, then most words completed.
    /// Ties keep their current (join) order.
    pub fn rank_by_wpm(players: &mut [Player]) {
        players.sort_by(|a, b| b.wpm.cmp(&a.wpm).then(b.progress.cmp(&a.progress)));
    }
}
