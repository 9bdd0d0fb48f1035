use std::time::Duration;

use crate::{ProgressStats, ScoringEngine};

/// Outcome of one word boundary in a race
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordOutcome {
    pub correct: bool,
    pub stats: ProgressStats,
}

/// Tracks a racer's position in the shared word list.
///
/// A race only advances on a correctly typed word; a miss counts as an
/// attempt and the racer retries the same word. `progress` is therefore
/// both the completed-word count and the index of the next word.
#[derive(Debug, Clone)]
pub struct RaceTracker {
    words: Vec<String>,
    progress: u32,
    attempted: u32,
}

impl RaceTracker {
    pub fn new(words: Vec<String>) -> Self {
        Self::resume(words, 0, 0)
    }

    /// Rebuild a tracker from persisted counters
    pub fn resume(words: Vec<String>, progress: u32, attempted: u32) -> Self {
        let progress = progress.min(words.len() as u32);
        Self {
            words,
            progress,
            attempted: attempted.max(progress),
        }
    }

    pub fn progress(&self) -> u32 {
        self.progress
    }

    pub fn attempted(&self) -> u32 {
        self.attempted
    }

    pub fn current_word(&self) -> Option<&str> {
        self.words.get(self.progress as usize).map(String::as_str)
    }

    pub fn is_complete(&self) -> bool {
        self.progress as usize >= self.words.len()
    }

    /// Apply the token typed before a word boundary. Returns `None` once
    /// every word has been completed.
    pub fn submit(&mut self, typed: &str, elapsed: Duration) -> Option<WordOutcome> {
        let expected = self.current_word()?;
        let correct = typed.trim() == expected;

        self.attempted += 1;
        if correct {
            self.progress += 1;
        }

        Some(WordOutcome {
            correct,
            stats: ScoringEngine::stats(self.progress, self.attempted, elapsed),
        })
    }
}
