use std::time::Duration;

use anyhow::{Result, anyhow};
use typemate_types::{SoloResult, WpmSample};

use crate::ScoringEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordStatus {
    Pending,
    Correct,
    Incorrect,
}

/// A single-player round driven by a local countdown.
///
/// Unlike a race, every word boundary advances to the next word; a miss is
/// simply marked incorrect.
#[derive(Debug, Clone)]
pub struct SoloRound {
    words: Vec<String>,
    statuses: Vec<WordStatus>,
    current_index: usize,
    duration: Duration,
    history: Vec<WpmSample>,
    result: Option<SoloResult>,
}

impl SoloRound {
    pub fn new(words: Vec<String>, duration: Duration) -> Self {
        let statuses = vec![WordStatus::Pending; words.len()];
        Self {
            words,
            statuses,
            current_index: 0,
            duration,
            history: Vec::new(),
            result: None,
        }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_active(&self) -> bool {
        self.result.is_none()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn correct_words(&self) -> u32 {
        self.statuses
            .iter()
            .filter(|status| **status == WordStatus::Correct)
            .count() as u32
    }

    pub fn status_of(&self, index: usize) -> Option<WordStatus> {
        self.statuses.get(index).copied()
    }

    pub fn history(&self) -> &[WpmSample] {
        &self.history
    }

    /// Mark the current word and move on to the next one
    pub fn submit_word(&mut self, typed: &str) -> Result<WordStatus> {
        if !self.is_active() {
            return Err(anyhow!("Round is already finished"));
        }

        let expected = self
            .words
            .get(self.current_index)
            .ok_or_else(|| anyhow!("No words left in this round"))?;

        let status = if typed.trim() == expected {
            WordStatus::Correct
        } else {
            WordStatus::Incorrect
        };

        self.statuses[self.current_index] = status;
        self.current_index += 1;
        Ok(status)
    }

    /// Record the WPM at `elapsed` into the history used for charting
    pub fn sample(&mut self, elapsed: Duration) -> Option<WpmSample> {
        if !self.is_active() {
            return None;
        }

        let sample = WpmSample {
            second: elapsed.as_secs_f64().round() as u32,
            wpm: ScoringEngine::words_per_minute(self.correct_words(), elapsed),
        };
        self.history.push(sample);
        Some(sample)
    }

    /// Freeze the round. Later calls return the same result.
    pub fn finish(&mut self, elapsed: Duration) -> SoloResult {
        if let Some(result) = &self.result {
            return result.clone();
        }

        let correct = self.correct_words();
        let attempted = self.current_index as u32;
        let result = SoloResult {
            wpm: ScoringEngine::words_per_minute(correct, elapsed),
            accuracy: ScoringEngine::accuracy_percent(correct, attempted),
            correct_words: correct,
            attempted_words: attempted,
            history: self.history.clone(),
        };

        self.result = Some(result.clone());
        result
    }
}
