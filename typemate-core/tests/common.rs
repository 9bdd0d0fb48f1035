use std::time::Duration;
use typemate_core::{RaceTracker, SoloRound, tokenize};

pub const TEST_PASSAGE: &str = "the quick brown fox jumps over the lazy dog";

/// Words of the standard test passage
pub fn test_words() -> Vec<String> {
    tokenize(TEST_PASSAGE)
}

pub fn create_race_tracker() -> RaceTracker {
    RaceTracker::new(test_words())
}

pub fn create_solo_round(duration_secs: u64) -> SoloRound {
    SoloRound::new(test_words(), Duration::from_secs(duration_secs))
}

/// Type the first `count` words of the passage correctly, one per second
pub fn type_correctly(tracker: &mut RaceTracker, count: usize) {
    let words = test_words();
    for (i, word) in words.iter().take(count).enumerate() {
        tracker
            .submit(word, Duration::from_secs(i as u64 + 1))
            .expect("word should be accepted");
    }
}
