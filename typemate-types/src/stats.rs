use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One point of the per-second WPM history kept during a solo round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WpmSample {
    pub second: u32,
    pub wpm: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SoloResult {
    pub wpm: u32,
    pub accuracy: u32,
    pub correct_words: u32,
    pub attempted_words: u32,
    pub history: Vec<WpmSample>,
}
