use crate::{Player, RoomId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

/// Lifecycle of a multiplayer room. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum RoomStatus {
    Waiting,
    Playing,
    Finished,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Waiting => "waiting",
            RoomStatus::Playing => "playing",
            RoomStatus::Finished => "finished",
        }
    }

    /// Whether `next` is the single legal successor of this status
    pub fn can_advance_to(&self, next: RoomStatus) -> bool {
        matches!(
            (self, next),
            (RoomStatus::Waiting, RoomStatus::Playing) | (RoomStatus::Playing, RoomStatus::Finished)
        )
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(RoomStatus::Waiting),
            "playing" => Ok(RoomStatus::Playing),
            "finished" => Ok(RoomStatus::Finished),
            other => Err(format!("Unknown room status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Room {
    pub id: RoomId,
    pub code: String,
    pub status: RoomStatus,
    pub words: Vec<String>,
    pub duration: u32,            // seconds
    pub created_at: String,       // ISO 8601 string
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
}

/// A room together with everyone currently in it
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoomSnapshot {
    pub room: Room,
    pub players: Vec<Player>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_only_moves_forward() {
        assert!(RoomStatus::Waiting.can_advance_to(RoomStatus::Playing));
        assert!(RoomStatus::Playing.can_advance_to(RoomStatus::Finished));

        assert!(!RoomStatus::Playing.can_advance_to(RoomStatus::Waiting));
        assert!(!RoomStatus::Finished.can_advance_to(RoomStatus::Waiting));
        assert!(!RoomStatus::Finished.can_advance_to(RoomStatus::Playing));
        assert!(!RoomStatus::Waiting.can_advance_to(RoomStatus::Finished));
        assert!(!RoomStatus::Waiting.can_advance_to(RoomStatus::Waiting));
    }

    #[test]
    fn test_status_string_conversion() {
        for status in [RoomStatus::Waiting, RoomStatus::Playing, RoomStatus::Finished] {
            assert_eq!(status.as_str().parse::<RoomStatus>().unwrap(), status);
        }
        assert!("starting".parse::<RoomStatus>().is_err());
    }
}
