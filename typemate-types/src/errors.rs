use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Structured failure kinds for room operations, mirrored to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RoomError {
    RoomNotFound { code: String },
    GameInProgress { code: String },
    NotHost,
    InvalidRoomState { current_state: String },
    NotInRoom,
    InvalidInput { reason: String },
    RateLimitExceeded,
    Unavailable,
}
