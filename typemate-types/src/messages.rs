use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{Player, PlayerId, Room, RoomError, RoomId, RoomStatus, SoloResult};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ClientMessage {
    CreateRoom { player_name: String, duration: u32 },
    JoinRoom { code: String, player_name: String },
    StartGame,
    /// Sent at every word boundary with the token typed before it
    SubmitWord { word: String },
    FinishRound,
    LeaveRoom,
    StartSolo { duration: u32 },
    SubmitSoloWord { word: String },
    Heartbeat,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ServerMessage {
    RoomCreated { room: Room, player_id: PlayerId },
    RoomJoined { room: Room, player_id: PlayerId },
    PlayersUpdate { room_id: RoomId, players: Vec<Player> },
    RoomStatusChanged {
        room_id: RoomId,
        status: RoomStatus,
        started_at: Option<String>,
    },
    ProgressAccepted {
        correct: bool,
        progress: u32,
        wpm: u32,
        accuracy: u32,
    },
    RoomLeft,
    SoloStarted { words: Vec<String>, duration: u32 },
    SoloTick { second: u32, wpm: u32 },
    SoloFinished { result: SoloResult },
    Error { message: String, kind: Option<RoomError> },
}
