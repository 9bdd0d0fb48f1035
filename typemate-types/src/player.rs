use crate::{PlayerId, RoomId};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Player {
    pub id: PlayerId,
    pub room_id: RoomId,
    pub name: String,
    pub progress: u32,  // words completed correctly
    pub attempted: u32, // words submitted, correct or not
    pub wpm: u32,
    pub accuracy: u32, // percent
    pub is_host: bool,
    pub created_at: String, // ISO 8601 string
    pub last_active: String,
}
