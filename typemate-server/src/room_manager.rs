use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::progress::elapsed_since;
use crate::sync::ChangeFeed;
use crate::word_source::WordSource;
use typemate_core::{
    RoomEvent, ScoringEngine, generate_room_code, is_valid_room_code, normalize_room_code,
    validate_duration, validate_player_name,
};
use typemate_persistence::{PlayerRepository, RoomRepository};
use typemate_types::{Player, PlayerId, Room, RoomError, RoomId, RoomSnapshot, RoomStatus};

const MAX_CODE_ATTEMPTS: usize = 8;

/// How early a client timer may end a round, to absorb clock skew and latency
const FINISH_TOLERANCE: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Room not found")]
    NotFound { code: String },
    #[error("Game already in progress")]
    InProgress { code: String },
    #[error("Only the host can start the game")]
    NotHost,
    #[error("Room is {current}, cannot {action}")]
    InvalidState {
        current: RoomStatus,
        action: &'static str,
    },
    #[error("Player is not in this room")]
    NotInRoom,
    #[error("{0}")]
    InvalidInput(String),
    #[error("Failed to generate words: {0}")]
    WordSource(anyhow::Error),
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl SessionError {
    /// Structured kind sent alongside the message, when the client can act on it
    pub fn to_room_error(&self) -> Option<RoomError> {
        match self {
            SessionError::NotFound { code } => Some(RoomError::RoomNotFound { code: code.clone() }),
            SessionError::InProgress { code } => {
                Some(RoomError::GameInProgress { code: code.clone() })
            }
            SessionError::NotHost => Some(RoomError::NotHost),
            SessionError::InvalidState { current, .. } => Some(RoomError::InvalidRoomState {
                current_state: current.to_string(),
            }),
            SessionError::NotInRoom => Some(RoomError::NotInRoom),
            SessionError::InvalidInput(reason) => Some(RoomError::InvalidInput {
                reason: reason.clone(),
            }),
            SessionError::WordSource(_) | SessionError::Storage(_) => Some(RoomError::Unavailable),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreatedRoom {
    pub room: Room,
    pub player: Player,
}

#[derive(Debug, Clone)]
pub struct JoinedRoom {
    pub room: Room,
    pub player: Player,
}

/// Owns the room lifecycle: `waiting -> playing -> finished`.
///
/// Every write that other players must see is followed by a publish on the
/// room's change feed.
pub struct RoomManager {
    rooms: Arc<RoomRepository>,
    players: Arc<PlayerRepository>,
    word_source: Arc<dyn WordSource>,
    feed: Arc<ChangeFeed>,
    room_ttl: Duration,
}

impl RoomManager {
    pub fn new(
        rooms: Arc<RoomRepository>,
        players: Arc<PlayerRepository>,
        word_source: Arc<dyn WordSource>,
        feed: Arc<ChangeFeed>,
        room_ttl: Duration,
    ) -> Self {
        Self {
            rooms,
            players,
            word_source,
            feed,
            room_ttl,
        }
    }

    pub fn feed(&self) -> &Arc<ChangeFeed> {
        &self.feed
    }

    pub async fn create_room(
        &self,
        player_name: &str,
        duration: u32,
    ) -> Result<CreatedRoom, SessionError> {
        let name = validate_player_name(player_name).map_err(SessionError::InvalidInput)?;
        let duration = validate_duration(duration).map_err(SessionError::InvalidInput)?;

        let code = self.fresh_code().await?;
        let words = self
            .word_source
            .generate_words()
            .await
            .map_err(SessionError::WordSource)?;

        let room = self.rooms.create_room(&code, &words, duration).await?;
        // A failure here leaves an empty room behind; the retention purge removes it.
        let player = self.players.create_player(room.id, &name, true).await?;

        info!(
            "Room {} ({}) created by {} with {} words, {}s",
            room.code,
            room.id,
            player.name,
            room.words.len(),
            room.duration
        );
        self.publish_players(room.id).await;

        Ok(CreatedRoom { room, player })
    }

    async fn fresh_code(&self) -> Result<String, SessionError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_room_code();
            if !self.rooms.code_exists(&code).await? {
                return Ok(code);
            }
            warn!("Room code {} already taken, regenerating", code);
        }

        Err(SessionError::Storage(anyhow::anyhow!(
            "No free room code after {} attempts",
            MAX_CODE_ATTEMPTS
        )))
    }

    pub async fn join_room(&self, code: &str, player_name: &str) -> Result<JoinedRoom, SessionError> {
        let name = validate_player_name(player_name).map_err(SessionError::InvalidInput)?;
        let room = self.room_by_code(code).await?;

        if room.status != RoomStatus::Waiting {
            warn!("{} tried to join room {} while {}", name, room.code, room.status);
            return Err(SessionError::InProgress { code: room.code });
        }

        let player = self.players.create_player(room.id, &name, false).await?;
        info!("{} joined room {}", player.name, room.code);
        self.publish_players(room.id).await;

        Ok(JoinedRoom { room, player })
    }

    /// Host-only `waiting -> playing`. Exactly one concurrent caller wins.
    pub async fn start_game(&self, room_id: RoomId, player_id: PlayerId) -> Result<Room, SessionError> {
        let player = self.member(room_id, player_id).await?;
        if !player.is_host {
            warn!("Non-host {} tried to start room {}", player.name, room_id);
            return Err(SessionError::NotHost);
        }

        let room = self.find_room(room_id).await?;
        if !room.status.can_advance_to(RoomStatus::Playing) {
            return Err(SessionError::InvalidState {
                current: room.status,
                action: "start",
            });
        }

        // Concurrent starts all pass the check above; the conditional update picks one
        match self.rooms.mark_started(room_id).await? {
            Some(room) => {
                info!("Room {} is now playing", room.code);
                self.publish_status(&room);
                Ok(room)
            }
            None => Err(self.transition_error(room_id, "start").await),
        }
    }

    /// `playing -> finished` on a client's timer. Refused while the round
    /// still has more than `FINISH_TOLERANCE` left to run.
    pub async fn finish_round(&self, room_id: RoomId) -> Result<Room, SessionError> {
        let room = self.find_room(room_id).await?;
        if !room.status.can_advance_to(RoomStatus::Finished) {
            return Err(SessionError::InvalidState {
                current: room.status,
                action: "finish",
            });
        }

        let elapsed = elapsed_since(room.started_at.as_deref());
        let duration = Duration::from_secs(u64::from(room.duration));
        if elapsed + FINISH_TOLERANCE < duration {
            warn!(
                "Early finish for room {} after {}s of {}s",
                room.code,
                elapsed.as_secs(),
                room.duration
            );
            return Err(SessionError::InvalidState {
                current: room.status,
                action: "finish before the round time is up",
            });
        }

        self.expire_round(room_id).await
    }

    /// `playing -> finished` unconditionally on time. Used by the server deadline.
    pub async fn expire_round(&self, room_id: RoomId) -> Result<Room, SessionError> {
        match self.rooms.mark_finished(room_id).await? {
            Some(room) => {
                info!("Room {} finished", room.code);
                self.publish_status(&room);
                self.publish_standings(&room).await;
                Ok(room)
            }
            None => Err(self.transition_error(room_id, "finish").await),
        }
    }

    /// End the round after its duration unless a client already did.
    pub fn arm_round_deadline(self: &Arc<Self>, room_id: RoomId, duration: Duration) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            match manager.expire_round(room_id).await {
                Ok(_) => info!("Round deadline reached for room {}", room_id),
                Err(SessionError::InvalidState { .. }) | Err(SessionError::NotFound { .. }) => {}
                Err(e) => error!("Failed to finish room {} at deadline: {}", room_id, e),
            }
        })
    }

    /// Remove the caller's player record. The host flag is not reassigned
    /// and the room stays until it expires.
    pub async fn leave_room(&self, room_id: RoomId, player_id: PlayerId) -> Result<(), SessionError> {
        self.member(room_id, player_id).await?;

        if !self.players.delete_player(player_id).await? {
            return Err(SessionError::NotInRoom);
        }

        info!("Player {} left room {}", player_id, room_id);
        self.publish_players(room_id).await;
        Ok(())
    }

    pub async fn room_snapshot(&self, code: &str) -> Result<RoomSnapshot, SessionError> {
        let room = self.room_by_code(code).await?;
        let players = self.standings(&room).await?;

        Ok(RoomSnapshot { room, players })
    }

    /// Look a room up by a user-typed code. Malformed codes never reach the store.
    async fn room_by_code(&self, code: &str) -> Result<Room, SessionError> {
        let code = normalize_room_code(code);
        if !is_valid_room_code(&code) {
            return Err(SessionError::NotFound { code });
        }

        self.rooms
            .find_by_code(&code)
            .await?
            .ok_or(SessionError::NotFound { code })
    }

    /// Players in join order, or ranked by WPM once the round is over
    async fn standings(&self, room: &Room) -> Result<Vec<Player>, SessionError> {
        let mut players = self.players.find_by_room(room.id).await?;
        if room.status == RoomStatus::Finished {
            ScoringEngine::rank_by_wpm(&mut players);
        }
        Ok(players)
    }

    pub async fn find_room(&self, room_id: RoomId) -> Result<Room, SessionError> {
        self.rooms
            .find_by_id(room_id)
            .await?
            .ok_or_else(|| SessionError::NotFound {
                code: room_id.to_string(),
            })
    }

    pub async fn players_in_room(&self, room_id: RoomId) -> Result<Vec<Player>, SessionError> {
        Ok(self.players.find_by_room(room_id).await?)
    }

    /// Delete rooms and players older than the retention window
    pub async fn purge_expired(&self) -> Result<(u64, u64), SessionError> {
        let ttl = chrono::Duration::from_std(self.room_ttl)
            .map_err(|e| anyhow::anyhow!("Retention window out of range: {}", e))?;
        let cutoff = Utc::now() - ttl;

        let players = self.players.purge_created_before(cutoff).await?;
        let rooms = self.rooms.purge_created_before(cutoff).await?;
        let channels = self.feed.prune();

        if rooms > 0 || players > 0 {
            info!(
                "Purged {} expired rooms, {} players, {} idle channels",
                rooms, players, channels
            );
        }

        Ok((rooms, players))
    }

    async fn member(&self, room_id: RoomId, player_id: PlayerId) -> Result<Player, SessionError> {
        self.players
            .find_by_id(player_id)
            .await?
            .filter(|player| player.room_id == room_id)
            .ok_or(SessionError::NotInRoom)
    }

    async fn transition_error(&self, room_id: RoomId, action: &'static str) -> SessionError {
        match self.find_room(room_id).await {
            Ok(room) => {
                warn!("Cannot {} room {} while {}", action, room.code, room.status);
                SessionError::InvalidState {
                    current: room.status,
                    action,
                }
            }
            Err(e) => e,
        }
    }

    fn publish_status(&self, room: &Room) {
        self.feed.publish(RoomEvent::StatusChanged {
            room_id: room.id,
            status: room.status,
            started_at: room.started_at.clone(),
        });
    }

    async fn publish_standings(&self, room: &Room) {
        match self.standings(room).await {
            Ok(players) => {
                self.feed.publish(RoomEvent::PlayersChanged {
                    room_id: room.id,
                    players,
                });
            }
            Err(e) => error!("Failed to load standings for room {}: {}", room.code, e),
        }
    }

    async fn publish_players(&self, room_id: RoomId) {
        match self.players.find_by_room(room_id).await {
            Ok(players) => {
                self.feed.publish(RoomEvent::PlayersChanged { room_id, players });
            }
            Err(e) => error!("Failed to load players for room {}: {}", room_id, e),
        }
    }
}
