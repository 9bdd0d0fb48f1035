use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

use crate::progress::{ProgressSynchronizer, RaceSeat};
use crate::room_manager::{RoomManager, SessionError};
use crate::solo::SoloDriver;
use crate::websocket::connection::{ConnectionId, ConnectionManager};
use crate::word_source::WordSource;
use typemate_core::{SoloRound, validate_duration};
use typemate_types::{ClientMessage, Player, Room, RoomError, RoomId, RoomStatus, ServerMessage};

/// What one connection is currently doing
#[derive(Default)]
struct SessionState {
    seat: Option<RaceSeat>,
    subscription: Option<AbortHandle>,
    solo: Option<SoloDriver>,
}

#[derive(Clone)]
pub struct MessageHandler {
    connection_id: ConnectionId,
    connection_manager: Arc<ConnectionManager>,
    room_manager: Arc<RoomManager>,
    progress: Arc<ProgressSynchronizer>,
    word_source: Arc<dyn WordSource>,
    state: Arc<Mutex<SessionState>>,
}

impl MessageHandler {
    pub fn new(
        connection_id: ConnectionId,
        connection_manager: Arc<ConnectionManager>,
        room_manager: Arc<RoomManager>,
        progress: Arc<ProgressSynchronizer>,
        word_source: Arc<dyn WordSource>,
    ) -> Self {
        Self {
            connection_id,
            connection_manager,
            room_manager,
            progress,
            word_source,
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    /// Dispatch one client message. Room errors are reported to the client;
    /// only a closed outbound channel is returned as an error.
    pub async fn handle_message(&self, message: ClientMessage) -> Result<(), String> {
        self.connection_manager
            .update_activity(self.connection_id)
            .await;

        let result = match message {
            ClientMessage::CreateRoom {
                player_name,
                duration,
            } => self.handle_create_room(&player_name, duration).await,
            ClientMessage::JoinRoom { code, player_name } => {
                self.handle_join_room(&code, &player_name).await
            }
            ClientMessage::StartGame => self.handle_start_game().await,
            ClientMessage::SubmitWord { word } => self.handle_submit_word(&word).await,
            ClientMessage::FinishRound => self.handle_finish_round().await,
            ClientMessage::LeaveRoom => self.handle_leave_room().await,
            ClientMessage::StartSolo { duration } => self.handle_start_solo(duration).await,
            ClientMessage::SubmitSoloWord { word } => self.handle_submit_solo_word(&word).await,
            ClientMessage::Heartbeat => Ok(()),
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) => self.send_session_error(e).await,
        }
    }

    pub async fn handle_disconnect(&self) {
        info!("Handling disconnect for connection {}", self.connection_id);

        let mut state = self.state.lock().await;
        if let Some(solo) = state.solo.take() {
            solo.stop();
        }

        if let Err(e) = self.release_seat(&mut state).await {
            error!(
                "Failed to remove player for connection {}: {}",
                self.connection_id, e
            );
        }
    }

    async fn handle_create_room(&self, player_name: &str, duration: u32) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        self.release_seat(&mut state).await?;

        let created = self.room_manager.create_room(player_name, duration).await?;
        self.take_seat(&mut state, &created.room, &created.player);

        self.send(ServerMessage::RoomCreated {
            room: created.room.clone(),
            player_id: created.player.id,
        })
        .await;
        self.send_players(&created.room).await
    }

    async fn handle_join_room(&self, code: &str, player_name: &str) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        self.release_seat(&mut state).await?;

        let joined = self.room_manager.join_room(code, player_name).await?;
        self.take_seat(&mut state, &joined.room, &joined.player);

        self.send(ServerMessage::RoomJoined {
            room: joined.room.clone(),
            player_id: joined.player.id,
        })
        .await;
        self.send_players(&joined.room).await
    }

    async fn handle_start_game(&self) -> Result<(), SessionError> {
        let (room_id, player_id) = {
            let state = self.state.lock().await;
            let seat = state.seat.as_ref().ok_or(SessionError::NotInRoom)?;
            (seat.room_id, seat.player_id)
        };

        let room = self.room_manager.start_game(room_id, player_id).await?;
        self.room_manager
            .arm_round_deadline(room.id, Duration::from_secs(u64::from(room.duration)));
        Ok(())
    }

    async fn handle_submit_word(&self, word: &str) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        let seat = state.seat.as_mut().ok_or(SessionError::NotInRoom)?;

        let outcome = self.progress.record_word(seat, word).await?;
        self.send(ServerMessage::ProgressAccepted {
            correct: outcome.correct,
            progress: outcome.stats.progress,
            wpm: outcome.stats.wpm,
            accuracy: outcome.stats.accuracy,
        })
        .await;
        Ok(())
    }

    async fn handle_finish_round(&self) -> Result<(), SessionError> {
        let room_id = {
            let state = self.state.lock().await;
            state.seat.as_ref().ok_or(SessionError::NotInRoom)?.room_id
        };

        match self.room_manager.finish_round(room_id).await {
            Ok(_) => Ok(()),
            // Every racer's timer fires; only the first one ends the round.
            Err(SessionError::InvalidState {
                current: RoomStatus::Finished,
                ..
            }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn handle_leave_room(&self) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        if !self.release_seat(&mut state).await? {
            return Err(SessionError::NotInRoom);
        }
        self.send(ServerMessage::RoomLeft).await;
        Ok(())
    }

    async fn handle_start_solo(&self, duration: u32) -> Result<(), SessionError> {
        let duration = validate_duration(duration).map_err(SessionError::InvalidInput)?;
        let words = self
            .word_source
            .generate_words()
            .await
            .map_err(SessionError::WordSource)?;

        let mut state = self.state.lock().await;
        if let Some(previous) = state.solo.take() {
            previous.stop();
        }

        self.send(ServerMessage::SoloStarted {
            words: words.clone(),
            duration,
        })
        .await;

        let round = SoloRound::new(words, Duration::from_secs(u64::from(duration)));
        state.solo = Some(SoloDriver::start(
            round,
            self.connection_id,
            self.connection_manager.clone(),
        ));
        info!("Solo round of {}s started for {}", duration, self.connection_id);
        Ok(())
    }

    async fn handle_submit_solo_word(&self, word: &str) -> Result<(), SessionError> {
        let state = self.state.lock().await;
        let solo = state
            .solo
            .as_ref()
            .ok_or_else(|| SessionError::InvalidInput("No solo round in progress".to_string()))?;

        let status = solo
            .submit_word(word)
            .await
            .map_err(|e| SessionError::InvalidInput(e.to_string()))?;
        debug!("Solo word for {}: {:?}", self.connection_id, status);
        Ok(())
    }

    fn take_seat(&self, state: &mut SessionState, room: &Room, player: &Player) {
        state.subscription = Some(self.spawn_room_forwarder(room.id));
        state.seat = Some(RaceSeat::new(room, player));
    }

    /// Leave the current room, if any. Returns whether there was one.
    async fn release_seat(&self, state: &mut SessionState) -> Result<bool, SessionError> {
        if let Some(subscription) = state.subscription.take() {
            subscription.abort();
        }

        let Some(seat) = state.seat.take() else {
            return Ok(false);
        };

        match self
            .room_manager
            .leave_room(seat.room_id, seat.player_id)
            .await
        {
            // Already purged with its room
            Ok(()) | Err(SessionError::NotInRoom) => Ok(true),
            Err(e) => Err(e),
        }
    }

    /// Forward the room's change feed to this connection
    fn spawn_room_forwarder(&self, room_id: RoomId) -> AbortHandle {
        let mut receiver = self.room_manager.feed().subscribe(room_id);
        let connection_manager = self.connection_manager.clone();
        let connection_id = self.connection_id;

        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        if connection_manager
                            .send_to_connection(connection_id, event.to_server_message())
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(
                            "Connection {} skipped {} updates for room {}",
                            connection_id, skipped, room_id
                        );
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
        .abort_handle()
    }

    /// Current standings, sent directly because the join itself was
    /// published before this connection subscribed
    async fn send_players(&self, room: &Room) -> Result<(), SessionError> {
        let players = self.room_manager.players_in_room(room.id).await?;
        self.send(ServerMessage::PlayersUpdate {
            room_id: room.id,
            players,
        })
        .await;
        Ok(())
    }

    async fn send(&self, message: ServerMessage) {
        if let Err(e) = self.send_message(message).await {
            debug!("Dropping message for {}: {}", self.connection_id, e);
        }
    }

    async fn send_message(&self, message: ServerMessage) -> Result<(), String> {
        self.connection_manager
            .send_to_connection(self.connection_id, message)
            .await
    }

    pub async fn send_error(&self, message: &str, kind: Option<RoomError>) -> Result<(), String> {
        self.send_message(ServerMessage::Error {
            message: message.to_string(),
            kind,
        })
        .await
    }

    async fn send_session_error(&self, err: SessionError) -> Result<(), String> {
        match &err {
            SessionError::Storage(_) | SessionError::WordSource(_) => {
                error!("Request from {} failed: {}", self.connection_id, err)
            }
            _ => warn!("Request from {} rejected: {}", self.connection_id, err),
        }

        self.send_error(&err.to_string(), err.to_room_error()).await
    }
}
