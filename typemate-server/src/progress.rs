use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::room_manager::SessionError;
use crate::sync::ChangeFeed;
use typemate_core::{RaceTracker, RoomEvent, WordOutcome};
use typemate_persistence::{PlayerRepository, ProgressUpdate, RoomRepository};
use typemate_types::{Player, PlayerId, Room, RoomId, RoomStatus};

/// A connection's place in a multiplayer room
#[derive(Debug, Clone)]
pub struct RaceSeat {
    pub room_id: RoomId,
    pub room_code: String,
    pub player_id: PlayerId,
    pub is_host: bool,
    pub duration: u32,
    tracker: RaceTracker,
}

impl RaceSeat {
    pub fn new(room: &Room, player: &Player) -> Self {
        Self {
            room_id: room.id,
            room_code: room.code.clone(),
            player_id: player.id,
            is_host: player.is_host,
            duration: room.duration,
            tracker: RaceTracker::resume(room.words.clone(), player.progress, player.attempted),
        }
    }

    pub fn progress(&self) -> u32 {
        self.tracker.progress()
    }

    pub fn attempted(&self) -> u32 {
        self.tracker.attempted()
    }
}

/// Scores completed words and fans the new standings out to the room
pub struct ProgressSynchronizer {
    rooms: Arc<RoomRepository>,
    players: Arc<PlayerRepository>,
    feed: Arc<ChangeFeed>,
}

impl ProgressSynchronizer {
    pub fn new(
        rooms: Arc<RoomRepository>,
        players: Arc<PlayerRepository>,
        feed: Arc<ChangeFeed>,
    ) -> Self {
        Self {
            rooms,
            players,
            feed,
        }
    }

    pub async fn record_word(
        &self,
        seat: &mut RaceSeat,
        typed: &str,
    ) -> Result<WordOutcome, SessionError> {
        let room = self
            .rooms
            .find_by_id(seat.room_id)
            .await?
            .ok_or_else(|| SessionError::NotFound {
                code: seat.room_code.clone(),
            })?;

        if room.status != RoomStatus::Playing {
            return Err(SessionError::InvalidState {
                current: room.status,
                action: "submit words",
            });
        }

        let elapsed = elapsed_since(room.started_at.as_deref());
        let outcome = seat.tracker.submit(typed, elapsed).ok_or_else(|| {
            SessionError::InvalidInput("All words are already completed".to_string())
        })?;

        let update = ProgressUpdate {
            progress: outcome.stats.progress,
            attempted: outcome.stats.attempted,
            wpm: outcome.stats.wpm,
            accuracy: outcome.stats.accuracy,
        };

        if !self.players.update_progress(seat.player_id, update).await? {
            warn!(
                "Progress write for player {} in room {} was not applied",
                seat.player_id, seat.room_code
            );
        }

        debug!(
            "Player {} in room {}: correct={} progress={} wpm={} accuracy={}",
            seat.player_id,
            seat.room_code,
            outcome.correct,
            update.progress,
            update.wpm,
            update.accuracy
        );

        let players = self.players.find_by_room(seat.room_id).await?;
        self.feed.publish(RoomEvent::PlayersChanged {
            room_id: seat.room_id,
            players,
        });

        Ok(outcome)
    }
}

/// Time since the round started; zero when the start stamp is missing or in the future
pub(crate) fn elapsed_since(started_at: Option<&str>) -> Duration {
    started_at
        .and_then(|stamp| DateTime::parse_from_rfc3339(stamp).ok())
        .and_then(|start| (Utc::now() - start.with_timezone(&Utc)).to_std().ok())
        .unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_since() {
        assert_eq!(elapsed_since(None), Duration::ZERO);
        assert_eq!(elapsed_since(Some("not a date")), Duration::ZERO);

        let future = (Utc::now() + chrono::Duration::minutes(5)).to_rfc3339();
        assert_eq!(elapsed_since(Some(&future)), Duration::ZERO);

        let past = (Utc::now() - chrono::Duration::seconds(30)).to_rfc3339();
        let elapsed = elapsed_since(Some(&past));
        assert!(elapsed >= Duration::from_secs(30));
        assert!(elapsed < Duration::from_secs(40));
    }
}
