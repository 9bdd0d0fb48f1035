use typemate_types::{Player, RoomId, RoomStatus, ServerMessage};

/// Change notifications published for a room after its records are written
#[derive(Debug, Clone)]
pub enum RoomEvent {
    PlayersChanged {
        room_id: RoomId,
        players: Vec<Player>,
    },
    StatusChanged {
        room_id: RoomId,
        status: RoomStatus,
        started_at: Option<String>,
    },
}

impl RoomEvent {
    pub fn room_id(&self) -> RoomId {
        match self {
            RoomEvent::PlayersChanged { room_id, .. } => *room_id,
            RoomEvent::StatusChanged { room_id, .. } => *room_id,
        }
    }

    /// The message a subscribed client receives for this event
    pub fn to_server_message(&self) -> ServerMessage {
        match self {
            RoomEvent::PlayersChanged { room_id, players } => ServerMessage::PlayersUpdate {
                room_id: *room_id,
                players: players.clone(),
            },
            RoomEvent::StatusChanged {
                room_id,
                status,
                started_at,
            } => ServerMessage::RoomStatusChanged {
                room_id: *room_id,
                status: *status,
                started_at: started_at.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_status_event_message() {
        let room_id = Uuid::new_v4();
        let event = RoomEvent::StatusChanged {
            room_id,
            status: RoomStatus::Playing,
            started_at: Some("2024-01-01T00:00:00+00:00".to_string()),
        };

        assert_eq!(event.room_id(), room_id);
        match event.to_server_message() {
            ServerMessage::RoomStatusChanged {
                status, started_at, ..
            } => {
                assert_eq!(status, RoomStatus::Playing);
                assert!(started_at.is_some());
            }
            other => panic!("Expected RoomStatusChanged, got {:?}", other),
        }
    }

    #[test]
    fn test_players_event_message() {
        let room_id = Uuid::new_v4();
        let event = RoomEvent::PlayersChanged {
            room_id,
            players: vec![],
        };

        assert_eq!(event.room_id(), room_id);
        assert!(matches!(
            event.to_server_message(),
            ServerMessage::PlayersUpdate { players, .. } if players.is_empty()
        ));
    }
}
