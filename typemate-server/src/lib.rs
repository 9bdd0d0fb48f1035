use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;
use warp::Filter;
use warp::http::StatusCode;

pub mod config;
pub mod progress;
pub mod room_manager;
pub mod solo;
pub mod sync;
pub mod websocket;
pub mod word_source;

use crate::progress::ProgressSynchronizer;
use crate::room_manager::{RoomManager, SessionError};
use crate::sync::ChangeFeed;
use crate::websocket::ConnectionManager;
use crate::word_source::WordSource;
use typemate_persistence::{PlayerRepository, RoomRepository};

/// Shared services wired over one database connection
#[derive(Clone)]
pub struct ServerState {
    pub connection_manager: Arc<ConnectionManager>,
    pub room_manager: Arc<RoomManager>,
    pub progress: Arc<ProgressSynchronizer>,
    pub word_source: Arc<dyn WordSource>,
}

impl ServerState {
    pub fn new(db: DatabaseConnection, word_source: Arc<dyn WordSource>, room_ttl: Duration) -> Self {
        let rooms = Arc::new(RoomRepository::new(db.clone()));
        let players = Arc::new(PlayerRepository::new(db));
        let feed = Arc::new(ChangeFeed::new());

        let room_manager = Arc::new(RoomManager::new(
            rooms.clone(),
            players.clone(),
            word_source.clone(),
            feed.clone(),
            room_ttl,
        ));
        let progress = Arc::new(ProgressSynchronizer::new(rooms, players, feed));

        Self {
            connection_manager: Arc::new(ConnectionManager::new()),
            room_manager,
            progress,
            word_source,
        }
    }

    /// Consumes the handles so the filter owns them; clone the state to keep a copy
    pub fn routes(self) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        create_routes(
            self.connection_manager,
            self.room_manager,
            self.progress,
            self.word_source,
        )
    }
}

pub fn create_routes(
    connection_manager: Arc<ConnectionManager>,
    room_manager: Arc<RoomManager>,
    progress: Arc<ProgressSynchronizer>,
    word_source: Arc<dyn WordSource>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let connection_manager_filter = warp::any().map({
        let connection_manager = connection_manager.clone();
        move || connection_manager.clone()
    });

    let room_manager_filter = warp::any().map({
        let room_manager = room_manager.clone();
        move || room_manager.clone()
    });

    let progress_filter = warp::any().map({
        let progress = progress.clone();
        move || progress.clone()
    });

    let word_source_filter = warp::any().map({
        let word_source = word_source.clone();
        move || word_source.clone()
    });

    let websocket = warp::path("ws")
        .and(warp::ws())
        .and(connection_manager_filter)
        .and(room_manager_filter.clone())
        .and(progress_filter)
        .and(word_source_filter)
        .map(
            |ws: warp::ws::Ws,
             conn_mgr,
             room_mgr,
             progress,
             word_source: Arc<dyn WordSource>| {
                ws.on_upgrade(move |socket| {
                    websocket::handle_connection(socket, conn_mgr, room_mgr, progress, word_source)
                })
            },
        );

    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", StatusCode::OK));

    let room_snapshot = warp::path!("rooms" / String)
        .and(warp::get())
        .and(room_manager_filter)
        .and_then(handle_room_snapshot_request);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET"]);

    websocket
        .or(health)
        .or(room_snapshot)
        .with(cors)
        .with(warp::log("typemate"))
}

async fn handle_room_snapshot_request(
    code: String,
    room_manager: Arc<RoomManager>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match room_manager.room_snapshot(&code).await {
        Ok(snapshot) => Ok(warp::reply::with_status(
            warp::reply::json(&snapshot),
            StatusCode::OK,
        )),
        Err(SessionError::NotFound { .. }) => Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({
                "error": "Room not found"
            })),
            StatusCode::NOT_FOUND,
        )),
        Err(err) => {
            tracing::error!("Failed to load room {}: {}", code, err);
            Ok(warp::reply::with_status(
                warp::reply::json(&serde_json::json!({
                    "error": "Failed to load room"
                })),
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}
