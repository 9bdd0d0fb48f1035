//! Deletes every room and player record.

use tracing::{error, info};

use typemate_persistence::connection::connect_and_migrate;
use typemate_persistence::{PlayerRepository, RoomRepository};
use typemate_server::config::Config;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let db = match connect_and_migrate(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    let players = PlayerRepository::new(db.clone());
    let rooms = RoomRepository::new(db);

    let removed_players = match players.clear_all().await {
        Ok(count) => count,
        Err(e) => {
            error!("Failed to clear players: {}", e);
            std::process::exit(1);
        }
    };

    let removed_rooms = match rooms.clear_all().await {
        Ok(count) => count,
        Err(e) => {
            error!("Failed to clear rooms: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Cleared {} rooms and {} players",
        removed_rooms, removed_players
    );
}
