pub mod player_repository;
pub mod room_repository;

pub use player_repository::{PlayerRepository, ProgressUpdate};
pub use room_repository::RoomRepository;
