pub mod errors;
pub mod messages;
pub mod player;
pub mod room;
pub mod stats;

pub type RoomId = uuid::Uuid;
pub type PlayerId = uuid::Uuid;

// Re-export all types
pub use errors::*;
pub use messages::*;
pub use player::*;
pub use room::*;
pub use stats::*;
