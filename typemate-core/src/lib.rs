pub mod passage;
pub mod room_code;
pub mod room_events;
pub mod scoring;
pub mod solo;
pub mod typing;
pub mod validation;

// Re-export main components
pub use passage::*;
pub use room_code::*;
pub use room_events::*;
pub use scoring::*;
pub use solo::*;
pub use typing::*;
pub use validation::*;
