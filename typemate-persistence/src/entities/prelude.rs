pub use super::players::Entity as Players;
pub use super::rooms::Entity as Rooms;
