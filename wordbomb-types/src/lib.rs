pub mod errors;
pub mod player;
pub mod room;
pub mod round;

// Re-export all types
pub use errors::*;
pub use player::*;
pub use room::*;
pub use round::*;

pub type PlayerId = uuid::Uuid;
