pub mod bots;
pub mod combos;
pub mod game_events;
pub mod host_controller;
pub mod round_sync;
pub mod scoring;
pub mod solo;
pub mod word_validation;

// Re-export main components
pub use bots::*;
pub use combos::*;
pub use game_events::*;
pub use host_controller::*;
pub use round_sync::*;
pub use scoring::*;
pub use solo::*;
pub use word_validation::*;
