pub mod admin;
pub mod bots;
pub mod chat;
pub mod config;
pub mod error;
pub mod lobby;
pub mod session;
pub mod submission;

pub use admin::HostAdmin;
pub use bots::BotRunner;
pub use config::Config;
pub use error::{LobbyError, SubmitError};
pub use session::{GameSession, SessionCommand, SessionExit, SessionHandle};
pub use submission::submit_answer;
