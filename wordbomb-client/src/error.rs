use thiserror::Error;
use wordbomb_core::Verdict;
use wordbomb_types::StoreError;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("not accepting answers right now")]
    NotAcceptingAnswers,
    #[error("already answered this round")]
    AlreadyAnswered,
    #[error("spectators cannot answer")]
    Spectator,
    #[error("{}", .0.message)]
    Rejected(Verdict),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("session closed")]
    SessionClosed,
}

#[derive(Debug, Error)]
pub enum LobbyError {
    #[error("only the host can start the game")]
    NotHost,
    #[error("Need at least 2 players to start")]
    NotEnoughPlayers { count: usize },
    #[error("{count} player(s) still in waiting area")]
    UnassignedPlayers { count: usize },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
