use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Event log is closed: the game has ended")]
    LogClosed,

    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
