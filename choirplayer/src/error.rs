//! Error types for choirplayer

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlayerError {
    /// The media element rejected a command
    #[error("Media element error: {0}")]
    Element(String),

    /// The command needs a loaded track
    #[error("No track loaded")]
    Idle,

    #[error("Playback session is shut down")]
    SessionClosed,
}

pub type Result<T> = std::result::Result<T, PlayerError>;
