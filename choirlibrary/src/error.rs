//! Error types for choirlibrary

/// Errors reported by the media library
///
/// Backend failures are flattened to their message: the library reports
/// them to the user and never inspects them further.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LibraryError {
    /// Input rejected before any backend call
    #[error("{0}")]
    Validation(String),

    #[error("Failed to load content: {0}")]
    Fetch(String),

    #[error("Failed to upload content: {0}")]
    Upload(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Failed to save content: {0}")]
    Persistence(String),

    /// Another operation on the same item has not completed yet
    #[error("An operation is already running for item {0}")]
    InFlight(String),

    /// The controller was disposed while the operation was running
    #[error("Library disposed")]
    Disposed,
}

/// Result type for choirlibrary
pub type Result<T> = std::result::Result<T, LibraryError>;
