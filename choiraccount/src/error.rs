//! Error types for choiraccount

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error(transparent)]
    Backend(#[from] choirbackend::Error),

    #[error("{0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, AccountError>;
