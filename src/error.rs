use thiserror::Error;

/// Rejected submission input. Nothing is persisted when this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("please enter a username")]
    EmptyUsername,
    #[error("please enter comment content")]
    EmptyContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("no comment at index {index} (there are {len})")]
    OutOfRange { index: usize, len: usize },
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(anyhow::Error),
}

#[derive(Debug, Error)]
pub enum DeleteError {
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Store(anyhow::Error),
}
