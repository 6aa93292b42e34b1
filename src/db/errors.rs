use thiserror::Error;

#[derive(Error, Debug)]
pub enum DBError {
    #[error(transparent)]
    Relational(#[from] sea_orm::DbErr),
    #[error(transparent)]
    InMemoryError(#[from] InMemoryError),
    #[error("unknown user")]
    UnknownUser,
    #[error("email is already registered")]
    DuplicateEmail,
    #[error("store lock was poisoned")]
    LockPoisoned,
}

#[derive(Error, Debug)]
pub enum InMemoryError {
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("failed to read with serde: {0}")]
    SerdeError(#[from] serde_json::error::Error),
}
