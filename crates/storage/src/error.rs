use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Review {0} not found")]
    NotFound(i64),

    #[error("A review with external id {0} already exists")]
    Duplicate(i64),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
