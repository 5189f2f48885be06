use thiserror::Error;

#[derive(Error, Debug)]
pub enum SoftStoreError {
    #[error("Commit rejected: {0}")]
    CommitRejected(String),

    #[error("Removal rejected: {0}")]
    RemovalRejected(String),

    #[error("Observer failed: {0}")]
    ObserverFailed(String),

    #[error("Record '{0}' has been permanently removed")]
    RecordRemoved(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

pub type Result<T> = std::result::Result<T, SoftStoreError>;
