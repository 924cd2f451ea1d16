use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("invalid job input: {0}")]
    InvalidInput(String),

    /// `predict` (or `save`) was called before a successful train or load.
    #[error("demand model has not been trained")]
    ModelNotTrained,

    /// A demand record is missing its book or branch identity.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("training failed: {0}")]
    TrainingFailed(String),

    /// The persisted model could not be read or written.
    #[error("model artifact error: {0}")]
    Artifact(String),
}
