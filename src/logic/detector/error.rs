use crate::logic::features::{FeatureError, LayoutMismatchError};
use crate::logic::model::ModelError;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("persisted model incompatible with running layout: {0}")]
    LayoutMismatch(#[from] LayoutMismatchError),

    #[error("persisted model is corrupt: {0}")]
    Corrupt(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error("training batch is empty")]
    EmptyBatch,

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("failed to load model: {0}")]
    Storage(#[from] StorageError),

    /// The new state is live in memory but did not reach disk
    #[error("model updated in memory but not persisted: {0}")]
    Persist(#[source] StorageError),
}
