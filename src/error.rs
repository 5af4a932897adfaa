use thiserror::Error;

pub type Result<T> = std::result::Result<T, LearningError>;

#[derive(Debug, Error)]
pub enum LearningError {
    /// The learning store could not be opened, read or written. Matching can
    /// still fall back to the in-memory index.
    #[error("learning store unavailable: {0:#}")]
    StoreUnavailable(anyhow::Error),

    #[error("settings error: {0:#}")]
    Settings(anyhow::Error),

    #[error("invalid matcher configuration: {0}")]
    InvalidConfig(String),
}

impl LearningError {
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, LearningError::StoreUnavailable(_))
    }
}

/// Tag store-layer failures at the public API boundary.
pub(crate) trait StoreResultExt<T> {
    fn store(self) -> Result<T>;
}

impl<T> StoreResultExt<T> for anyhow::Result<T> {
    fn store(self) -> Result<T> {
        self.map_err(LearningError::StoreUnavailable)
    }
}
