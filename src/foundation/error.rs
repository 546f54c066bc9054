pub type ShowreelResult<T> = Result<T, ShowreelError>;

/// Errors surfaced by the orchestration layer.
///
/// Every failure here is recoverable: callers log it and fall back to "no visual effect".
#[derive(thiserror::Error, Debug)]
pub enum ShowreelError {
    #[error("target not found: {0}")]
    TargetNotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("anchor error: {0}")]
    Anchor(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ShowreelError {
    pub fn target_not_found(msg: impl Into<String>) -> Self {
        Self::TargetNotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn anchor(msg: impl Into<String>) -> Self {
        Self::Anchor(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for ShowreelError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}
