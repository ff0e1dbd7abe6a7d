pub type ZoomResult<T> = Result<T, ZoomError>;

#[derive(thiserror::Error, Debug)]
pub enum ZoomError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("{} frame(s) failed to render: {failed:?}", failed.len())]
    FramesFailed { failed: Vec<u64> },

    #[error("run was cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ZoomError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
