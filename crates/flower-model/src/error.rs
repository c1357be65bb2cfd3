use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading model asset {path}: {reason}")]
    Io { path: String, reason: String },
    #[error("parsing model descriptor: {0}")]
    Parse(String),
    #[error("model shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("unsupported model format: {0}")]
    UnsupportedFormat(String),
    #[error("backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("input tensor shape {actual:?}, expected {expected:?}")]
    InputShape {
        expected: [usize; 4],
        actual: [usize; 4],
    },
    #[error("inference failed: {0}")]
    Backend(String),
}
