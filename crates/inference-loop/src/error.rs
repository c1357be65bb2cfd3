use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoopError {
    #[error("inference loop has stopped")]
    Closed,
}

/// Why a single capture-and-predict cycle produced no label.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("no frame: {0}")]
    Frame(#[from] camera_source::Error),
    #[error("preprocess: {0}")]
    Shape(#[from] frame_preprocess::ShapeError),
    #[error("predict: {0}")]
    Predict(#[from] flower_model::PredictError),
    #[error("inference exceeded {0:?}")]
    Timeout(Duration),
    #[error("scores did not map to a label")]
    NoLabel,
}
