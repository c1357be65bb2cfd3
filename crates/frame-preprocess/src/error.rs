use thiserror::Error;

pub type Result<T, E = ShapeError> = core::result::Result<T, E>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("frame has zero spatial size ({width}x{height})")]
    ZeroDimension { width: u32, height: u32 },
    #[error("frame buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
    #[error("tensor shape {shape:?} does not hold {len} values")]
    TensorSize { shape: [usize; 4], len: usize },
}
