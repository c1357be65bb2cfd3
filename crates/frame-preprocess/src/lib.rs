//! frame-preprocess: turn camera frames into model input tensors
//!
//! Resizing follows the legacy TensorFlow bilinear kernel
//! (`align_corners = false`, `half_pixel_centers = false`). Pixel values are
//! kept in `0.0..=255.0`; no normalization is applied.

mod error;
pub use error::{Result, ShapeError};

mod tensor;
pub use tensor::Tensor;

mod resize;
pub use resize::{resize_bilinear, to_tensor, INPUT_CHANNELS, INPUT_HEIGHT, INPUT_WIDTH};
