use crate::{Result, ShapeError};

/// Dense f32 tensor in NHWC layout.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    shape: [usize; 4],
    data: Vec<f32>,
}

impl Tensor {
    pub fn new(shape: [usize; 4], data: Vec<f32>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(ShapeError::TensorSize {
                shape,
                len: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// `(batch, height, width, channels)`
    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Value at `(n, y, x, c)`, if in bounds.
    pub fn get(&self, n: usize, y: usize, x: usize, c: usize) -> Option<f32> {
        let [bn, h, w, ch] = self.shape;
        if n >= bn || y >= h || x >= w || c >= ch {
            return None;
        }
        self.data.get(((n * h + y) * w + x) * ch + c).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_length() {
        let err = Tensor::new([1, 2, 2, 3], vec![0.0; 11]).unwrap_err();
        assert_eq!(
            err,
            ShapeError::TensorSize {
                shape: [1, 2, 2, 3],
                len: 11
            }
        );
    }

    #[test]
    fn nhwc_indexing() {
        let data: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let t = Tensor::new([1, 2, 2, 3], data).unwrap();
        assert_eq!(t.get(0, 0, 0, 0), Some(0.0));
        assert_eq!(t.get(0, 0, 1, 2), Some(5.0));
        assert_eq!(t.get(0, 1, 0, 1), Some(7.0));
        assert_eq!(t.get(0, 2, 0, 0), None);
    }
}
