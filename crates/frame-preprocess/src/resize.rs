use crate::{Result, ShapeError, Tensor};
use camera_source::{Frame, PixelFormat};

pub const INPUT_HEIGHT: usize = 244;
pub const INPUT_WIDTH: usize = 244;
pub const INPUT_CHANNELS: usize = 3;

/// Source sample positions for one output axis.
struct AxisWeights {
    lower: Vec<usize>,
    upper: Vec<usize>,
    lerp: Vec<f32>,
}

fn axis_weights(in_size: usize, out_size: usize) -> AxisWeights {
    let scale = in_size as f32 / out_size as f32;
    let mut w = AxisWeights {
        lower: Vec::with_capacity(out_size),
        upper: Vec::with_capacity(out_size),
        lerp: Vec::with_capacity(out_size),
    };
    for i in 0..out_size {
        let src = i as f32 * scale;
        let floor = src.floor();
        let lower = floor as usize;
        w.lower.push(lower.min(in_size - 1));
        w.upper.push((src.ceil() as usize).min(in_size - 1));
        w.lerp.push(src - floor);
    }
    w
}

fn validate(frame: &Frame) -> Result<()> {
    if frame.width == 0 || frame.height == 0 {
        return Err(ShapeError::ZeroDimension {
            width: frame.width,
            height: frame.height,
        });
    }
    let expected = frame.expected_len();
    if frame.data.len() != expected {
        return Err(ShapeError::BufferSize {
            expected,
            actual: frame.data.len(),
        });
    }
    Ok(())
}

/// RGB value of pixel `idx`, dropping alpha and expanding gray.
#[inline]
fn rgb_at(frame: &Frame, idx: usize) -> [f32; 3] {
    let ch = frame.pixel_format.channels();
    let px = &frame.data[idx * ch..idx * ch + ch];
    match frame.pixel_format {
        PixelFormat::Rgb8 | PixelFormat::Rgba8 => [px[0] as f32, px[1] as f32, px[2] as f32],
        PixelFormat::Bgr8 => [px[2] as f32, px[1] as f32, px[0] as f32],
        PixelFormat::Gray8 => [px[0] as f32; 3],
    }
}

/// Bilinear resize to `(out_h, out_w, 3)`, returned with a leading batch dim.
pub fn resize_bilinear(frame: &Frame, out_h: usize, out_w: usize) -> Result<Tensor> {
    validate(frame)?;
    let (in_w, in_h) = (frame.width as usize, frame.height as usize);
    let ys = axis_weights(in_h, out_h);
    let xs = axis_weights(in_w, out_w);

    let mut data = Vec::with_capacity(out_h * out_w * INPUT_CHANNELS);
    for y in 0..out_h {
        let (top, bottom, dy) = (ys.lower[y] * in_w, ys.upper[y] * in_w, ys.lerp[y]);
        for x in 0..out_w {
            let (left, right, dx) = (xs.lower[x], xs.upper[x], xs.lerp[x]);
            let tl = rgb_at(frame, top + left);
            let tr = rgb_at(frame, top + right);
            let bl = rgb_at(frame, bottom + left);
            let br = rgb_at(frame, bottom + right);
            for c in 0..INPUT_CHANNELS {
                let t = tl[c] + (tr[c] - tl[c]) * dx;
                let b = bl[c] + (br[c] - bl[c]) * dx;
                data.push(t + (b - t) * dy);
            }
        }
    }
    Tensor::new([1, out_h, out_w, INPUT_CHANNELS], data)
}

/// Model input for one frame: shape `(1, 244, 244, 3)`.
pub fn to_tensor(frame: &Frame) -> Result<Tensor> {
    let tensor = resize_bilinear(frame, INPUT_HEIGHT, INPUT_WIDTH)?;
    tracing::trace!(w = frame.width, h = frame.height, "frame resized to model input");
    Ok(tensor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camera_source::{CameraBackend, CameraStream, FacingMode, MockCamera};

    fn gray(width: u32, height: u32, data: Vec<u8>) -> Frame {
        Frame {
            width,
            height,
            pixel_format: PixelFormat::Gray8,
            data,
            ts: None,
        }
    }

    async fn mock_frame(width: u32, height: u32) -> Frame {
        let cam = MockCamera::new(width, height);
        let mut stream = cam.open(FacingMode::Front).await.unwrap();
        stream.read().unwrap()
    }

    #[tokio::test]
    async fn output_shape_is_independent_of_input_resolution() {
        for (w, h) in [(1920, 1080), (320, 240), (100, 300)] {
            let t = to_tensor(&mock_frame(w, h).await).unwrap();
            assert_eq!(t.shape(), [1, 244, 244, 3]);
            assert_eq!(t.as_slice().len(), 244 * 244 * 3);
        }
    }

    #[tokio::test]
    async fn repeated_conversion_is_bit_identical() {
        let frame = mock_frame(640, 480).await;
        let a = to_tensor(&frame).unwrap();
        let b = to_tensor(&frame).unwrap();
        let bits = |t: &Tensor| t.as_slice().iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn zero_sized_frame_is_a_shape_error() {
        let err = to_tensor(&gray(0, 10, vec![])).unwrap_err();
        assert_eq!(err, ShapeError::ZeroDimension { width: 0, height: 10 });
    }

    #[test]
    fn short_buffer_is_a_shape_error() {
        let err = to_tensor(&gray(4, 4, vec![0; 15])).unwrap_err();
        assert_eq!(
            err,
            ShapeError::BufferSize {
                expected: 16,
                actual: 15
            }
        );
    }

    #[test]
    fn upsampling_interpolates_and_clamps_at_edge() {
        let t = resize_bilinear(&gray(2, 1, vec![0, 100]), 1, 4).unwrap();
        let row: Vec<f32> = (0..4).map(|x| t.get(0, 0, x, 0).unwrap()).collect();
        assert_eq!(row, vec![0.0, 50.0, 100.0, 100.0]);
    }

    #[test]
    fn values_are_not_normalized() {
        let frame = Frame {
            width: 3,
            height: 3,
            pixel_format: PixelFormat::Rgba8,
            data: [255, 128, 0, 7].repeat(9),
            ts: None,
        };
        let t = to_tensor(&frame).unwrap();
        assert_eq!(t.get(0, 100, 100, 0), Some(255.0));
        assert_eq!(t.get(0, 100, 100, 1), Some(128.0));
        assert_eq!(t.get(0, 100, 100, 2), Some(0.0));
    }

    #[test]
    fn bgr_frames_are_swizzled_to_rgb() {
        let frame = Frame {
            width: 1,
            height: 1,
            pixel_format: PixelFormat::Bgr8,
            data: vec![1, 2, 3],
            ts: None,
        };
        let t = resize_bilinear(&frame, 2, 2).unwrap();
        assert_eq!(t.get(0, 1, 1, 0), Some(3.0));
        assert_eq!(t.get(0, 1, 1, 2), Some(1.0));
    }
}
