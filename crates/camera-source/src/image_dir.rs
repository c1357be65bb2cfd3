use crate::{CameraBackend, CameraStream, Error, FacingMode, Frame, PixelFormat, Result, StreamId};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// Replays still images from `<root>/front/` and `<root>/rear/` as a camera.
pub struct ImageDirCamera {
    root: PathBuf,
}

impl ImageDirCamera {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::Io(format!("{}: {e}", dir.display())))? {
        let path = entry.map_err(|e| Error::Io(e.to_string()))?.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
            .unwrap_or(false);
        if is_image {
            entries.push(path);
        }
    }
    entries.sort();
    Ok(entries)
}

#[async_trait]
impl CameraBackend for ImageDirCamera {
    async fn open(&self, facing: FacingMode) -> Result<Box<dyn CameraStream>> {
        let dir = self.root.join(facing.as_str());
        if !dir.is_dir() {
            return Err(Error::NotFound(dir.display().to_string()));
        }
        let images = list_images(&dir)?;
        if images.is_empty() {
            return Err(Error::DeviceAccess {
                facing,
                reason: format!("no images in {}", dir.display()),
            });
        }
        tracing::debug!(dir = %dir.display(), count = images.len(), "image directory camera opened");
        Ok(Box::new(ImageDirStream {
            id: StreamId::new(),
            facing,
            images,
            next: 0,
            stopped: false,
        }))
    }

    fn name(&self) -> &'static str {
        "image-dir"
    }
}

struct ImageDirStream {
    id: StreamId,
    facing: FacingMode,
    images: Vec<PathBuf>,
    next: usize,
    stopped: bool,
}

impl CameraStream for ImageDirStream {
    fn id(&self) -> StreamId {
        self.id
    }

    fn facing(&self) -> FacingMode {
        self.facing
    }

    fn has_data(&self) -> bool {
        !self.stopped
    }

    fn read(&mut self) -> Result<Frame> {
        if self.stopped {
            return Err(Error::Stopped);
        }
        let path = &self.images[self.next % self.images.len()];
        self.next = self.next.wrapping_add(1);
        let rgb = image::open(path)
            .map_err(|e| Error::Backend(format!("{}: {e}", path.display())))?
            .to_rgb8();
        Ok(Frame {
            width: rgb.width(),
            height: rgb.height(),
            pixel_format: PixelFormat::Rgb8,
            data: rgb.into_raw(),
            ts: Some(OffsetDateTime::now_utc()),
        })
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}
