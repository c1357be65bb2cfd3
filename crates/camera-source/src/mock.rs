use crate::{CameraBackend, CameraStream, Error, FacingMode, Frame, PixelFormat, Result, StreamId};
use async_trait::async_trait;
use std::cell::Cell;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;

/// Shared record of which mock handles are currently open.
#[derive(Clone, Debug, Default)]
pub struct HandleLedger {
    inner: Arc<Mutex<LedgerState>>,
}

#[derive(Debug, Default)]
struct LedgerState {
    live: Vec<StreamId>,
    opened: usize,
}

impl HandleLedger {
    pub fn live_count(&self) -> usize {
        self.inner.lock().map(|s| s.live.len()).unwrap_or(0)
    }

    pub fn live_ids(&self) -> Vec<StreamId> {
        self.inner.lock().map(|s| s.live.clone()).unwrap_or_default()
    }

    pub fn total_opened(&self) -> usize {
        self.inner.lock().map(|s| s.opened).unwrap_or(0)
    }

    fn open(&self, id: StreamId) {
        if let Ok(mut s) = self.inner.lock() {
            s.live.push(id);
            s.opened += 1;
        }
    }

    fn close(&self, id: StreamId) {
        if let Ok(mut s) = self.inner.lock() {
            s.live.retain(|live| *live != id);
        }
    }
}

/// Facing modes the mock currently refuses. Clones share one set, so a test
/// can revoke access after the camera has been handed to a `CameraSource`.
#[derive(Clone, Debug, Default)]
pub struct AccessSwitch {
    denied: Arc<Mutex<HashSet<FacingMode>>>,
}

impl AccessSwitch {
    pub fn deny(&self, facing: FacingMode) {
        if let Ok(mut denied) = self.denied.lock() {
            denied.insert(facing);
        }
    }

    pub fn allow(&self, facing: FacingMode) {
        if let Ok(mut denied) = self.denied.lock() {
            denied.remove(&facing);
        }
    }

    pub fn is_denied(&self, facing: FacingMode) -> bool {
        self.denied.lock().map(|d| d.contains(&facing)).unwrap_or(false)
    }
}

/// In-process camera producing synthetic gradient frames.
pub struct MockCamera {
    width: u32,
    height: u32,
    access: AccessSwitch,
    warmup_polls: u32,
    ledger: HandleLedger,
}

impl MockCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            access: AccessSwitch::default(),
            warmup_polls: 0,
            ledger: HandleLedger::default(),
        }
    }

    /// Refuse access to `facing`, as a denied permission prompt would.
    pub fn deny(self, facing: FacingMode) -> Self {
        self.access.deny(facing);
        self
    }

    /// Handle for changing access while the camera is in use.
    pub fn access(&self) -> AccessSwitch {
        self.access.clone()
    }

    /// Number of `has_data` polls that report "no data" on every new stream.
    pub fn with_warmup(mut self, polls: u32) -> Self {
        self.warmup_polls = polls;
        self
    }

    pub fn ledger(&self) -> HandleLedger {
        self.ledger.clone()
    }
}

#[async_trait]
impl CameraBackend for MockCamera {
    async fn open(&self, facing: FacingMode) -> Result<Box<dyn CameraStream>> {
        if self.access.is_denied(facing) {
            return Err(Error::DeviceAccess {
                facing,
                reason: "permission denied".to_string(),
            });
        }
        let id = StreamId::new();
        self.ledger.open(id);
        tracing::debug!(stream = %id, facing = %facing, "mock camera opened");
        Ok(Box::new(MockStream {
            id,
            facing,
            width: self.width,
            height: self.height,
            warmup_left: Cell::new(self.warmup_polls),
            counter: 0,
            stopped: false,
            ledger: self.ledger.clone(),
        }))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

struct MockStream {
    id: StreamId,
    facing: FacingMode,
    width: u32,
    height: u32,
    warmup_left: Cell<u32>,
    counter: u64,
    stopped: bool,
    ledger: HandleLedger,
}

impl CameraStream for MockStream {
    fn id(&self) -> StreamId {
        self.id
    }

    fn facing(&self) -> FacingMode {
        self.facing
    }

    fn has_data(&self) -> bool {
        if self.stopped {
            return false;
        }
        let left = self.warmup_left.get();
        if left > 0 {
            self.warmup_left.set(left - 1);
            return false;
        }
        true
    }

    fn read(&mut self) -> Result<Frame> {
        if self.stopped {
            return Err(Error::Stopped);
        }
        if self.warmup_left.get() > 0 {
            return Err(Error::NotReady);
        }
        self.counter += 1;
        let (w, h) = (self.width, self.height);
        let shift = (self.counter % 256) as u32;
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                // Front cameras ramp along x, rear cameras along y.
                let ramp = match self.facing {
                    FacingMode::Front => (x * 255) / w.max(1),
                    FacingMode::Rear => (y * 255) / h.max(1),
                };
                data.push(ramp as u8);
                data.push(((ramp + shift) % 256) as u8);
                data.push(((x + y) % 256) as u8);
            }
        }
        Ok(Frame {
            width: w,
            height: h,
            pixel_format: PixelFormat::Rgb8,
            data,
            ts: Some(OffsetDateTime::now_utc()),
        })
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.ledger.close(self.id);
        }
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        self.stop();
    }
}
