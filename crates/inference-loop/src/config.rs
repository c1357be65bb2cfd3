use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Behaviour of a tick that finds the model still loading (or failed).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotReadyPolicy {
    /// Stop rescheduling until a newly acquired stream delivers its first frame.
    #[default]
    Stall,
    /// Skip the tick and try again on the next one.
    Poll,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Delay between a publish and the next cycle (one animation frame by default).
    pub frame_interval_ms: u64,
    pub not_ready: NotReadyPolicy,
    /// Upper bound on one inference; `None` or `0` waits forever.
    pub inference_timeout_ms: Option<u64>,
    /// Polling period while waiting for camera data.
    pub first_frame_poll_ms: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            not_ready: NotReadyPolicy::Stall,
            inference_timeout_ms: Some(5_000),
            first_frame_poll_ms: 10,
        }
    }
}

impl LoopConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn inference_timeout(&self) -> Option<Duration> {
        self.inference_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    pub fn first_frame_poll(&self) -> Duration {
        Duration::from_millis(self.first_frame_poll_ms.max(1))
    }
}
